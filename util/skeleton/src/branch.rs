use crate::curve::Curve;
use crate::girth::GirthCurve;

/// Arena index of a branch. Doubles as the branch's unique id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub usize);

/// A child branch and where it attaches on its parent, in relative position.
#[derive(Debug, Clone, Copy)]
pub struct Attachment {
	pub child: BranchId,
	pub position: f32,
}

/// One skeleton branch: a curve, a girth function, and hierarchy links.
///
/// Branches are owned by a [`crate::BranchArena`] and reference each other
/// by id only, so parent/child/follow-up links stay plain integer lookups.
#[derive(Debug, Clone)]
pub struct Branch {
	/// Hierarchy level, 0 at the trunk
	pub level: u32,
	pub parent: Option<BranchId>,
	/// Children ordered by attachment position
	pub children: Vec<Attachment>,
	/// Seamless continuation of this branch, meshed into the same skin
	pub follow_up: Option<BranchId>,
	pub curve: Curve,
	pub girth: GirthCurve,
	pub is_root: bool,
	pub is_tuned: bool,
	pub has_shaper: bool,
	pub is_broken: bool,
	/// Relative position of the break, set when `is_broken`
	pub break_position: Option<f32>,
}

impl Branch {
	pub fn new(curve: Curve, girth: GirthCurve) -> Self {
		Self {
			level: 0,
			parent: None,
			children: Vec::new(),
			follow_up: None,
			curve,
			girth,
			is_root: false,
			is_tuned: false,
			has_shaper: false,
			is_broken: false,
			break_position: None,
		}
	}

	pub fn with_level(mut self, level: u32) -> Self {
		self.level = level;
		self
	}

	pub fn with_root(mut self, is_root: bool) -> Self {
		self.is_root = is_root;
		self
	}

	pub fn with_tuned(mut self, is_tuned: bool) -> Self {
		self.is_tuned = is_tuned;
		self
	}

	pub fn with_shaper(mut self, has_shaper: bool) -> Self {
		self.has_shaper = has_shaper;
		self
	}

	pub fn with_break(mut self, position: f32) -> Self {
		self.is_broken = true;
		self.break_position = Some(position);
		self
	}

	pub fn length(&self) -> f32 {
		self.curve.length()
	}
}

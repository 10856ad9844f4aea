use crate::builders::ShapeCatalog;
use crate::range::{ShapeParams, TrunkParams, WeldParams};
use serde::{Deserialize, Serialize};

/// Hierarchy normal averaging policy: whether a child branch's base frame
/// and girth blend toward the parent surface at the attachment.
///
/// Applies when `0 < level <= level_limit` and the branch is not a
/// follow-up. Exposed as an explicit knob rather than a hidden rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NormalAveraging {
	pub enabled: bool,
	pub level_limit: u32,
}

impl Default for NormalAveraging {
	fn default() -> Self {
		Self { enabled: true, level_limit: 2 }
	}
}

/// All knobs of a synthesis pass. Serializable so tool layers can persist
/// generator presets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkinningConfig {
	/// Curve subdivision tolerance in degrees
	pub angle_tolerance: f32,
	pub min_polygon_sides: u32,
	pub max_polygon_sides: u32,
	/// Emit a closing cap ring at every skin base
	pub base_cap: bool,
	pub hard_normals: bool,
	/// Minimum spacing window of the relevant-position merge law,
	/// skin-relative
	pub min_relevant_spacing: f32,
	pub normal_averaging: NormalAveraging,
	/// Applied to root skins
	pub trunk: TrunkParams,
	/// Applied to child skins within the weld hierarchy range
	pub weld: WeldParams,
	/// Applied to branches flagged with a shaper
	pub shape: ShapeParams,
	pub shapes: ShapeCatalog,
}

impl Default for SkinningConfig {
	fn default() -> Self {
		Self {
			angle_tolerance: 8.0,
			min_polygon_sides: 3,
			max_polygon_sides: 12,
			base_cap: true,
			hard_normals: false,
			min_relevant_spacing: 0.01,
			normal_averaging: NormalAveraging::default(),
			trunk: TrunkParams::default(),
			weld: WeldParams::default(),
			shape: ShapeParams::default(),
			shapes: ShapeCatalog::default(),
		}
	}
}

impl SkinningConfig {
	pub fn with_angle_tolerance(mut self, angle_tolerance: f32) -> Self {
		self.angle_tolerance = angle_tolerance;
		self
	}

	pub fn with_polygon_sides(mut self, min: u32, max: u32) -> Self {
		self.min_polygon_sides = min;
		self.max_polygon_sides = max;
		self
	}

	pub fn with_base_cap(mut self, base_cap: bool) -> Self {
		self.base_cap = base_cap;
		self
	}

	pub fn with_hard_normals(mut self, hard_normals: bool) -> Self {
		self.hard_normals = hard_normals;
		self
	}

	pub fn with_normal_averaging(mut self, normal_averaging: NormalAveraging) -> Self {
		self.normal_averaging = normal_averaging;
		self
	}

	pub fn with_trunk(mut self, trunk: TrunkParams) -> Self {
		self.trunk = trunk;
		self
	}

	pub fn with_weld(mut self, weld: WeldParams) -> Self {
		self.weld = weld;
		self
	}

	pub fn with_shape(mut self, shape: ShapeParams) -> Self {
		self.shape = shape;
		self
	}

	pub fn with_shapes(mut self, shapes: ShapeCatalog) -> Self {
		self.shapes = shapes;
		self
	}
}

use crate::easing::Easing;
use serde::{Deserialize, Serialize};

/// Tag for the closed set of meshing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuilderKind {
	Default,
	Trunk,
	Weld,
	Shape,
}

/// Root-skin girth handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrunkParams {
	/// Girth multiplier at the very base of the trunk
	pub base_scale: f32,
	/// Skin-relative length over which the base flare eases out
	pub flare_length: f32,
}

impl Default for TrunkParams {
	fn default() -> Self {
		Self { base_scale: 1.35, flare_length: 0.15 }
	}
}

/// Child-base welding into the parent surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeldParams {
	/// Lowest hierarchy level that welds, inclusive
	pub min_level: u32,
	/// Highest hierarchy level that welds, inclusive
	pub max_level: u32,
	/// How far along the child, in world units, welding may reach
	pub distance: f32,
	/// Skin-relative cap on the weld spread
	pub upper_spread: f32,
	/// Extra flare added at the very base of the weld
	pub lower_spread: f32,
	/// Girth multiplier where the child meets the parent
	pub base_scale: f32,
}

impl Default for WeldParams {
	fn default() -> Self {
		Self {
			min_level: 1,
			max_level: 3,
			distance: 0.5,
			upper_spread: 0.2,
			lower_spread: 0.1,
			base_scale: 1.5,
		}
	}
}

/// Profile-driven ring generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeParams {
	/// Catalog key of the profile supplying ring vertices
	pub shape: String,
	/// Girth multiplier at the bottom of the range
	pub bottom_scale: f32,
	/// Girth multiplier at the top of the range
	pub top_scale: f32,
	pub ease_in: Easing,
	pub ease_out: Easing,
	/// Extra cross-sections inserted inside each cap easing window
	pub cap_subdivisions: u32,
	/// Range-relative length of the bottom cap easing window
	pub bottom_cap_offset: f32,
	/// Range-relative length of the top cap easing window
	pub top_cap_offset: f32,
}

impl Default for ShapeParams {
	fn default() -> Self {
		Self {
			shape: String::new(),
			bottom_scale: 1.0,
			top_scale: 1.0,
			ease_in: Easing::Linear,
			ease_out: Easing::Linear,
			cap_subdivisions: 0,
			bottom_cap_offset: 0.0,
			top_cap_offset: 0.0,
		}
	}
}

/// Strategy parameters; the variant is the strategy tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RangeParams {
	Default,
	Trunk(TrunkParams),
	Weld(WeldParams),
	Shape(ShapeParams),
}

impl RangeParams {
	pub fn kind(&self) -> BuilderKind {
		match self {
			RangeParams::Default => BuilderKind::Default,
			RangeParams::Trunk(_) => BuilderKind::Trunk,
			RangeParams::Weld(_) => BuilderKind::Weld,
			RangeParams::Shape(_) => BuilderKind::Shape,
		}
	}
}

/// One builder strategy assignment over a skin-relative interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSkinRange {
	pub from: f32,
	pub to: f32,
	pub params: RangeParams,
}

impl BranchSkinRange {
	pub fn new(from: f32, to: f32, params: RangeParams) -> Self {
		Self { from, to, params }
	}

	/// The whole-skin fallback range used where no range matches.
	pub fn default_range() -> Self {
		Self { from: 0.0, to: 1.0, params: RangeParams::Default }
	}

	pub fn kind(&self) -> BuilderKind {
		self.params.kind()
	}

	pub fn span(&self) -> f32 {
		(self.to - self.from).max(f32::EPSILON)
	}

	/// Position within this range mapped to `[0, 1]`.
	pub fn local(&self, position: f32) -> f32 {
		((position - self.from) / self.span()).clamp(0.0, 1.0)
	}
}

/// Result of a region dispatch.
#[derive(Debug)]
pub struct RangeMatch<'a> {
	pub index: usize,
	pub range: &'a BranchSkinRange,
	/// The queried position sits exactly on the range's upper bound. The
	/// caller switches the next query to exclusive-upper semantics so a
	/// boundary segment is never claimed by two adjacent ranges.
	pub at_upper_bound: bool,
}

const BOUNDARY_EPSILON: f32 = 1e-5;

/// Maps a skin-relative position to the active range, scanning the sorted
/// list. Returns `None` when no range matches; callers treat that as the
/// Default strategy.
pub fn range_at(
	ranges: &[BranchSkinRange],
	position: f32,
	inclusive_upper: bool,
) -> Option<RangeMatch<'_>> {
	for (index, range) in ranges.iter().enumerate() {
		if position < range.from {
			// sorted by `from`, nothing further can match
			break;
		}
		let at_upper_bound = (position - range.to).abs() <= BOUNDARY_EPSILON;
		let inside = position < range.to || (inclusive_upper && at_upper_bound);
		if inside {
			return Some(RangeMatch { index, range, at_upper_bound });
		}
	}
	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ranges() -> Vec<BranchSkinRange> {
		vec![
			BranchSkinRange::new(0.0, 0.3, RangeParams::Trunk(TrunkParams::default())),
			BranchSkinRange::new(0.3, 0.6, RangeParams::Weld(WeldParams::default())),
		]
	}

	#[test]
	fn test_match_inside_range() {
		let ranges = ranges();
		let matched = range_at(&ranges, 0.1, true).unwrap();
		assert_eq!(matched.index, 0);
		assert!(!matched.at_upper_bound);
	}

	#[test]
	fn test_gap_falls_through() {
		let ranges = ranges();
		assert!(range_at(&ranges, 0.8, true).is_none());
	}

	#[test]
	fn test_upper_bound_is_reported() {
		let ranges = ranges();
		let matched = range_at(&ranges, 0.3, true).unwrap();
		// inclusive query claims the first range's upper bound
		assert_eq!(matched.index, 0);
		assert!(matched.at_upper_bound);
	}

	#[test]
	fn test_exclusive_upper_moves_to_next_range() {
		let ranges = ranges();
		let matched = range_at(&ranges, 0.3, false).unwrap();
		assert_eq!(matched.index, 1);
	}

	#[test]
	fn test_kind_tracks_params() {
		let range = BranchSkinRange::new(0.0, 1.0, RangeParams::Shape(ShapeParams::default()));
		assert_eq!(range.kind(), BuilderKind::Shape);
	}
}

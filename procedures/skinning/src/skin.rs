use crate::range::BranchSkinRange;
use crate::relevant::RelevantPositions;
use crate::segment::Segment;
use bevy::prelude::*;
use skeleton::BranchId;

/// Skin-relative interval owned by one chained skeleton branch.
#[derive(Debug, Clone, Copy)]
pub struct BranchRange {
	pub branch: BranchId,
	pub from: f32,
	pub to: f32,
}

/// A meshable continuum spanning a branch and all of its follow-up links.
///
/// Built once per synthesis pass by the skin assembler, then consumed
/// read-only by the parallel meshing kernel.
#[derive(Debug, Clone)]
pub struct BranchSkin {
	/// Id of the first branch in the chain, doubles as the skin id
	pub id: BranchId,
	/// Hierarchy level of the chain
	pub level: u32,
	/// World-space length of the whole chain
	pub length: f32,
	/// Accumulated tree length at the base of this skin
	pub origin_length: f32,
	pub min_sides: u32,
	pub max_sides: u32,
	pub hard_normals: bool,
	pub base_cap: bool,
	/// Packed base azimuth, stamped into the phase channel
	pub phase_direction: f32,
	/// Cross-sections strictly ordered by skin position
	pub segments: Vec<Segment>,
	/// Unscaled ring vertices referenced by segments' shape offsets
	pub shape_vertices: Vec<Vec3>,
	/// Which chained branch owns which sub-interval, sorted by `from`
	pub branch_ranges: Vec<BranchRange>,
	/// Builder strategy assignments, sorted by `from`, non-overlapping
	pub builder_ranges: Vec<BranchSkinRange>,
	/// Mandatory resample positions collected during preprocessing
	pub relevant: RelevantPositions,
}

impl BranchSkin {
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		id: BranchId,
		level: u32,
		length: f32,
		origin_length: f32,
		min_sides: u32,
		max_sides: u32,
		hard_normals: bool,
		base_cap: bool,
		phase_direction: f32,
		min_relevant_spacing: f32,
	) -> Self {
		Self {
			id,
			level,
			length,
			origin_length,
			min_sides,
			max_sides,
			hard_normals,
			base_cap,
			phase_direction,
			segments: Vec::new(),
			shape_vertices: Vec::new(),
			branch_ranges: Vec::new(),
			builder_ranges: Vec::new(),
			relevant: RelevantPositions::new(min_relevant_spacing),
		}
	}

	/// Translates a skin-relative position to its owning branch and the
	/// branch-relative position.
	///
	/// A position outside every branch range is an input inconsistency; it
	/// clamps to the nearest range and logs a warning instead of aborting
	/// the pass.
	pub fn branch_at(&self, skin_position: f32) -> (BranchId, f32) {
		debug_assert!(!self.branch_ranges.is_empty());

		for range in &self.branch_ranges {
			if skin_position >= range.from && skin_position <= range.to {
				let span = (range.to - range.from).max(f32::EPSILON);
				return (range.branch, (skin_position - range.from) / span);
			}
		}

		log::warn!(
			"skin {:?}: position {} outside every branch range, clamping to nearest",
			self.id,
			skin_position,
		);

		let first = self.branch_ranges[0];
		let last = self.branch_ranges[self.branch_ranges.len() - 1];
		if skin_position < first.from {
			(first.branch, 0.0)
		} else {
			(last.branch, 1.0)
		}
	}

	/// Inverse of [`Self::branch_at`] for a branch known to be part of the
	/// chain; positions for unknown branches clamp to the skin's end.
	pub fn skin_position_of(&self, branch: BranchId, branch_position: f32) -> f32 {
		for range in &self.branch_ranges {
			if range.branch == branch {
				return range.from + branch_position.clamp(0.0, 1.0) * (range.to - range.from);
			}
		}

		log::warn!("skin {:?}: branch {:?} not part of the chain", self.id, branch);
		1.0
	}

	pub fn push_segment(&mut self, segment: Segment) {
		debug_assert!(
			self.segments
				.last()
				.map(|last| last.skin_position <= segment.skin_position)
				.unwrap_or(true),
			"segments must be pushed in increasing skin order",
		);
		self.segments.push(segment);
	}

	/// Appends one ring's unscaled vertices to the shape pool, returning
	/// the offset a segment should carry.
	pub fn push_shape_ring(&mut self, ring: &[Vec3]) -> i32 {
		let offset = self.shape_vertices.len() as i32;
		self.shape_vertices.extend_from_slice(ring);
		offset
	}

	/// Inserts a builder range keeping the list sorted by `from`.
	pub fn add_builder_range(&mut self, range: BranchSkinRange) {
		let at = self
			.builder_ranges
			.iter()
			.position(|r| r.from > range.from)
			.unwrap_or(self.builder_ranges.len());
		self.builder_ranges.insert(at, range);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::range::{RangeParams, TrunkParams};

	fn skin() -> BranchSkin {
		let mut skin =
			BranchSkin::new(BranchId(0), 0, 10.0, 0.0, 3, 12, false, true, 0.0, 0.01);
		skin.branch_ranges.push(BranchRange { branch: BranchId(0), from: 0.0, to: 0.6 });
		skin.branch_ranges.push(BranchRange { branch: BranchId(1), from: 0.6, to: 1.0 });
		skin
	}

	#[test]
	fn test_branch_at_translates() {
		let skin = skin();
		let (branch, position) = skin.branch_at(0.3);
		assert_eq!(branch, BranchId(0));
		assert!((position - 0.5).abs() < 1e-6);
	}

	#[test]
	fn test_branch_at_second_range() {
		let skin = skin();
		let (branch, position) = skin.branch_at(0.8);
		assert_eq!(branch, BranchId(1));
		assert!((position - 0.5).abs() < 1e-6);
	}

	#[test]
	fn test_branch_at_clamps_outside() {
		let skin = skin();
		let (branch, position) = skin.branch_at(1.5);
		assert_eq!(branch, BranchId(1));
		assert_eq!(position, 1.0);
	}

	#[test]
	fn test_skin_position_roundtrip() {
		let skin = skin();
		let position = skin.skin_position_of(BranchId(1), 0.5);
		assert!((position - 0.8).abs() < 1e-6);
	}

	#[test]
	fn test_builder_ranges_sorted() {
		let mut skin = skin();
		skin.add_builder_range(BranchSkinRange::new(
			0.5,
			0.7,
			RangeParams::Trunk(TrunkParams::default()),
		));
		skin.add_builder_range(BranchSkinRange::new(0.0, 0.2, RangeParams::Default));

		let froms: Vec<f32> = skin.builder_ranges.iter().map(|r| r.from).collect();
		assert_eq!(froms, vec![0.0, 0.5]);
	}
}

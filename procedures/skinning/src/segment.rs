use bevy::prelude::*;
use skeleton::BranchId;

/// Structural role of a cross-section within its skin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
	/// Closing ring at the very base of a skin, normal against the flow
	BeginCap,
	/// First cross-section of a skin
	Begin,
	Middle,
	/// Tip cross-section inside a cap easing window
	End,
	/// Terminal cross-section of a skin, normal along the flow
	EndCap,
}

impl SegmentKind {
	pub fn is_cap(self) -> bool {
		matches!(self, SegmentKind::BeginCap | SegmentKind::EndCap)
	}
}

/// One cross-section along a branch skin.
///
/// Everything the meshing kernel needs to stamp a ring is captured here at
/// assembly time, so the parallel phase never touches the skeleton.
#[derive(Debug, Clone)]
pub struct Segment {
	/// Skeleton branch this cross-section was sampled from
	pub branch: BranchId,
	/// Pass-wide running id, deterministic in traversal order
	pub structural_id: u32,
	/// Ring polygon sides, never below 3
	pub sides: u32,
	pub kind: SegmentKind,
	pub center: Vec3,
	pub forward: Vec3,
	pub up: Vec3,
	/// Ring radius after strategy scaling
	pub girth: f32,
	/// Relative position within the owning skin
	pub skin_position: f32,
	/// Relative position within the owning branch
	pub branch_position: f32,
	/// Accumulated length from the tree root to this cross-section
	pub length_from_root: f32,
	/// Packed base azimuth of the skin, consumed by wind baking
	pub phase_direction: f32,
	/// Phase sampling position, consumed by wind baking
	pub phase_position: f32,
	pub is_root: bool,
	pub is_tuned: bool,
	/// Start index into the skin's shape-vertex pool, negative for a
	/// procedural circle
	pub shape_offset: i32,
}

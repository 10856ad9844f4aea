pub mod default;
pub mod shape;
pub mod trunk;
pub mod weld;

pub use default::DefaultBuilder;
pub use shape::{ShapeBuilder, ShapeCatalog, ShapeProfile};
pub use trunk::TrunkBuilder;
pub use weld::WeldBuilder;

use crate::mesh::SubMesh;
use crate::range::{BranchSkinRange, BuilderKind};
use crate::relevant::RelevantPositions;
use crate::skin::BranchSkin;
use bevy::prelude::*;
use skeleton::Branch;
use std::collections::HashMap;

/// Context handed to a strategy before any segment commits, so it can
/// inject mandatory resample positions for its range.
pub struct PreprocessContext<'a> {
	pub skin_length: f32,
	pub skin_level: u32,
	pub relevant: &'a mut RelevantPositions,
}

/// Everything a strategy may consult when asked about one cross-section.
pub struct RingQuery<'a> {
	/// Skin-relative position of the cross-section
	pub position: f32,
	/// Skeleton girth before strategy scaling
	pub girth: f32,
	pub level: u32,
	pub min_sides: u32,
	pub max_sides: u32,
	pub skin_length: f32,
	pub catalog: &'a ShapeCatalog,
}

/// Context for the per-range postprocess hook, mirrored from the external
/// contract: `(range_index, skin, first_branch, parent_skin, parent_branch)`.
pub struct PostprocessContext<'a> {
	pub range_index: usize,
	pub range: &'a BranchSkinRange,
	pub skin: &'a BranchSkin,
	pub first_branch: &'a Branch,
	pub parent_skin: Option<&'a BranchSkin>,
	pub parent_branch: Option<&'a Branch>,
}

/// One meshing strategy. The set shipping with the engine is closed
/// (Default/Trunk/Weld/Shape); a registry entry can still be swapped out
/// by callers that need custom behavior over a range.
pub trait SkinBuilder: Send + Sync {
	fn kind(&self) -> BuilderKind;

	/// Injects relevant positions for a range before segments commit.
	fn preprocess_range(&self, _ctx: &mut PreprocessContext<'_>, _range: &BranchSkinRange) {}

	/// Ring side count for a cross-section, before global clamping.
	fn sides_at(&self, range: &BranchSkinRange, query: &RingQuery<'_>) -> u32;

	/// Girth multiplier for a cross-section.
	fn girth_scale(&self, _range: &BranchSkinRange, _query: &RingQuery<'_>) -> f32 {
		1.0
	}

	/// Explicit unscaled ring vertices, or `None` for a procedural circle.
	fn shape_ring(&self, _range: &BranchSkinRange, _query: &RingQuery<'_>) -> Option<Vec<Vec3>> {
		None
	}

	/// Optional extra sub-mesh merged by the mesh assembler after the
	/// parallel phase.
	fn postprocess(&self, _ctx: &PostprocessContext<'_>) -> Option<SubMesh> {
		None
	}
}

/// Side-count taper shared by the procedural-circle strategies: resolution
/// drops with hierarchy level and collapses at hairline girths. Never
/// returns fewer than 3 sides.
pub fn tapered_sides(query: &RingQuery<'_>) -> u32 {
	const THIN_GIRTH: f32 = 0.01;

	let floor = query.min_sides.max(3);
	let ceiling = query.max_sides.max(floor);
	if query.girth < THIN_GIRTH {
		return floor;
	}
	ceiling.saturating_sub(query.level.saturating_mul(2)).clamp(floor, ceiling)
}

/// Caller-owned strategy registry. There is no process-wide builder state;
/// whoever drives a synthesis pass constructs and owns one of these.
pub struct BuilderRegistry {
	builders: HashMap<BuilderKind, Box<dyn SkinBuilder>>,
	fallback: DefaultBuilder,
}

impl BuilderRegistry {
	/// An empty registry; every lookup falls back to the Default strategy.
	pub fn new() -> Self {
		Self { builders: HashMap::new(), fallback: DefaultBuilder }
	}

	/// The four built-in strategies.
	pub fn with_defaults() -> Self {
		let mut registry = Self::new();
		registry.register(Box::new(DefaultBuilder));
		registry.register(Box::new(TrunkBuilder));
		registry.register(Box::new(WeldBuilder));
		registry.register(Box::new(ShapeBuilder));
		registry
	}

	pub fn register(&mut self, builder: Box<dyn SkinBuilder>) {
		self.builders.insert(builder.kind(), builder);
	}

	/// Resolves a strategy; a kind with no entry silently resolves to the
	/// Default strategy.
	pub fn get(&self, kind: BuilderKind) -> &dyn SkinBuilder {
		self.builders.get(&kind).map(|builder| builder.as_ref()).unwrap_or(&self.fallback)
	}
}

impl Default for BuilderRegistry {
	fn default() -> Self {
		Self::with_defaults()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn query(catalog: &ShapeCatalog) -> RingQuery<'_> {
		RingQuery {
			position: 0.5,
			girth: 0.5,
			level: 0,
			min_sides: 4,
			max_sides: 12,
			skin_length: 10.0,
			catalog,
		}
	}

	#[test]
	fn test_tapered_sides_drops_with_level() {
		let catalog = ShapeCatalog::default();
		let mut q = query(&catalog);
		assert_eq!(tapered_sides(&q), 12);
		q.level = 2;
		assert_eq!(tapered_sides(&q), 8);
		q.level = 10;
		assert_eq!(tapered_sides(&q), 4);
	}

	#[test]
	fn test_tapered_sides_collapses_at_hairline_girth() {
		let catalog = ShapeCatalog::default();
		let mut q = query(&catalog);
		q.girth = 0.001;
		assert_eq!(tapered_sides(&q), 4);
	}

	#[test]
	fn test_tapered_sides_never_below_three() {
		let catalog = ShapeCatalog::default();
		let mut q = query(&catalog);
		q.min_sides = 0;
		q.max_sides = 0;
		assert_eq!(tapered_sides(&q), 3);
	}

	#[test]
	fn test_missing_kind_falls_back_to_default() {
		let registry = BuilderRegistry::new();
		assert_eq!(registry.get(BuilderKind::Weld).kind(), BuilderKind::Default);
	}

	#[test]
	fn test_registered_kind_resolves() {
		let registry = BuilderRegistry::with_defaults();
		assert_eq!(registry.get(BuilderKind::Weld).kind(), BuilderKind::Weld);
	}
}

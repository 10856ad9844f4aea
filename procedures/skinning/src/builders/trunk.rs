use super::{RingQuery, SkinBuilder};
use crate::easing::Easing;
use crate::range::{BranchSkinRange, BuilderKind, RangeParams, TrunkParams};

/// Root-skin strategy: keeps the full ring resolution and flares the base
/// girth, easing back to the skeleton girth over the flare length.
pub struct TrunkBuilder;

impl TrunkBuilder {
	fn params(range: &BranchSkinRange) -> Option<&TrunkParams> {
		match &range.params {
			RangeParams::Trunk(params) => Some(params),
			_ => None,
		}
	}
}

impl SkinBuilder for TrunkBuilder {
	fn kind(&self) -> BuilderKind {
		BuilderKind::Trunk
	}

	fn sides_at(&self, _range: &BranchSkinRange, query: &RingQuery<'_>) -> u32 {
		query.max_sides.max(3)
	}

	fn girth_scale(&self, range: &BranchSkinRange, query: &RingQuery<'_>) -> f32 {
		let Some(params) = Self::params(range) else {
			return 1.0;
		};
		let eased = Easing::SineOut.apply(range.local(query.position));
		params.base_scale + (1.0 - params.base_scale) * eased
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builders::ShapeCatalog;

	fn query(position: f32, catalog: &ShapeCatalog) -> RingQuery<'_> {
		RingQuery {
			position,
			girth: 0.5,
			level: 0,
			min_sides: 3,
			max_sides: 10,
			skin_length: 10.0,
			catalog,
		}
	}

	#[test]
	fn test_flare_at_base() {
		let catalog = ShapeCatalog::default();
		let range = BranchSkinRange::new(0.0, 0.2, RangeParams::Trunk(TrunkParams::default()));
		let scale = TrunkBuilder.girth_scale(&range, &query(0.0, &catalog));
		assert!((scale - 1.35).abs() < 1e-6);
	}

	#[test]
	fn test_flare_eases_out() {
		let catalog = ShapeCatalog::default();
		let range = BranchSkinRange::new(0.0, 0.2, RangeParams::Trunk(TrunkParams::default()));
		let scale = TrunkBuilder.girth_scale(&range, &query(0.2, &catalog));
		assert!((scale - 1.0).abs() < 1e-6);
	}

	#[test]
	fn test_full_resolution() {
		let catalog = ShapeCatalog::default();
		let range = BranchSkinRange::new(0.0, 0.2, RangeParams::Trunk(TrunkParams::default()));
		assert_eq!(TrunkBuilder.sides_at(&range, &query(0.1, &catalog)), 10);
	}
}

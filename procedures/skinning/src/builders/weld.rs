use super::{tapered_sides, PreprocessContext, RingQuery, SkinBuilder};
use crate::easing::Easing;
use crate::range::{BranchSkinRange, BuilderKind, RangeParams, WeldParams};
use crate::relevant::PRIORITY_WELD_BOUNDARY;

/// Flares a child skin's base girth into its parent's surface so the
/// attachment reads as one continuous body instead of a butt joint.
pub struct WeldBuilder;

impl WeldBuilder {
	fn params(range: &BranchSkinRange) -> Option<&WeldParams> {
		match &range.params {
			RangeParams::Weld(params) => Some(params),
			_ => None,
		}
	}

	fn applies(params: &WeldParams, level: u32) -> bool {
		level >= params.min_level && level <= params.max_level
	}

	/// Skin-relative boundary up to which welding spreads: the configured
	/// world-space distance translated to skin space, capped by the range
	/// and the upper spread.
	pub fn boundary(params: &WeldParams, skin_length: f32, range_to: f32) -> f32 {
		let reach = params.distance / skin_length.max(f32::EPSILON);
		reach.min(range_to).min(params.upper_spread).max(1e-3)
	}
}

impl SkinBuilder for WeldBuilder {
	fn kind(&self) -> BuilderKind {
		BuilderKind::Weld
	}

	fn preprocess_range(&self, ctx: &mut PreprocessContext<'_>, range: &BranchSkinRange) {
		let Some(params) = Self::params(range) else {
			return;
		};
		if !Self::applies(params, ctx.skin_level) {
			return;
		}
		let boundary = Self::boundary(params, ctx.skin_length, range.to);
		ctx.relevant.insert(boundary, PRIORITY_WELD_BOUNDARY);
	}

	fn sides_at(&self, _range: &BranchSkinRange, query: &RingQuery<'_>) -> u32 {
		tapered_sides(query)
	}

	fn girth_scale(&self, range: &BranchSkinRange, query: &RingQuery<'_>) -> f32 {
		let Some(params) = Self::params(range) else {
			return 1.0;
		};
		if !Self::applies(params, query.level) {
			return 1.0;
		}

		let boundary = Self::boundary(params, query.skin_length, range.to);
		if query.position >= boundary {
			return 1.0;
		}

		let eased = Easing::SineOut.apply(query.position / boundary);
		let flare = (params.base_scale - 1.0) + params.lower_spread;
		1.0 + flare * (1.0 - eased)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builders::ShapeCatalog;
	use crate::relevant::RelevantPositions;

	fn weld_range() -> BranchSkinRange {
		BranchSkinRange::new(0.0, 0.3, RangeParams::Weld(WeldParams::default()))
	}

	fn query(position: f32, level: u32, catalog: &ShapeCatalog) -> RingQuery<'_> {
		RingQuery {
			position,
			girth: 0.2,
			level,
			min_sides: 3,
			max_sides: 10,
			skin_length: 5.0,
			catalog,
		}
	}

	#[test]
	fn test_boundary_is_distance_in_skin_space() {
		let params = WeldParams::default();
		// 0.5 world units on a 5-unit skin
		let boundary = WeldBuilder::boundary(&params, 5.0, 0.3);
		assert!((boundary - 0.1).abs() < 1e-6);
	}

	#[test]
	fn test_boundary_capped_by_upper_spread() {
		let params = WeldParams { distance: 10.0, ..WeldParams::default() };
		let boundary = WeldBuilder::boundary(&params, 5.0, 0.3);
		assert!((boundary - params.upper_spread).abs() < 1e-6);
	}

	#[test]
	fn test_preprocess_marks_boundary() {
		let mut relevant = RelevantPositions::new(0.01);
		let mut ctx = PreprocessContext { skin_length: 5.0, skin_level: 1, relevant: &mut relevant };
		WeldBuilder.preprocess_range(&mut ctx, &weld_range());

		let entry = relevant.iter().next().unwrap();
		assert!((entry.position - 0.1).abs() < 1e-6);
		assert_eq!(entry.priority, PRIORITY_WELD_BOUNDARY);
	}

	#[test]
	fn test_scale_flares_at_base_and_settles_at_boundary() {
		let catalog = ShapeCatalog::default();
		let range = weld_range();
		let base = WeldBuilder.girth_scale(&range, &query(0.0, 1, &catalog));
		let at_boundary = WeldBuilder.girth_scale(&range, &query(0.1, 1, &catalog));
		assert!((base - 1.6).abs() < 1e-5);
		assert!((at_boundary - 1.0).abs() < 1e-5);
	}

	#[test]
	fn test_levels_outside_hierarchy_range_do_not_weld() {
		let catalog = ShapeCatalog::default();
		let range = weld_range();
		let scale = WeldBuilder.girth_scale(&range, &query(0.0, 7, &catalog));
		assert_eq!(scale, 1.0);
	}
}

use super::{tapered_sides, RingQuery, SkinBuilder};
use crate::range::{BranchSkinRange, BuilderKind};

/// Plain circular rings with the shared side-count taper. Also serves as
/// the fallback wherever no range matches or a registry entry is missing.
pub struct DefaultBuilder;

impl SkinBuilder for DefaultBuilder {
	fn kind(&self) -> BuilderKind {
		BuilderKind::Default
	}

	fn sides_at(&self, _range: &BranchSkinRange, query: &RingQuery<'_>) -> u32 {
		tapered_sides(query)
	}
}

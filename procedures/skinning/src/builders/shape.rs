use super::{tapered_sides, PreprocessContext, RingQuery, SkinBuilder};
use crate::range::{BranchSkinRange, BuilderKind, RangeParams, ShapeParams};
use crate::relevant::PRIORITY_SHAPE_CAP;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::TAU;

/// A caller-supplied cross-section outline in radial order,
/// counter-clockwise, roughly unit-sized. Scaled by girth at stamping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeProfile {
	points: Vec<[f32; 2]>,
}

impl ShapeProfile {
	pub fn new(points: Vec<[f32; 2]>) -> Self {
		Self { points }
	}

	/// Axis-aligned unit square.
	pub fn square() -> Self {
		Self::new(vec![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0]])
	}

	/// A non-convex star, alternating unit and `inner` radius.
	pub fn star(spikes: usize, inner: f32) -> Self {
		let count = spikes.max(2) * 2;
		let points = (0..count)
			.map(|i| {
				let radius = if i % 2 == 0 { 1.0 } else { inner };
				let angle = TAU * i as f32 / count as f32;
				[radius * angle.cos(), radius * angle.sin()]
			})
			.collect();
		Self::new(points)
	}

	pub fn sides(&self) -> u32 {
		self.points.len() as u32
	}

	/// Ring vertices in segment-local space, one per side.
	pub fn ring(&self) -> Vec<Vec3> {
		self.points.iter().map(|p| Vec3::new(p[0], p[1], 0.0)).collect()
	}
}

/// Named profiles available to Shape ranges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShapeCatalog {
	profiles: HashMap<String, ShapeProfile>,
}

impl ShapeCatalog {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_profile(mut self, name: impl Into<String>, profile: ShapeProfile) -> Self {
		self.insert(name, profile);
		self
	}

	pub fn insert(&mut self, name: impl Into<String>, profile: ShapeProfile) {
		self.profiles.insert(name.into(), profile);
	}

	pub fn get(&self, name: &str) -> Option<&ShapeProfile> {
		self.profiles.get(name)
	}
}

/// Rings read from a catalog profile instead of a generated circle, with
/// bottom/top scaling and eased cap windows.
pub struct ShapeBuilder;

impl ShapeBuilder {
	fn params(range: &BranchSkinRange) -> Option<&ShapeParams> {
		match &range.params {
			RangeParams::Shape(params) => Some(params),
			_ => None,
		}
	}

	/// Girth multiplier across the range: bottom/top interpolation with
	/// the eased cap windows collapsing toward the ends.
	fn cap_scale(params: &ShapeParams, t: f32) -> f32 {
		let mut scale = params.bottom_scale + (params.top_scale - params.bottom_scale) * t;
		if params.bottom_cap_offset > 0.0 && t < params.bottom_cap_offset {
			scale *= params.ease_in.apply(t / params.bottom_cap_offset);
		}
		if params.top_cap_offset > 0.0 && t > 1.0 - params.top_cap_offset {
			scale *= params.ease_out.apply((1.0 - t) / params.top_cap_offset);
		}
		scale
	}
}

impl SkinBuilder for ShapeBuilder {
	fn kind(&self) -> BuilderKind {
		BuilderKind::Shape
	}

	fn preprocess_range(&self, ctx: &mut PreprocessContext<'_>, range: &BranchSkinRange) {
		let Some(params) = Self::params(range) else {
			return;
		};
		if params.cap_subdivisions == 0 {
			return;
		}

		let span = range.span();
		let steps = params.cap_subdivisions + 1;
		for i in 1..=params.cap_subdivisions {
			let t = i as f32 / steps as f32;
			if params.bottom_cap_offset > 0.0 {
				let position = range.from + span * params.bottom_cap_offset * t;
				ctx.relevant.insert(position, PRIORITY_SHAPE_CAP);
			}
			if params.top_cap_offset > 0.0 {
				let position = range.to - span * params.top_cap_offset * t;
				ctx.relevant.insert(position, PRIORITY_SHAPE_CAP);
			}
		}
	}

	fn sides_at(&self, range: &BranchSkinRange, query: &RingQuery<'_>) -> u32 {
		match Self::params(range).and_then(|params| query.catalog.get(&params.shape)) {
			Some(profile) => profile.sides(),
			None => {
				log::warn!("shape range without a catalog profile, using circular rings");
				tapered_sides(query)
			}
		}
	}

	fn girth_scale(&self, range: &BranchSkinRange, query: &RingQuery<'_>) -> f32 {
		match Self::params(range) {
			Some(params) => Self::cap_scale(params, range.local(query.position)),
			None => 1.0,
		}
	}

	fn shape_ring(&self, range: &BranchSkinRange, query: &RingQuery<'_>) -> Option<Vec<Vec3>> {
		let params = Self::params(range)?;
		query.catalog.get(&params.shape).map(ShapeProfile::ring)
	}
}

use bevy::prelude::*;

/// One sampled frame along a branch curve.
#[derive(Debug, Clone, Copy)]
pub struct CurveFrame {
	/// World-space position on the curve
	pub position: Vec3,
	/// Normalized travel direction at this point
	pub forward: Vec3,
	/// Normalized up/bitangent, perpendicular to forward
	pub up: Vec3,
}

/// An ordered polyline of control points with arc-length parameterization.
///
/// Positions are addressed by relative position in `[0, 1]`. Directions at
/// control points average the adjacent segment directions, so frames vary
/// continuously along the curve without any stored orientation data.
#[derive(Debug, Clone)]
pub struct Curve {
	points: Vec<Vec3>,
	/// Cumulative arc length up to each control point, `lengths[0] == 0`
	lengths: Vec<f32>,
	/// Per-control-point direction, averaged over adjacent segments
	directions: Vec<Vec3>,
}

impl Curve {
	pub fn from_points(points: Vec<Vec3>) -> Self {
		let mut lengths = Vec::with_capacity(points.len());
		let mut accumulated = 0.0;
		lengths.push(0.0);
		for i in 1..points.len() {
			accumulated += (points[i] - points[i - 1]).length();
			lengths.push(accumulated);
		}

		let directions = Self::point_directions(&points);

		Self { points, lengths, directions }
	}

	/// A straight two-point curve, useful as a fixture and for degenerate input.
	pub fn line(from: Vec3, to: Vec3) -> Self {
		Self::from_points(vec![from, to])
	}

	fn point_directions(points: &[Vec3]) -> Vec<Vec3> {
		let segment_dir = |i: usize| -> Vec3 {
			let ray = points[i + 1] - points[i];
			if ray.length() < f32::EPSILON {
				Vec3::Y
			} else {
				ray.normalize()
			}
		};

		let mut directions = Vec::with_capacity(points.len());
		for i in 0..points.len() {
			let dir = if points.len() < 2 {
				Vec3::Y
			} else if i == 0 {
				segment_dir(0)
			} else if i == points.len() - 1 {
				segment_dir(i - 1)
			} else {
				(segment_dir(i - 1) + segment_dir(i)).normalize()
			};
			directions.push(dir);
		}
		directions
	}

	/// Builds an orthonormal up vector perpendicular to a forward direction.
	fn reference_up(forward: Vec3) -> Vec3 {
		let reference = if forward.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
		let right = forward.cross(reference).normalize();
		right.cross(forward).normalize()
	}

	pub fn point_count(&self) -> usize {
		self.points.len()
	}

	pub fn points(&self) -> &[Vec3] {
		&self.points
	}

	/// Total arc length of the curve.
	pub fn length(&self) -> f32 {
		self.lengths.last().copied().unwrap_or(0.0)
	}

	/// Relative position of the i-th control point.
	pub fn point_position(&self, i: usize) -> f32 {
		let total = self.length();
		if total < f32::EPSILON {
			0.0
		} else {
			self.lengths[i] / total
		}
	}

	pub fn position_at(&self, t: f32) -> Vec3 {
		self.frame_at(t).position
	}

	/// Samples a frame at relative position `t` in `[0, 1]`.
	pub fn frame_at(&self, t: f32) -> CurveFrame {
		if self.points.len() < 2 {
			let position = self.points.first().copied().unwrap_or(Vec3::ZERO);
			return CurveFrame { position, forward: Vec3::Y, up: Self::reference_up(Vec3::Y) };
		}

		let target = t.clamp(0.0, 1.0) * self.length();

		// Containing segment: lengths is sorted, scan is short for branch curves
		let mut i = 0;
		while i + 2 < self.lengths.len() && self.lengths[i + 1] < target {
			i += 1;
		}

		let span = self.lengths[i + 1] - self.lengths[i];
		let local = if span < f32::EPSILON { 0.0 } else { (target - self.lengths[i]) / span };

		let position = self.points[i].lerp(self.points[i + 1], local);
		let forward = self.directions[i].lerp(self.directions[i + 1], local).normalize();

		CurveFrame { position, forward, up: Self::reference_up(forward) }
	}

	/// Relative positions produced by angle-tolerance-driven subdivision.
	///
	/// Always contains 0 and 1. An interior control point is emitted whenever
	/// the bend accumulated since the last emitted sample exceeds
	/// `angle_tolerance` (degrees), so straight runs collapse to their
	/// endpoints while tight arcs keep their control points.
	pub fn adaptive_positions(&self, angle_tolerance: f32) -> Vec<f32> {
		let mut positions = vec![0.0];

		if self.points.len() > 2 {
			let tolerance = angle_tolerance.max(0.0).to_radians();
			let mut last_dir = self.directions[0];
			for i in 1..self.points.len() - 1 {
				let bend = last_dir.angle_between(self.directions[i]);
				if bend > tolerance {
					positions.push(self.point_position(i));
					last_dir = self.directions[i];
				}
			}
		}

		positions.push(1.0);
		positions
	}
}

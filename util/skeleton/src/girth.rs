use serde::{Deserialize, Serialize};

/// Floor applied to every girth sample so downstream ring stamping never
/// sees a zero or negative radius.
pub const MIN_GIRTH: f32 = 1e-4;

/// Piecewise-linear girth over relative branch position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GirthCurve {
	/// `(position, girth)` keys sorted by position
	keys: Vec<(f32, f32)>,
}

impl GirthCurve {
	pub fn constant(girth: f32) -> Self {
		Self { keys: vec![(0.0, girth)] }
	}

	/// Linear taper from a base girth at position 0 to a top girth at 1.
	pub fn tapered(base: f32, top: f32) -> Self {
		Self { keys: vec![(0.0, base), (1.0, top)] }
	}

	pub fn from_keys(mut keys: Vec<(f32, f32)>) -> Self {
		keys.sort_by(|a, b| a.0.total_cmp(&b.0));
		Self { keys }
	}

	/// Samples the girth at relative position `t`, clamped to [`MIN_GIRTH`].
	pub fn at(&self, t: f32) -> f32 {
		let girth = match self.keys.len() {
			0 => MIN_GIRTH,
			1 => self.keys[0].1,
			_ => {
				let t = t.clamp(0.0, 1.0);
				if t <= self.keys[0].0 {
					self.keys[0].1
				} else if t >= self.keys[self.keys.len() - 1].0 {
					self.keys[self.keys.len() - 1].1
				} else {
					let mut i = 0;
					while self.keys[i + 1].0 < t {
						i += 1;
					}
					let (p0, g0) = self.keys[i];
					let (p1, g1) = self.keys[i + 1];
					let span = p1 - p0;
					let local = if span < f32::EPSILON { 0.0 } else { (t - p0) / span };
					g0 * (1.0 - local) + g1 * local
				}
			}
		};
		girth.max(MIN_GIRTH)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_constant() {
		let girth = GirthCurve::constant(0.5);
		assert_eq!(girth.at(0.0), 0.5);
		assert_eq!(girth.at(1.0), 0.5);
	}

	#[test]
	fn test_tapered_interpolates() {
		let girth = GirthCurve::tapered(1.0, 0.5);
		assert!((girth.at(0.5) - 0.75).abs() < 1e-6);
	}

	#[test]
	fn test_degenerate_girth_is_floored() {
		let girth = GirthCurve::constant(-1.0);
		assert_eq!(girth.at(0.5), MIN_GIRTH);
	}

	#[test]
	fn test_keys_sorted_on_build() {
		let girth = GirthCurve::from_keys(vec![(1.0, 0.1), (0.0, 1.0)]);
		assert!((girth.at(0.0) - 1.0).abs() < 1e-6);
		assert!((girth.at(1.0) - 0.1).abs() < 1e-6);
	}
}

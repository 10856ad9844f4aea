use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Easing functions applied to shape cap scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
	Linear,
	SineIn,
	SineOut,
	CubicIn,
	CubicOut,
	QuinticIn,
	QuinticOut,
	CircularIn,
	CircularOut,
}

impl Easing {
	/// Maps `t` in `[0, 1]` onto the eased curve, `0 → 0` and `1 → 1`.
	pub fn apply(self, t: f32) -> f32 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Easing::Linear => t,
			Easing::SineIn => 1.0 - ((t * PI) / 2.0).cos(),
			Easing::SineOut => ((t * PI) / 2.0).sin(),
			Easing::CubicIn => t * t * t,
			Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
			Easing::QuinticIn => t.powi(5),
			Easing::QuinticOut => 1.0 - (1.0 - t).powi(5),
			Easing::CircularIn => 1.0 - (1.0 - t * t).sqrt(),
			Easing::CircularOut => (1.0 - (t - 1.0) * (t - 1.0)).sqrt(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ALL: [Easing; 9] = [
		Easing::Linear,
		Easing::SineIn,
		Easing::SineOut,
		Easing::CubicIn,
		Easing::CubicOut,
		Easing::QuinticIn,
		Easing::QuinticOut,
		Easing::CircularIn,
		Easing::CircularOut,
	];

	#[test]
	fn test_endpoints_are_fixed() {
		for easing in ALL {
			assert!(easing.apply(0.0).abs() < 1e-6, "{:?} at 0", easing);
			assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{:?} at 1", easing);
		}
	}

	#[test]
	fn test_monotonic_midpoint() {
		for easing in ALL {
			let mid = easing.apply(0.5);
			assert!(mid > 0.0 && mid < 1.0, "{:?} at 0.5 -> {}", easing, mid);
		}
	}

	#[test]
	fn test_in_out_symmetry() {
		// ease-in at t mirrors ease-out at 1-t
		let t = 0.25;
		let sine_in = Easing::SineIn.apply(t);
		let sine_out = Easing::SineOut.apply(1.0 - t);
		assert!((sine_in - (1.0 - sine_out)).abs() < 1e-6);
	}

	#[test]
	fn test_input_is_clamped() {
		assert_eq!(Easing::CircularIn.apply(2.0), 1.0);
		assert_eq!(Easing::CircularIn.apply(-1.0), 0.0);
	}
}

use std::f64::consts::PI;

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Overshoots past 1 before settling; `s` controls the overshoot.
pub fn ease_out_back(t: f64, s: f64) -> f64 {
	let u = t - 1.0;
	1.0 + (s + 1.0) * u.powi(3) + s * u.powi(2)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Easing {
	OutCubic,
	OutBack(f64),
	/// Rises to the target and returns to the start.
	Pulse,
}

impl Easing {
	pub fn sample(self, t: f64) -> f64 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Easing::OutCubic => ease_out_cubic(t),
			Easing::OutBack(s) => ease_out_back(t, s),
			Easing::Pulse => (PI * t).sin(),
		}
	}
}

/// Which animated attribute a tween drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TweenTarget {
	NodeReveal(usize),
	NodeFade(usize),
	EdgeDraw(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
	pub target: TweenTarget,
	pub start: f64,
	pub duration: f64,
	pub from: f64,
	pub to: f64,
	pub easing: Easing,
}

impl Tween {
	pub fn progress(&self, now: f64) -> f64 {
		if self.duration <= 0.0 {
			return 1.0;
		}
		((now - self.start) / self.duration).clamp(0.0, 1.0)
	}

	pub fn value_at(&self, now: f64) -> f64 {
		let p = self.progress(now);
		if p >= 1.0 && self.easing == Easing::Pulse {
			return self.from;
		}
		self.from + (self.to - self.from) * self.easing.sample(p)
	}

	pub fn is_done(&self, now: f64) -> bool {
		self.progress(now) >= 1.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_out_back_overshoots_and_lands() {
		let peak = (1..100)
			.map(|i| Easing::OutBack(1.70158).sample(i as f64 / 100.0))
			.fold(0.0, f64::max);
		assert!(peak > 1.0);
		assert!((Easing::OutBack(1.70158).sample(1.0) - 1.0).abs() < 1e-12);
		assert!(Easing::OutBack(1.70158).sample(0.0).abs() < 1e-12);
	}

	#[test]
	fn test_pulse_returns_to_start() {
		let tween = Tween {
			target: TweenTarget::NodeReveal(0),
			start: 100.0,
			duration: 400.0,
			from: 1.0,
			to: 1.4,
			easing: Easing::Pulse,
		};
		assert_eq!(tween.value_at(100.0), 1.0);
		assert!((tween.value_at(300.0) - 1.4).abs() < 1e-9);
		assert_eq!(tween.value_at(500.0), 1.0);
		assert!(tween.is_done(500.0));
	}

	#[test]
	fn test_zero_duration_completes_immediately() {
		let tween = Tween {
			target: TweenTarget::EdgeDraw(0),
			start: 0.0,
			duration: 0.0,
			from: 0.0,
			to: 1.0,
			easing: Easing::OutCubic,
		};
		assert_eq!(tween.value_at(0.0), 1.0);
	}
}

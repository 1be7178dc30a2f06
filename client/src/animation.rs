use zui_shared::Coordinate;

/// Animated move of the view center, used by popup auto-pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAnimation {
    pub from: Coordinate,
    pub to: Coordinate,
    pub start_time: f64,
    pub duration: f64, // milliseconds
}

impl PanAnimation {
    pub fn new(from: Coordinate, to: Coordinate, start_time: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            start_time,
            duration,
        }
    }

    /// Center at time `now`, or `None` once the animation has finished.
    /// The caller should snap to `to` when this returns `None`.
    pub fn center_at(&self, now: f64) -> Option<Coordinate> {
        let elapsed = now - self.start_time;
        if self.duration <= 0.0 || elapsed >= self.duration {
            return None;
        }
        let t = ease_in_out(elapsed.max(0.0) / self.duration);
        Some(self.from.lerp(self.to, t))
    }
}

/// Slow start and slow finish, symmetric around `t = 0.5`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_is_anchored_and_symmetric() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert_eq!(ease_in_out(0.5), 0.5);
        assert!((ease_in_out(0.25) + ease_in_out(0.75) - 1.0).abs() < 1e-12);
        assert!(ease_in_out(0.1) < 0.1);
    }

    #[test]
    fn animation_runs_for_its_duration() {
        let anim = PanAnimation::new(
            Coordinate::new(0.0, 0.0),
            Coordinate::new(100.0, -50.0),
            1_000.0,
            250.0,
        );
        assert_eq!(anim.center_at(1_000.0), Some(Coordinate::new(0.0, 0.0)));
        assert_eq!(anim.center_at(1_125.0), Some(Coordinate::new(50.0, -25.0)));
        assert_eq!(anim.center_at(1_250.0), None);
    }

    #[test]
    fn zero_duration_finishes_immediately() {
        let anim = PanAnimation::new(Coordinate::new(1.0, 1.0), Coordinate::new(2.0, 2.0), 0.0, 0.0);
        assert_eq!(anim.center_at(0.0), None);
    }
}

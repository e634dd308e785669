//! Eased camera moves.

use glam::Vec3;

use crate::params::CameraMove;

/// Quadratic-named ease-in-out whose curve is cubic:
/// 4t^3 for the first half, mirrored for the second
pub fn power2_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Position interpolation over a fixed duration
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: Vec3,
    to: Vec3,
    duration_s: f32,
    elapsed_s: f32,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, duration_s: f32) -> Self {
        Self {
            from,
            to,
            duration_s: duration_s.max(0.0),
            elapsed_s: 0.0,
        }
    }

    pub fn progress(&self) -> f32 {
        if self.duration_s <= 0.0 {
            1.0
        } else {
            (self.elapsed_s / self.duration_s).min(1.0)
        }
    }

    pub fn value(&self) -> Vec3 {
        self.from.lerp(self.to, power2_in_out(self.progress()))
    }

    /// Advance by `dt` seconds and return the new value
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.elapsed_s += dt.max(0.0);
        self.value()
    }

    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }
}

/// At most one camera move at a time; a new move replaces the running one
/// and starts from wherever the camera is
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    active: Option<Tween>,
}

impl Timeline {
    pub fn play(&mut self, from: Vec3, movement: &CameraMove) {
        self.active = Some(Tween::new(
            from,
            Vec3::from_array(movement.to),
            movement.duration_s,
        ));
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Write the eased position for this frame. Returns whether a move ran.
    pub fn update(&mut self, dt: f32, position: &mut Vec3) -> bool {
        let Some(tween) = self.active.as_mut() else {
            return false;
        };
        *position = tween.advance(dt);
        if tween.is_finished() {
            self.active = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints_and_midpoint() {
        assert_eq!(power2_in_out(0.0), 0.0);
        assert_eq!(power2_in_out(1.0), 1.0);
        assert!((power2_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((power2_in_out(0.25) - 0.0625).abs() < 1e-6);
        assert!((power2_in_out(0.75) - 0.9375).abs() < 1e-6);
    }

    #[test]
    fn test_easing_is_monotonic() {
        let mut last = 0.0;
        for i in 1..=100 {
            let v = power2_in_out(i as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
    }

    #[test]
    fn test_timeline_reaches_destination_and_stops() {
        let mut timeline = Timeline::default();
        let movement = CameraMove {
            to: [10.0, 5.0, 10.0],
            duration_s: 1.5,
        };
        let mut position = Vec3::new(1.0, 2.0, 6.0);
        timeline.play(position, &movement);

        assert!(timeline.update(0.75, &mut position));
        assert!((position - Vec3::new(5.5, 3.5, 8.0)).length() < 1e-4); // Halfway

        timeline.update(1.0, &mut position);
        assert_eq!(position, Vec3::new(10.0, 5.0, 10.0));
        assert!(!timeline.is_active());
        assert!(!timeline.update(0.1, &mut position));
    }

    #[test]
    fn test_zero_duration_snaps() {
        let mut tween = Tween::new(Vec3::ZERO, Vec3::ONE, 0.0);
        assert_eq!(tween.advance(0.0), Vec3::ONE);
        assert!(tween.is_finished());
    }
}

//! Instanced bar ring: one bar per frequency bin.

use glam::{Mat4, Quat, Vec3};
use std::f32::consts::TAU;

use super::color::hsl_to_rgb;
use super::FrequencySource;
use crate::params::TrackLayout;

/// Bar ring for one track. Instance transforms are rewritten in place on
/// every playing frame.
#[derive(Debug, Clone)]
pub struct BarTrack {
    index: usize,
    layout: TrackLayout,
    bins: Vec<u8>,
    average: f32,
    instances: Vec<Mat4>,
    color: Vec3,
}

impl BarTrack {
    pub fn new(index: usize, bin_count: usize, layout: &TrackLayout) -> Self {
        let mut track = Self {
            index,
            layout: layout.clone(),
            bins: vec![0; bin_count],
            average: 0.0,
            instances: vec![Mat4::IDENTITY; bin_count],
            color: Vec3::ONE,
        };
        track.apply();
        track
    }

    /// Poll the source and rebuild the ring. Paused tracks keep their last
    /// frame and are not polled. Returns whether new data was taken.
    pub fn update(&mut self, source: &dyn FrequencySource, playing: bool) -> bool {
        if !playing {
            return false;
        }
        self.average = source.poll_frequencies(&mut self.bins);
        self.apply();
        true
    }

    fn apply(&mut self) {
        let count = self.bins.len();
        let radius = self.layout.radius;

        for (i, (bin, instance)) in self.bins.iter().zip(self.instances.iter_mut()).enumerate() {
            let angle = TAU * i as f32 / count as f32;
            let position = Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin());
            *instance = Mat4::from_scale_rotation_translation(
                Vec3::new(1.0, self.layout.bin_height(*bin), 1.0),
                face_origin(position),
                position,
            );
        }

        self.color = hsl_to_rgb(
            self.layout.hue_for(self.average),
            self.layout.saturation,
            self.layout.lightness,
        );
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Per-bar transforms in ring space
    pub fn instances(&self) -> &[Mat4] {
        &self.instances
    }

    /// Ring space to world: per-track rotation and scale
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.layout.rotation_for(self.index))
            * Mat4::from_scale(Vec3::splat(self.layout.scale_for(self.index)))
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn average(&self) -> f32 {
        self.average
    }
}

/// Rotation about Y that points local +Z from `position` at the origin
fn face_origin(position: Vec3) -> Quat {
    let dir = -position;
    if dir.length_squared() < f32::EPSILON {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_y(dir.x.atan2(dir.z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Fixed {
        bins: Vec<u8>,
        polls: Cell<usize>,
    }

    impl FrequencySource for Fixed {
        fn bin_count(&self) -> usize {
            self.bins.len()
        }

        fn poll_frequencies(&self, bins: &mut [u8]) -> f32 {
            self.polls.set(self.polls.get() + 1);
            bins.copy_from_slice(&self.bins);
            self.bins.iter().map(|&b| b as f32).sum::<f32>() / self.bins.len() as f32
        }
    }

    fn source(value: u8) -> Fixed {
        Fixed {
            bins: vec![value; 32],
            polls: Cell::new(0),
        }
    }

    #[test]
    fn test_bars_lie_on_circle_and_face_centre() {
        let layout = TrackLayout::default();
        let mut track = BarTrack::new(0, 32, &layout);
        assert!(track.update(&source(250), true));

        for m in track.instances() {
            let position = m.w_axis.truncate();
            assert!((position.length() - layout.radius).abs() < 1e-6);
            assert!(position.y.abs() < 1e-6);

            // Local +Z points at the centre
            let forward = m.transform_vector3(Vec3::Z).normalize();
            assert!(forward.dot(-position.normalize()) > 0.999);

            // Height 250 / 2500 * 10 = 1
            let up = m.transform_vector3(Vec3::Y);
            assert!((up.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_paused_track_is_frozen() {
        let mut track = BarTrack::new(1, 32, &TrackLayout::default());
        let loud = source(200);
        track.update(&loud, true);
        let frozen = track.instances().to_vec();

        let quiet = source(0);
        assert!(!track.update(&quiet, false));
        assert_eq!(quiet.polls.get(), 0);
        assert_eq!(track.instances(), frozen.as_slice());
        assert_eq!(track.average(), 200.0);
    }

    #[test]
    fn test_model_matrix_scales_per_index() {
        let track = BarTrack::new(2, 32, &TrackLayout::default());
        let scaled = track.model_matrix().transform_vector3(Vec3::Y);
        assert!((scaled.length() - 41.0).abs() < 1e-4);
    }

    #[test]
    fn test_color_follows_average() {
        let mut track = BarTrack::new(0, 32, &TrackLayout::default());
        track.update(&source(0), true);
        let silent = track.color();
        track.update(&source(125), true);
        assert_ne!(silent, track.color());
    }
}

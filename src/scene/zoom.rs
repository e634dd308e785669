//! Zoom reactor: narrows the field of view as the selected track gets louder.

use super::cache::FrequencyCache;
use crate::params::CameraRig;

#[derive(Debug, Clone)]
pub struct ZoomReactor {
    base_fov: f32,
    divisor: f32,
}

impl ZoomReactor {
    pub fn new(rig: &CameraRig) -> Self {
        Self {
            base_fov: rig.fov_degrees,
            divisor: rig.zoom_divisor,
        }
    }

    /// Field of view for a given average
    pub fn fov_for(&self, average: f32) -> f32 {
        self.base_fov - average / self.divisor
    }

    /// Set `fov` from the selected track's cached average. Without a
    /// selection, or before that track has produced data, `fov` is left
    /// as it is. Returns whether it was written.
    pub fn apply(&self, selected: Option<usize>, cache: &FrequencyCache, fov: &mut f32) -> bool {
        let Some(sample) = selected.and_then(|i| cache.get(i)) else {
            return false;
        };
        *fov = self.fov_for(sample.average);
        true
    }
}

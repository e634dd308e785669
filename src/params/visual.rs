//! Track visual layout parameters.

use serde::Deserialize;

/// Circular layout shared by the bar and line visuals.
///
/// Heights are `bin / height_divisor * height_gain`, so a full-scale byte
/// (255) reaches roughly one world unit before the per-track scale.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrackLayout {
    /// Base circle radius (world units, before per-track scale)
    pub radius: f32,

    /// Divisor applied to raw bin bytes
    pub height_divisor: f32,

    /// Multiplier applied after the divisor
    pub height_gain: f32,

    /// Scale factor of track 0
    pub scale_base: f32,

    /// Added scale per track index
    pub scale_step: f32,

    /// Y rotation per track index (radians)
    pub rotation_step_rad: f32,

    /// Average is divided by this to get hue (wrapped into [0, 1))
    pub hue_divisor: f32,

    /// HSL saturation of track color
    pub saturation: f32,

    /// HSL lightness of track color
    pub lightness: f32,

    /// Bar box size (world units): width, height, depth
    pub bar_size: [f32; 3],

    /// Spline samples per raw point for line ribbons
    pub line_samples_per_segment: usize,

    /// Vertical offset of line ribbons
    pub line_offset_y: f32,

    /// Height of the flattened shadow ribbon (local units)
    pub shadow_y: f32,

    /// Emit the shadow ribbon
    pub shadow: bool,
}

impl Default for TrackLayout {
    fn default() -> Self {
        Self {
            radius: 0.1,
            height_divisor: 2500.0,
            height_gain: 10.0,
            scale_base: 21.0,
            scale_step: 10.0,
            rotation_step_rad: 10.0,
            hue_divisor: 500.0,
            saturation: 0.75,
            lightness: 0.75,
            bar_size: [0.01, 0.05, 0.01],
            line_samples_per_segment: 8,
            line_offset_y: 0.1,
            shadow_y: -0.1,
            shadow: true,
        }
    }
}

impl TrackLayout {
    /// Scale factor for the track at `index`
    pub fn scale_for(&self, index: usize) -> f32 {
        self.scale_base + self.scale_step * index as f32
    }

    /// Y rotation for the track at `index`
    pub fn rotation_for(&self, index: usize) -> f32 {
        self.rotation_step_rad * index as f32
    }

    /// Height of a raw bin value
    pub fn bin_height(&self, bin: u8) -> f32 {
        bin as f32 / self.height_divisor * self.height_gain
    }

    /// Hue for a rolling average, wrapped into [0, 1)
    pub fn hue_for(&self, average: f32) -> f32 {
        (average / self.hue_divisor).rem_euclid(1.0)
    }
}

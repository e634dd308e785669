//! Rendering and post-processing configuration.

use serde::Deserialize;

/// Rendering configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Background color (linear RGB)
    pub clear_color: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            clear_color: [0.0, 0.0, 0.0],
        }
    }
}

impl RenderConfig {
    pub fn aspect_ratio(&self) -> f32 {
        self.window_width as f32 / self.window_height.max(1) as f32
    }
}

/// Depth-of-field and bloom parameters.
///
/// The focus distance follows `focus_target` (autofocus) with exponential
/// smoothing over `smooth_time_s`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostFx {
    /// Point kept in focus (world units)
    pub focus_target: [f32; 3],

    /// Autofocus smoothing time (seconds, 0 = snap)
    pub smooth_time_s: f32,

    /// Distance from the focus plane that stays sharp (world units)
    pub focus_range: f32,

    /// Maximum blur radius (pixels)
    pub bokeh_scale: f32,

    /// Luminance above which pixels bloom
    pub bloom_threshold: f32,

    /// Bloom contribution
    pub bloom_intensity: f32,

    /// Bloom sample radius (pixels)
    pub bloom_radius: f32,
}

impl Default for PostFx {
    fn default() -> Self {
        Self {
            focus_target: [-1.0, 1.0, 0.6],
            smooth_time_s: 0.5,
            focus_range: 0.95,
            bokeh_scale: 4.0,
            bloom_threshold: 0.6,
            bloom_intensity: 0.8,
            bloom_radius: 6.0,
        }
    }
}

impl PostFx {
    /// Clamp tweakable values into their supported ranges
    pub fn clamp(&mut self) {
        self.focus_range = self.focus_range.clamp(0.0, 1.0);
        self.bokeh_scale = self.bokeh_scale.clamp(0.0, 50.0);
        self.bloom_threshold = self.bloom_threshold.clamp(0.0, 4.0);
        self.bloom_intensity = self.bloom_intensity.clamp(0.0, 4.0);
        self.smooth_time_s = self.smooth_time_s.clamp(0.0, 1.0);
    }
}

//! Audio analysis and playback configuration.

use serde::Deserialize;

/// Frequency analyser configuration.
///
/// Mirrors the analyser semantics the visuals were tuned against: a short
/// Blackman-windowed FFT, temporal smoothing, and a decibel window mapped
/// onto byte values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// FFT window size in samples (power of 2, >= 32).
    /// 64 samples = 32 frequency bins
    pub fft_size: usize,

    /// Temporal smoothing between successive polls (0 = none, <1)
    pub smoothing: f32,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 64,
            smoothing: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins produced per poll
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<(), String> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(format!(
                "FFT size must be a power of 2 and at least 32, got {}",
                self.fft_size
            ));
        }
        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(format!(
                "min_decibels ({}) must be below max_decibels ({})",
                self.min_decibels, self.max_decibels
            ));
        }
        Ok(())
    }
}

/// Playback defaults for the control panel
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackParams {
    /// Initial master volume (0..=1); also the unmute fallback
    pub default_volume: f32,

    /// Volume change per up/down step
    pub volume_step: f32,

    /// Start in playlist mode (tracks advance instead of looping)
    pub playlist: bool,
}

impl Default for PlaybackParams {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            volume_step: 0.1,
            playlist: false,
        }
    }
}

/// Bundled asset layout, relative to `root`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    /// Asset root directory
    pub root: String,

    /// Default demo tracks loaded on startup
    pub default_tracks: Vec<String>,

    /// Baked texture for the default model skin
    pub baked_texture: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            default_tracks: vec![
                "audio/synth.mp3".to_string(),
                "audio/snare.mp3".to_string(),
                "audio/drums.mp3".to_string(),
            ],
            baked_texture: "model/baked_texture.png".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analyser_has_32_bins() {
        let config = AnalyserConfig::default();
        assert_eq!(config.bin_count(), 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_analyser_validation() {
        let mut config = AnalyserConfig::default();
        config.fft_size = 48;
        assert!(config.validate().is_err());

        let mut config = AnalyserConfig::default();
        config.smoothing = 1.0;
        assert!(config.validate().is_err());

        let mut config = AnalyserConfig::default();
        config.min_decibels = -20.0;
        assert!(config.validate().is_err());
    }
}

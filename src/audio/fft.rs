//! Frequency analysis of the most recent time-domain samples.
//!
//! Output follows the byte-frequency analyser model: Blackman window,
//! magnitude scaled by 1/N, exponential smoothing across polls, then the
//! [min_decibels, max_decibels] window mapped onto 0..=255.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::error::AudioError;
use crate::params::AnalyserConfig;

/// Stateful analyser; one per audio graph
pub struct FrequencyAnalyser {
    config: AnalyserConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

impl FrequencyAnalyser {
    pub fn new(config: &AnalyserConfig) -> Result<Self, AudioError> {
        config.validate().map_err(AudioError::Config)?;

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.fft_size);
        let window = (0..config.fft_size)
            .map(|i| blackman_window(i, config.fft_size))
            .collect();

        Ok(Self {
            config: config.clone(),
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); config.fft_size],
            smoothed: vec![0.0; config.bin_count()],
        })
    }

    /// FFT window size in samples
    pub fn fft_size(&self) -> usize {
        self.config.fft_size
    }

    /// Number of output bins
    pub fn bin_count(&self) -> usize {
        self.config.bin_count()
    }

    /// Analyse `time_domain` (oldest sample first) into byte bins.
    ///
    /// Missing samples are treated as silence; `bins` beyond the bin count
    /// are left untouched. Returns the arithmetic mean of the written bins.
    pub fn byte_frequency_data(&mut self, time_domain: &[f32], bins: &mut [u8]) -> f32 {
        let n = self.config.fft_size;

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = time_domain.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let tau = self.config.smoothing;
        let range = self.config.max_decibels - self.config.min_decibels;
        let count = self.bin_count().min(bins.len());
        if count == 0 {
            return 0.0;
        }

        let mut sum = 0.0;
        for k in 0..count {
            let magnitude = self.buffer[k].norm() / n as f32;
            let mut smoothed = tau * self.smoothed[k] + (1.0 - tau) * magnitude;
            if !smoothed.is_finite() {
                smoothed = 0.0;
            }
            self.smoothed[k] = smoothed;

            // log10(0) = -inf, which clamps to 0 below
            let db = 20.0 * smoothed.log10();
            let scaled = (255.0 / range) * (db - self.config.min_decibels);
            let byte = scaled.clamp(0.0, 255.0).floor() as u8;

            bins[k] = byte;
            sum += byte as f32;
        }

        sum / count as f32
    }
}

/// Blackman window (alpha = 0.16) over a period of `size` samples
pub fn blackman_window(index: usize, size: usize) -> f32 {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    let x = index as f32 / size as f32;
    a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(bin: usize, size: usize, amplitude: f32) -> Vec<f32> {
        (0..size)
            .map(|i| amplitude * (2.0 * PI * bin as f32 * i as f32 / size as f32).sin())
            .collect()
    }

    #[test]
    fn test_blackman_window() {
        let size = 64;

        // Blackman window is 0 at the start, 1 at the center
        assert!(blackman_window(0, size).abs() < 1e-6);
        assert!((blackman_window(size / 2, size) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_silence_gives_zero_bins() {
        let mut analyser = FrequencyAnalyser::new(&AnalyserConfig::default()).unwrap();
        let mut bins = vec![7u8; analyser.bin_count()];

        let avg = analyser.byte_frequency_data(&[0.0; 64], &mut bins);

        assert_eq!(avg, 0.0);
        assert!(bins.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_tone_lights_its_bin() {
        let mut analyser = FrequencyAnalyser::new(&AnalyserConfig::default()).unwrap();
        let mut bins = vec![0u8; 32];

        let avg = analyser.byte_frequency_data(&tone(4, 64, 0.8), &mut bins);

        assert_eq!(bins[4], 255);
        assert!(bins[12] < 10, "bin 12 leaked: {}", bins[12]);
        assert!(bins[20] < 10, "bin 20 leaked: {}", bins[20]);
        assert!(avg > 0.0);
    }

    #[test]
    fn test_smoothing_decays_after_silence() {
        let mut analyser = FrequencyAnalyser::new(&AnalyserConfig::default()).unwrap();
        let mut bins = vec![0u8; 32];

        for _ in 0..10 {
            analyser.byte_frequency_data(&tone(8, 64, 0.8), &mut bins);
        }
        let loud = analyser.byte_frequency_data(&tone(8, 64, 0.8), &mut bins);

        // Smoothing keeps energy around for a while, then it drains
        let first_quiet = analyser.byte_frequency_data(&[0.0; 64], &mut bins);
        assert!(first_quiet > 0.0);
        let mut quiet = first_quiet;
        for _ in 0..200 {
            quiet = analyser.byte_frequency_data(&[0.0; 64], &mut bins);
        }
        assert!(quiet < loud);
        assert_eq!(quiet, 0.0);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = AnalyserConfig::default();
        config.fft_size = 100;
        assert!(matches!(
            FrequencyAnalyser::new(&config),
            Err(AudioError::Config(_))
        ));
    }
}

//! Per-track audio graph handle: voice + analyser + end-of-track callback.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::decode::DecodedAudio;
use super::error::AudioError;
use super::fft::FrequencyAnalyser;
use super::mixer::{lock_voice, MixerHandle, Voice, VoiceHandle};
use crate::params::AnalyserConfig;

/// Fired once when a non-looping voice reaches its end
pub type EndedCallback = Box<dyn FnOnce() + Send>;

struct Analysis {
    analyser: FrequencyAnalyser,
    time_domain: Vec<f32>,
}

/// Handle to one decoded source playing through the mixer.
///
/// Shared as `Arc<AudioGraph>` between the registry and the visuals that
/// display it; every method takes `&self`.
pub struct AudioGraph {
    locator: String,
    voice: VoiceHandle,
    analysis: Mutex<Analysis>,
    on_ended: Mutex<Option<EndedCallback>>,
}

fn relock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AudioGraph {
    pub fn new(
        locator: &str,
        voice: VoiceHandle,
        config: &AnalyserConfig,
    ) -> Result<Self, AudioError> {
        let analyser = FrequencyAnalyser::new(config)?;
        let time_domain = vec![0.0; analyser.fft_size()];
        Ok(Self {
            locator: locator.to_string(),
            voice,
            analysis: Mutex::new(Analysis {
                analyser,
                time_domain,
            }),
            on_ended: Mutex::new(None),
        })
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    fn voice(&self) -> MutexGuard<'_, Voice> {
        lock_voice(&self.voice)
    }

    /// Route the gain stage to the output
    pub fn connect(&self) {
        self.voice().connected = true;
    }

    /// Detach the gain stage from the output; playback position keeps moving
    pub fn disconnect(&self) {
        self.voice().connected = false;
    }

    pub fn is_connected(&self) -> bool {
        self.voice().connected
    }

    pub fn resume(&self) {
        self.voice().suspended = false;
    }

    /// Freeze playback in place
    pub fn suspend(&self) {
        self.voice().suspended = true;
    }

    pub fn is_suspended(&self) -> bool {
        self.voice().suspended
    }

    /// Set the gain stage (0..=1, applied on the next audio block)
    pub fn set_volume(&self, volume: f32) {
        self.voice().gain = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.voice().gain
    }

    /// Number of bins `poll_frequencies` writes
    pub fn bin_count(&self) -> usize {
        relock(&self.analysis).analyser.bin_count()
    }

    /// Analyse the latest samples into `bins`; returns their mean.
    pub fn poll_frequencies(&self, bins: &mut [u8]) -> f32 {
        let mut analysis = relock(&self.analysis);
        let Analysis {
            analyser,
            time_domain,
        } = &mut *analysis;

        self.voice().tap().snapshot(time_domain);
        analyser.byte_frequency_data(time_domain, bins)
    }

    /// Register (or clear) the end-of-track callback.
    ///
    /// With a callback the voice stops at its end instead of looping.
    pub fn on_ended(&self, callback: Option<EndedCallback>) {
        let looping = callback.is_none();
        *relock(&self.on_ended) = callback;
        self.voice().looping = looping;
    }

    pub fn has_ended_callback(&self) -> bool {
        relock(&self.on_ended).is_some()
    }

    /// Voice reached its end (only possible when not looping)
    pub fn has_ended(&self) -> bool {
        self.voice().ended()
    }

    /// Take the callback if the voice has ended; at most one caller gets it
    pub(crate) fn take_ended_callback(&self) -> Option<EndedCallback> {
        if !self.has_ended() {
            return None;
        }
        relock(&self.on_ended).take()
    }
}

impl std::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

/// Create a graph for `audio` and register its voice with the mixer
pub fn build_graph(
    locator: &str,
    audio: DecodedAudio,
    mixer: &MixerHandle,
    config: &AnalyserConfig,
) -> Result<Arc<AudioGraph>, AudioError> {
    let voice = Arc::new(Mutex::new(Voice::new(Arc::new(audio), config.fft_size)));
    let graph = AudioGraph::new(locator, Arc::clone(&voice), config)?;
    mixer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .add_voice(&voice);
    Ok(Arc::new(graph))
}

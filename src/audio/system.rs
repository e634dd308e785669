//! Audio output: drives the shared mixer from the default cpal device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::error::AudioError;
use super::mixer::{Mixer, MixerHandle};

/// Frames rendered per block when no device is available
const HEADLESS_BLOCK_FRAMES: usize = 512;
const HEADLESS_SAMPLE_RATE: u32 = 44_100;
const HEADLESS_CHANNELS: usize = 2;

enum Output {
    Device(cpal::Stream),
    Headless {
        running: Arc<AtomicBool>,
        thread: Option<thread::JoinHandle<()>>,
    },
}

/// Audio output owning the mixer every graph plays through
pub struct AudioSystem {
    mixer: MixerHandle,
    output: Output,
}

impl AudioSystem {
    /// Open the default output device and start streaming the mixer
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Stream(format!("failed to get audio config: {}", e)))?;

        log::info!(
            "Audio: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate().0
        );

        let mixer = Mixer::new(config.sample_rate().0, config.channels() as usize).into_handle();
        let mixer_cb = Arc::clone(&mixer);

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    mixer_cb
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .render(data);
                },
                |err| log::warn!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::Stream(format!("failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::Stream(format!("failed to start audio stream: {}", e)))?;

        Ok(Self {
            mixer,
            output: Output::Device(stream),
        })
    }

    /// Pump the mixer on a background thread at real-time rate, discarding
    /// the output. Keeps playback, analysis and end-of-track events working
    /// on machines without a sound card.
    pub fn headless() -> Self {
        let mixer = Mixer::new(HEADLESS_SAMPLE_RATE, HEADLESS_CHANNELS).into_handle();
        let running = Arc::new(AtomicBool::new(true));

        let mixer_thread = Arc::clone(&mixer);
        let running_thread = Arc::clone(&running);
        let block = Duration::from_secs_f64(
            HEADLESS_BLOCK_FRAMES as f64 / HEADLESS_SAMPLE_RATE as f64,
        );

        let spawned = thread::Builder::new()
            .name("audio-headless".to_string())
            .spawn(move || {
                let mut data = vec![0.0f32; HEADLESS_BLOCK_FRAMES * HEADLESS_CHANNELS];
                let mut next = Instant::now();
                while running_thread.load(Ordering::Relaxed) {
                    mixer_thread
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .render(&mut data);
                    next += block;
                    if let Some(wait) = next.checked_duration_since(Instant::now()) {
                        thread::sleep(wait);
                    }
                }
            });

        let thread = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                log::warn!("Headless audio thread failed to start: {}", e);
                None
            }
        };

        log::info!("Audio: headless @ {}Hz", HEADLESS_SAMPLE_RATE);

        Self {
            mixer,
            output: Output::Headless { running, thread },
        }
    }

    /// Open the device, falling back to headless output
    pub fn open_or_headless() -> Self {
        match Self::new() {
            Ok(system) => system,
            Err(e) => {
                log::warn!("Audio output unavailable ({}); running headless", e);
                Self::headless()
            }
        }
    }

    /// Shared mixer that audio graphs register their voices with
    pub fn mixer(&self) -> MixerHandle {
        Arc::clone(&self.mixer)
    }

    pub fn is_headless(&self) -> bool {
        matches!(self.output, Output::Headless { .. })
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        if let Output::Headless { running, thread } = &mut self.output {
            running.store(false, Ordering::Relaxed);
            if let Some(handle) = thread.take() {
                let _ = handle.join();
            }
        }
    }
}

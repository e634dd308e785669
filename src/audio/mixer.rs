//! Playback voices and the output mixer.
//!
//! A voice plays one decoded buffer: cursor, gain, suspend and connect
//! flags, and an analysis tap. The tap sees the signal before the gain
//! stage, so volume never changes what the visuals measure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::decode::DecodedAudio;

/// Ring of the most recent mono samples, fed by the mixer
#[derive(Debug, Clone)]
pub struct AnalysisTap {
    ring: Vec<f32>,
    write: usize,
}

impl AnalysisTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: vec![0.0; capacity.max(1)],
            write: 0,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.ring[self.write] = sample;
        self.write = (self.write + 1) % self.ring.len();
    }

    /// Copy the ring into `out`, oldest sample first
    pub fn snapshot(&self, out: &mut [f32]) {
        let len = self.ring.len();
        for (i, slot) in out.iter_mut().enumerate().take(len) {
            *slot = self.ring[(self.write + i) % len];
        }
    }
}

/// Mixer-side playback state of one audio graph
#[derive(Debug)]
pub struct Voice {
    audio: Arc<DecodedAudio>,
    /// Position in source frames (fractional for rate conversion)
    cursor: f64,
    pub gain: f32,
    pub suspended: bool,
    pub connected: bool,
    pub looping: bool,
    ended: bool,
    tap: AnalysisTap,
}

impl Voice {
    /// New voice: looping, unity gain, running but not yet connected
    pub fn new(audio: Arc<DecodedAudio>, tap_size: usize) -> Self {
        Self {
            audio,
            cursor: 0.0,
            gain: 1.0,
            suspended: false,
            connected: false,
            looping: true,
            ended: false,
            tap: AnalysisTap::new(tap_size),
        }
    }

    pub fn audio(&self) -> &Arc<DecodedAudio> {
        &self.audio
    }

    /// Current position in seconds
    pub fn position_secs(&self) -> f32 {
        (self.cursor / self.audio.sample_rate.max(1) as f64) as f32
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn tap(&self) -> &AnalysisTap {
        &self.tap
    }

    /// Linear interpolation between neighbouring frames
    fn sample_at(&self, cursor: f64, channel: usize) -> f32 {
        let frame = cursor.floor() as usize;
        let frac = (cursor - frame as f64) as f32;
        let a = self.audio.sample(frame, channel);
        let next = if frame + 1 < self.audio.frames() {
            frame + 1
        } else if self.looping {
            0
        } else {
            frame
        };
        let b = self.audio.sample(next, channel);
        a + (b - a) * frac
    }

    /// Advance playback by `data.len() / channels` output frames, adding
    /// gained samples into `data` when connected.
    pub fn mix_into(&mut self, data: &mut [f32], channels: usize, output_rate: u32) {
        if self.suspended || self.ended || channels == 0 {
            return;
        }

        let total = self.audio.frames();
        if total == 0 {
            self.ended = true;
            return;
        }

        let step = self.audio.sample_rate as f64 / output_rate.max(1) as f64;
        let total = total as f64;

        for frame in data.chunks_mut(channels) {
            if self.cursor >= total {
                if self.looping {
                    self.cursor %= total;
                } else {
                    self.ended = true;
                    break;
                }
            }

            if self.connected {
                for (ch, out) in frame.iter_mut().enumerate() {
                    *out += self.sample_at(self.cursor, ch) * self.gain;
                }
            }

            let mono = self.audio.mono(self.cursor.floor() as usize);
            self.tap.push(mono);
            self.cursor += step;
        }
    }
}

pub type VoiceHandle = Arc<Mutex<Voice>>;
pub type MixerHandle = Arc<Mutex<Mixer>>;

/// Lock a voice, recovering from poisoning (the data stays usable)
pub fn lock_voice(voice: &VoiceHandle) -> MutexGuard<'_, Voice> {
    voice.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sums every live voice into the output buffer
pub struct Mixer {
    sample_rate: u32,
    channels: usize,
    voices: Vec<Weak<Mutex<Voice>>>,
}

impl Mixer {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            sample_rate,
            channels: channels.max(1),
            voices: Vec::new(),
        }
    }

    pub fn into_handle(self) -> MixerHandle {
        Arc::new(Mutex::new(self))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Register a voice. The mixer only holds a weak reference: dropping
    /// the last graph handle removes the voice.
    pub fn add_voice(&mut self, voice: &VoiceHandle) {
        self.voices.push(Arc::downgrade(voice));
    }

    /// Number of voices still alive
    pub fn voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.strong_count() > 0).count()
    }

    /// Fill an interleaved output buffer
    pub fn render(&mut self, data: &mut [f32]) {
        data.fill(0.0);
        self.voices.retain(|v| v.strong_count() > 0);

        for weak in &self.voices {
            let Some(voice) = weak.upgrade() else {
                continue;
            };
            lock_voice(&voice).mix_into(data, self.channels, self.sample_rate);
        }

        // Safety limiter: hard clip
        for sample in data.iter_mut() {
            *sample = sample.clamp(-1.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(frames: usize, sample_rate: u32) -> Arc<DecodedAudio> {
        Arc::new(DecodedAudio {
            samples: (0..frames).map(|i| i as f32 / frames as f32).collect(),
            channels: 1,
            sample_rate,
        })
    }

    fn connected_voice(audio: Arc<DecodedAudio>) -> VoiceHandle {
        let mut voice = Voice::new(audio, 8);
        voice.connected = true;
        Arc::new(Mutex::new(voice))
    }

    #[test]
    fn test_tap_snapshot_is_oldest_first() {
        let mut tap = AnalysisTap::new(4);
        for s in [1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            tap.push(s);
        }
        let mut out = [0.0; 4];
        tap.snapshot(&mut out);
        assert_eq!(out, [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_mono_voice_fills_both_channels_with_gain() {
        let mut mixer = Mixer::new(100, 2);
        let voice = connected_voice(ramp(10, 100));
        lock_voice(&voice).gain = 0.5;
        mixer.add_voice(&voice);

        let mut data = [0.0f32; 8];
        mixer.render(&mut data);

        // Frame 2 of the ramp = 0.2, halved by gain, duplicated to L/R
        assert!((data[4] - 0.1).abs() < 1e-6);
        assert!((data[5] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_looping_voice_never_ends() {
        let mut mixer = Mixer::new(100, 1);
        let voice = connected_voice(ramp(10, 100));
        mixer.add_voice(&voice);

        let mut data = [0.0f32; 25];
        mixer.render(&mut data);

        assert!(!lock_voice(&voice).ended());
        assert!((data[10] - 0.0).abs() < 1e-6); // Wrapped to frame 0
        assert!((data[13] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_non_looping_voice_ends() {
        let mut mixer = Mixer::new(100, 1);
        let voice = connected_voice(ramp(10, 100));
        lock_voice(&voice).looping = false;
        mixer.add_voice(&voice);

        let mut data = [0.0f32; 25];
        mixer.render(&mut data);

        assert!(lock_voice(&voice).ended());
        assert_eq!(data[15], 0.0);
    }

    #[test]
    fn test_suspended_voice_holds_position() {
        let mut mixer = Mixer::new(100, 1);
        let voice = connected_voice(ramp(10, 100));
        mixer.add_voice(&voice);

        let mut data = [0.0f32; 4];
        mixer.render(&mut data);
        lock_voice(&voice).suspended = true;
        mixer.render(&mut data);

        assert!(data.iter().all(|&s| s == 0.0));
        assert!((lock_voice(&voice).position_secs() - 0.04).abs() < 1e-6);
    }

    #[test]
    fn test_disconnected_voice_is_silent_but_advances_tap() {
        let mut mixer = Mixer::new(100, 1);
        let voice = Arc::new(Mutex::new(Voice::new(ramp(10, 100), 4)));
        mixer.add_voice(&voice);

        let mut data = [0.0f32; 6];
        mixer.render(&mut data);

        assert!(data.iter().all(|&s| s == 0.0));
        let mut tap = [0.0; 4];
        lock_voice(&voice).tap().snapshot(&mut tap);
        assert!((tap[3] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rate_conversion_steps_source() {
        // Source at half the output rate advances half a frame per output frame
        let mut mixer = Mixer::new(200, 1);
        let voice = connected_voice(ramp(10, 100));
        mixer.add_voice(&voice);

        let mut data = [0.0f32; 4];
        mixer.render(&mut data);

        assert!((data[1] - 0.05).abs() < 1e-6); // Interpolated between frames 0 and 1
        assert!((data[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_dropped_voice_is_pruned() {
        let mut mixer = Mixer::new(100, 1);
        let voice = connected_voice(ramp(10, 100));
        mixer.add_voice(&voice);
        assert_eq!(mixer.voice_count(), 1);

        drop(voice);
        let mut data = [0.0f32; 4];
        mixer.render(&mut data);
        assert_eq!(mixer.voice_count(), 0);
    }
}

//! Audio source loading and decoding (Symphonia).

use std::fs::File;
use std::path::{Path, PathBuf};

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::error::AudioError;
use super::uploads::UploadStore;

/// Fully decoded audio, interleaved f32 samples
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Number of sample frames (samples per channel)
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate.max(1) as f32
    }

    /// Sample of `channel` at integer frame `frame`.
    /// Channels past the source layout map onto its last channel.
    pub fn sample(&self, frame: usize, channel: usize) -> f32 {
        let ch = channel.min(self.channels.saturating_sub(1));
        self.samples
            .get(frame * self.channels + ch)
            .copied()
            .unwrap_or(0.0)
    }

    /// Mean of all channels at integer frame `frame`
    pub fn mono(&self, frame: usize) -> f32 {
        if self.channels == 0 {
            return 0.0;
        }
        let start = frame * self.channels;
        match self.samples.get(start..start + self.channels) {
            Some(slice) => slice.iter().sum::<f32>() / self.channels as f32,
            None => 0.0,
        }
    }
}

/// Loads a locator into decoded audio.
///
/// Called on a decode worker thread, once per distinct locator.
pub trait SourceLoader: Send + Sync {
    fn load(&self, locator: &str) -> Result<DecodedAudio, AudioError>;
}

/// Loads bundled assets (relative to `root`), absolute paths, and uploads
pub struct FileLoader {
    root: PathBuf,
    uploads: UploadStore,
}

impl FileLoader {
    pub fn new(root: impl Into<PathBuf>, uploads: UploadStore) -> Self {
        Self {
            root: root.into(),
            uploads,
        }
    }

    /// Map a locator to the file it names
    pub fn resolve(&self, locator: &str) -> Result<PathBuf, AudioError> {
        if UploadStore::is_upload_locator(locator) {
            return self
                .uploads
                .resolve(locator)
                .ok_or_else(|| AudioError::UnknownUpload(locator.to_string()));
        }
        let path = Path::new(locator);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.root.join(path))
        }
    }
}

impl SourceLoader for FileLoader {
    fn load(&self, locator: &str) -> Result<DecodedAudio, AudioError> {
        let path = self.resolve(locator)?;
        decode_file(&path, locator)
    }
}

/// Decode an audio file to interleaved f32 samples using Symphonia
pub fn decode_file(path: &Path, locator: &str) -> Result<DecodedAudio, AudioError> {
    let file = File::open(path).map_err(|source| AudioError::Io {
        locator: locator.to_string(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Create a hint with the file extension
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Unsupported {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::NoTrack(locator.to_string()))?;

    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut channels = track.codec_params.channels.map(|c| c.count());

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| AudioError::Unsupported {
            locator: locator.to_string(),
            reason: e.to_string(),
        })?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(AudioError::Decode {
                    locator: locator.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            // Corrupt frames are skipped, matching browser decoders
            Err(SymphoniaError::DecodeError(e)) => {
                log::debug!("{}: skipping bad packet: {}", locator, e);
                continue;
            }
            Err(e) => {
                return Err(AudioError::Decode {
                    locator: locator.to_string(),
                    reason: e.to_string(),
                })
            }
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count());
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
        return Err(AudioError::NoTrack(locator.to_string()));
    };
    if channels == 0 || sample_rate == 0 {
        return Err(AudioError::NoTrack(locator.to_string()));
    }

    log::info!(
        "Decoded {}: {} ch @ {}Hz, {:.1}s",
        locator,
        channels,
        sample_rate,
        samples.len() as f32 / channels as f32 / sample_rate as f32
    );

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_audio_frames_and_channels() {
        let audio = DecodedAudio {
            samples: vec![0.1, 0.3, 0.5, 0.7],
            channels: 2,
            sample_rate: 2,
        };

        assert_eq!(audio.frames(), 2);
        assert_eq!(audio.duration_secs(), 1.0);
        assert_eq!(audio.sample(1, 0), 0.5);
        assert_eq!(audio.sample(1, 5), 0.7); // Extra channels map onto the last
        assert!((audio.mono(0) - 0.2).abs() < 1e-6);
        assert_eq!(audio.mono(9), 0.0);
    }

    #[test]
    fn test_resolve_locators() {
        let uploads = UploadStore::new();
        let loader = FileLoader::new("assets", uploads.clone());

        assert_eq!(
            loader.resolve("audio/synth.mp3").unwrap(),
            PathBuf::from("assets/audio/synth.mp3")
        );

        let locator = uploads.create(Path::new("/tmp/song.mp3"));
        assert_eq!(
            loader.resolve(&locator).unwrap(),
            PathBuf::from("/tmp/song.mp3")
        );

        uploads.revoke(&locator);
        assert!(matches!(
            loader.resolve(&locator),
            Err(AudioError::UnknownUpload(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = decode_file(Path::new("/definitely/not/here.mp3"), "missing");
        assert!(matches!(result, Err(AudioError::Io { .. })));
    }
}

//! Audio subsystem errors.

use std::io;

use thiserror::Error;

/// Errors raised while loading, decoding, or playing audio
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("failed to open {locator}: {source}")]
    Io {
        locator: String,
        #[source]
        source: io::Error,
    },

    #[error("no upload registered for {0}")]
    UnknownUpload(String),

    #[error("unsupported format for {locator}: {reason}")]
    Unsupported { locator: String, reason: String },

    #[error("no decodable audio track in {0}")]
    NoTrack(String),

    #[error("decode failed for {locator}: {reason}")]
    Decode { locator: String, reason: String },

    #[error("decode worker for {0} stopped before reporting")]
    WorkerLost(String),

    #[error("invalid analyser config: {0}")]
    Config(String),

    #[error("no audio output device found")]
    NoDevice,

    #[error("audio stream: {0}")]
    Stream(String),
}

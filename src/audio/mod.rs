//! Audio: decoding, per-track graphs, frequency analysis and output.

mod decode;
mod error;
mod fft;
mod graph;
mod mixer;
mod registry;
mod system;
mod uploads;

pub use decode::{decode_file, DecodedAudio, FileLoader, SourceLoader};
pub use error::AudioError;
pub use fft::{blackman_window, FrequencyAnalyser};
pub use graph::{build_graph, AudioGraph, EndedCallback};
pub use mixer::{lock_voice, AnalysisTap, Mixer, MixerHandle, Voice, VoiceHandle};
pub use registry::{Acquire, GraphRegistry};
pub use system::AudioSystem;
pub use uploads::UploadStore;

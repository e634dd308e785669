//! Control panel model: tracks, play flags and volume.

mod state;
mod track;

pub use state::PlayerState;
pub use track::{guess_media_type, FileCandidate, Track};

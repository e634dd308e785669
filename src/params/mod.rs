//! Parameter definitions with units and documented semantics.
//!
//! All tuning constants live here with:
//! - Units (world units, seconds, degrees, dBFS)
//! - Documented ranges and meanings
//! - Defaults matching the bundled assets

mod audio;
mod camera;
mod render;
mod visual;

// Re-export all types
pub use audio::{AnalyserConfig, AssetPaths, PlaybackParams};
pub use camera::{CameraMove, CameraRig, OrbitLimits};
pub use render::{PostFx, RenderConfig};
pub use visual::TrackLayout;

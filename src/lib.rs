//! cubebeat library - audio-reactive track visuals around a clickable model

pub mod audio;
pub mod camera;
pub mod cli;
pub mod controls;
pub mod params;
pub mod playback;
pub mod rendering;
pub mod scene;
pub mod settings;
pub mod visual;

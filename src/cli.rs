//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::playback::PlayerState;
use crate::scene::Skin;
use crate::settings::Settings;
use crate::visual::VisualStyle;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cubebeat")]
#[command(about = "Audio-reactive 3D track visualizer", long_about = None)]
pub struct Args {
    /// Audio files to add after the default tracks
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Settings file (default: $XDG_CONFIG_HOME/cubebeat/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable post-processing tweak keys and log their values
    #[arg(long)]
    pub debug: bool,

    /// Skip the bundled demo tracks
    #[arg(long)]
    pub no_defaults: bool,

    /// Advance to the next track when one ends instead of looping
    #[arg(long)]
    pub playlist: bool,

    /// Visualization style: bars, lines, alternate (default)
    #[arg(long, value_name = "STYLE", default_value = "alternate")]
    pub style: String,

    /// Model skin: baked (default), neon
    #[arg(long, value_name = "SKIN", default_value = "baked")]
    pub skin: String,

    /// Initial volume (0..1)
    #[arg(long, value_name = "VOLUME")]
    pub volume: Option<f32>,
}

impl Args {
    /// Parse visualization style from command-line arguments
    pub fn parse_style(&self) -> VisualStyle {
        match self.style.parse() {
            Ok(style) => {
                log::info!("Style: {}", style);
                style
            }
            Err(e) => {
                log::warn!("{}, using alternate", e);
                VisualStyle::Alternate
            }
        }
    }

    /// Parse model skin from command-line arguments
    pub fn parse_skin(&self) -> Skin {
        match self.skin.parse() {
            Ok(skin) => skin,
            Err(e) => {
                log::warn!("{}, using baked", e);
                Skin::Baked
            }
        }
    }

    /// Apply settings overrides given on the command line
    pub fn apply(&self, settings: &mut Settings) {
        if self.playlist {
            settings.playback.playlist = true;
        }
        if let Some(volume) = self.volume {
            let clamped = volume.clamp(0.0, 1.0);
            if clamped != volume {
                log::warn!("Volume {} out of range, using {}", volume, clamped);
            }
            settings.playback.default_volume = clamped;
        }
        if self.no_defaults {
            settings.assets.default_tracks.clear();
        }
    }

    /// Apply the picker flags to a fresh player state
    pub fn apply_pickers(&self, state: &mut PlayerState) {
        state.style = self.parse_style();
        state.skin = self.parse_skin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PlaybackParams;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("cubebeat").chain(argv.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let args = args(&[]);
        assert!(args.files.is_empty());
        assert!(!args.debug);
        assert_eq!(args.parse_style(), VisualStyle::Alternate);
        assert_eq!(args.parse_skin(), Skin::Baked);
    }

    #[test]
    fn test_files_and_flags() {
        let args = args(&[
            "a.mp3", "b.wav", "--debug", "--playlist", "--style", "lines", "--skin", "neon",
        ]);
        assert_eq!(args.files, vec![PathBuf::from("a.mp3"), PathBuf::from("b.wav")]);
        assert!(args.debug);
        assert_eq!(args.parse_style(), VisualStyle::Lines);
        assert_eq!(args.parse_skin(), Skin::Neon);
    }

    #[test]
    fn test_unknown_picker_values_fall_back() {
        let args = args(&["--style", "dots", "--skin", "chrome"]);
        assert_eq!(args.parse_style(), VisualStyle::Alternate);
        assert_eq!(args.parse_skin(), Skin::Baked);
    }

    #[test]
    fn test_apply_overrides_settings() {
        let mut settings = Settings::default();
        args(&["--playlist", "--volume", "1.5", "--no-defaults"]).apply(&mut settings);

        assert!(settings.playback.playlist);
        assert_eq!(settings.playback.default_volume, 1.0);
        assert!(settings.assets.default_tracks.is_empty());
    }

    #[test]
    fn test_apply_pickers() {
        let mut state = PlayerState::new(Vec::new(), &PlaybackParams::default());
        args(&["--style", "bars", "--skin", "neon"]).apply_pickers(&mut state);
        assert_eq!(state.style, VisualStyle::Bars);
        assert_eq!(state.skin, Skin::Neon);
    }
}

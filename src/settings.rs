//! Layered settings: struct defaults < TOML file < `CUBEBEAT__` environment.

use std::env;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;

use crate::params::{
    AnalyserConfig, AssetPaths, CameraRig, PlaybackParams, PostFx, RenderConfig, TrackLayout,
};

const ENV_PREFIX: &str = "CUBEBEAT";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Every tunable section, as read from `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analyser: AnalyserConfig,
    pub playback: PlaybackParams,
    pub layout: TrackLayout,
    pub camera: CameraRig,
    pub render: RenderConfig,
    pub post: PostFx,
    pub assets: AssetPaths,
}

impl Settings {
    /// Load settings. An explicit `path` must exist; otherwise the default
    /// config file is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load_layers(Some((path, true)), None),
            None => {
                let default = default_config_path();
                Self::load_layers(default.as_deref().map(|p| (p, false)), None)
            }
        }
    }

    /// Build from an optional `(file, required)` layer and an environment
    /// map (`None` reads the process environment)
    fn load_layers(
        file: Option<(&Path, bool)>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder();

        if let Some((path, required)) = file {
            log::debug!("Settings file: {}", path.display());
            builder = builder.add_source(File::from(path).required(required));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.analyser.validate().map_err(SettingsError::Invalid)?;

        let volume = self.playback.default_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(SettingsError::Invalid(format!(
                "playback.default_volume must be in [0, 1], got {}",
                volume
            )));
        }
        if self.playback.volume_step <= 0.0 {
            return Err(SettingsError::Invalid(
                "playback.volume_step must be > 0".to_string(),
            ));
        }

        let fov = self.camera.fov_degrees;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(SettingsError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                fov
            )));
        }
        if self.camera.near_plane <= 0.0 || self.camera.near_plane >= self.camera.far_plane {
            return Err(SettingsError::Invalid(
                "camera.near_plane must be > 0 and below camera.far_plane".to_string(),
            ));
        }
        if self.camera.orbit.min_distance > self.camera.orbit.max_distance {
            return Err(SettingsError::Invalid(
                "camera.orbit.min_distance exceeds max_distance".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve a path relative to the asset root
    pub fn asset_path(&self, relative: &str) -> PathBuf {
        Path::new(&self.assets.root).join(relative)
    }

    pub fn default_track_paths(&self) -> Vec<PathBuf> {
        self.assets
            .default_tracks
            .iter()
            .map(|t| self.asset_path(t))
            .collect()
    }

    pub fn baked_texture_path(&self) -> PathBuf {
        self.asset_path(&self.assets.baked_texture)
    }
}

/// `$XDG_CONFIG_HOME/cubebeat/config.toml`, or under `~/.config` when
/// `XDG_CONFIG_HOME` is not set
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("cubebeat").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn no_env() -> Option<Map<String, String>> {
        Some(Map::new())
    }

    #[test]
    fn test_defaults_without_sources() {
        let settings = Settings::load_layers(None, no_env()).unwrap();
        assert_eq!(settings.analyser.fft_size, 64);
        assert_eq!(settings.playback.default_volume, 0.5);
        assert_eq!(settings.camera.fov_degrees, 45.0);
        assert_eq!(settings.default_track_paths().len(), 3);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file(
            "[playback]\ndefault_volume = 0.8\n\n[analyser]\nfft_size = 128\n\n[assets]\nroot = \"/srv/media\"\n",
        );
        let settings = Settings::load_layers(Some((file.path(), true)), no_env()).unwrap();

        assert_eq!(settings.playback.default_volume, 0.8);
        assert_eq!(settings.analyser.fft_size, 128);
        assert_eq!(settings.analyser.smoothing, 0.8); // Untouched keys keep defaults
        assert_eq!(
            settings.baked_texture_path(),
            PathBuf::from("/srv/media/model/baked_texture.png")
        );
    }

    #[test]
    fn test_environment_overrides_file() {
        let file = toml_file("[playback]\ndefault_volume = 0.8\n");
        let mut env = Map::new();
        env.insert(
            "CUBEBEAT__PLAYBACK__DEFAULT_VOLUME".to_string(),
            "0.25".to_string(),
        );

        let settings = Settings::load_layers(Some((file.path(), true)), Some(env)).unwrap();
        assert_eq!(settings.playback.default_volume, 0.25);
    }

    #[test]
    fn test_invalid_fft_size_rejected() {
        let file = toml_file("[analyser]\nfft_size = 100\n");
        let err = Settings::load_layers(Some((file.path(), true)), no_env()).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid(_)));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/cubebeat.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Load(_)));
    }

    #[test]
    fn test_missing_optional_file_uses_defaults() {
        let settings =
            Settings::load_layers(Some((Path::new("/nonexistent/config.toml"), false)), no_env())
                .unwrap();
        assert_eq!(settings.playback.volume_step, 0.1);
    }
}

//! Recorder configuration.
//!
//! [`ArchiveConfig`] is handed to the archive backend untouched when a
//! context is created. [`RecorderConfig`] adds the output path and the
//! per-kind capture toggles the session itself consults during discovery.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::{Error, Result};

/// Archive container flavour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArchiveType {
    Hdf5,
    #[default]
    Ogawa,
}

/// How sample times are laid out by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSamplingType {
    /// Fixed step of `1 / frame_rate`.
    #[default]
    Uniform,
    /// Each sample carries the session time cursor.
    Acyclic,
}

/// How transform samples are stored by the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum XformType {
    Matrix,
    #[default]
    Trs,
}

/// Native archive configuration, passed through to the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub archive_type: ArchiveType,
    pub time_sampling: TimeSamplingType,
    pub frame_rate: f32,
    pub xform_type: XformType,
    pub swap_handedness: bool,
    pub swap_faces: bool,
    pub scale: f32,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            archive_type: ArchiveType::Ogawa,
            time_sampling: TimeSamplingType::Uniform,
            frame_rate: 30.0,
            xform_type: XformType::Trs,
            swap_handedness: true,
            swap_faces: false,
            scale: 1.0,
        }
    }
}

/// Everything a recording session needs besides the scene and backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Output archive path.
    pub path: PathBuf,
    pub archive: ArchiveConfig,
    pub capture_camera: bool,
    pub capture_mesh_renderer: bool,
    pub capture_skinned_mesh_renderer: bool,
    pub capture_custom_recorders: bool,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.abc"),
            archive: ArchiveConfig::default(),
            capture_camera: true,
            capture_mesh_renderer: true,
            capture_skinned_mesh_renderer: true,
            capture_custom_recorders: true,
        }
    }
}

impl RecorderConfig {
    /// Default configuration writing to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject configurations no backend could honour.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::config("archive path is empty"));
        }
        let rate = self.archive.frame_rate;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::config(format!("frame rate must be positive, got {}", rate)));
        }
        let scale = self.archive.scale;
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::config(format!("scale must be positive, got {}", scale)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_capture_everything() {
        let config = RecorderConfig::default();
        assert!(config.capture_camera);
        assert!(config.capture_mesh_renderer);
        assert!(config.capture_skinned_mesh_renderer);
        assert!(config.capture_custom_recorders);
        assert_eq!(config.archive.archive_type, ArchiveType::Ogawa);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp = NamedTempFile::new().expect("Failed to create temp file");
        let mut config = RecorderConfig::new("shots/take_01.abc");
        config.capture_camera = false;
        config.archive.frame_rate = 24.0;
        config.archive.time_sampling = TimeSamplingType::Acyclic;

        config.save(temp.path()).expect("Failed to save config");
        let loaded = RecorderConfig::load(temp.path()).expect("Failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RecorderConfig =
            serde_json::from_str(r#"{ "path": "a.abc", "archive": { "frame_rate": 60.0 } }"#)
                .expect("Failed to parse");
        assert_eq!(config.path, PathBuf::from("a.abc"));
        assert_eq!(config.archive.frame_rate, 60.0);
        assert!(config.archive.swap_handedness);
        assert!(config.capture_skinned_mesh_renderer);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RecorderConfig::new("");
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.path = PathBuf::from("ok.abc");
        config.archive.frame_rate = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.archive.frame_rate = 30.0;
        config.archive.scale = f32::NAN;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_invalid_json() {
        let temp = NamedTempFile::new().expect("Failed to create temp file");
        std::fs::write(temp.path(), "{ not json").expect("Failed to write");
        assert!(matches!(RecorderConfig::load(temp.path()), Err(Error::Json(_))));
    }
}

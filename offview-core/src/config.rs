/// Viewer configuration loaded from TOML
///
/// ```toml
/// [mesh]
/// path = "assets/cube.off"
/// normal_strategy = "edge_cross"   # or "raw_vertex"
/// unit_divisor = 1000.0            # STOFF only
/// center_offset = [0.0, 0.0, 0.0]  # STOFF only
///
/// [interaction]
/// rotate_threshold_deg = 30.0
/// touch_scale_factor = 0.5625
///
/// [camera]
/// spin_axis = "z"
///
/// [logging]
/// level = "info"
/// file = "offview.log"
/// ```
///
/// Every field has a default, so an empty file is a valid configuration.
use std::path::{Path, PathBuf};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::mesh::MeshOptions;
use crate::normals::FaceNormalStrategy;
use crate::off::ParseOptions;
use crate::orientation::InteractionConfig;
use crate::projection::CameraConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mesh: MeshConfig,
    pub interaction: InteractionConfig,
    pub camera: CameraConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub path: Option<PathBuf>,
    pub normal_strategy: FaceNormalStrategy,
    pub unit_divisor: f32,
    pub center_offset: [f32; 3],
}

impl Default for MeshConfig {
    fn default() -> Self {
        let parse = ParseOptions::default();
        Self {
            path: None,
            normal_strategy: FaceNormalStrategy::default(),
            unit_divisor: parse.unit_divisor,
            center_offset: parse.center_offset.into(),
        }
    }
}

impl MeshConfig {
    pub fn options(&self) -> MeshOptions {
        MeshOptions {
            parse: ParseOptions {
                unit_divisor: self.unit_divisor,
                center_offset: Vector3::from(self.center_offset),
            },
            normal_strategy: self.normal_strategy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Log to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        positive("mesh.unit_divisor", self.mesh.unit_divisor)?;
        positive(
            "interaction.touch_scale_factor",
            self.interaction.touch_scale_factor,
        )?;
        positive("interaction.initial_scale", self.interaction.initial_scale)?;
        positive(
            "interaction.rotate_threshold_deg",
            self.interaction.rotate_threshold_deg,
        )?;
        if self.interaction.rotate_threshold_deg >= 90.0 {
            return Err(invalid(
                "interaction.rotate_threshold_deg",
                "must be below 90 so the bands do not overlap",
            ));
        }
        positive("camera.near", self.camera.near)?;
        if !(self.camera.far > self.camera.near) {
            return Err(invalid("camera.far", "must be greater than camera.near"));
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> std::result::Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

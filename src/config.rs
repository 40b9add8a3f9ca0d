use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    settings::{SettingsController, SliderValues},
};

pub const DEFAULT_CONFIG_PATH: &str = "ray_tracing.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`.
    pub log_level: String,
    pub window: WindowConfig,
    pub render: RenderConfig,
    pub controls: ControlsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            window: WindowConfig::default(),
            render: RenderConfig::default(),
            controls: ControlsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Ray Tracing".to_owned(),
            width: 1280,
            height: 720,
        }
    }
}

/// Initial slider values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub color: [f32; 4],
    pub light_direction: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        let values = SliderValues::default();
        Self {
            color: values.color.to_array(),
            light_direction: values.light.to_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub color_step: f32,
    pub light_step: f32,
    /// Where the snapshot key writes the final image.
    pub snapshot_path: PathBuf,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            color_step: 0.05,
            light_step: 0.05,
            snapshot_path: PathBuf::from("ray_tracing.png"),
        }
    }
}

/// Where a [`Config`] came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File(PathBuf),
    /// The file at this path did not exist.
    Defaults(PathBuf),
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Like [`Config::load`], but a missing file yields the defaults. The
    /// returned source says which one happened, for logging once the
    /// subscriber is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<(Self, ConfigSource)> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok((Self::default(), ConfigSource::Defaults(path.to_owned())));
        }
        let config = Self::load(path)?;
        Ok((config, ConfigSource::File(path.to_owned())))
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|err| Error::Config {
            path: path.to_owned(),
            message: err.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |message: &str| Error::Config {
            path: path.to_owned(),
            message: message.to_owned(),
        };

        if !(self.controls.color_step > 0.0 && self.controls.light_step > 0.0) {
            return Err(invalid("control steps must be positive"));
        }
        let finite = self.render.color.iter().all(|c| c.is_finite())
            && self.render.light_direction.iter().all(|c| c.is_finite());
        if !finite {
            return Err(invalid("render values must be finite"));
        }
        Ok(())
    }

    pub fn controller(&self) -> SettingsController {
        let values = SliderValues {
            color: glam::Vec4::from_array(self.render.color),
            light: glam::Vec3::from_array(self.render.light_direction),
        };
        SettingsController::new(values, self.controls.color_step, self.controls.light_step)
    }
}

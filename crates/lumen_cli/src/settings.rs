//! Render settings file: which preset scene to render, and camera
//! fields that override the preset's own camera.

use anyhow::{Context, Result};
use lumen_renderer::CameraConfig;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// The built-in scenes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneKind {
    #[default]
    CornellBox,
    BouncingSpheres,
    Quads,
}

impl SceneKind {
    pub fn name(self) -> &'static str {
        match self {
            SceneKind::CornellBox => "cornell_box",
            SceneKind::BouncingSpheres => "bouncing_spheres",
            SceneKind::Quads => "quads",
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Top-level settings document, e.g.
/// `{ "scene": "cornell_box", "camera": { "samples_per_pixel": 64 } }`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSettings {
    pub scene: SceneKind,
    /// Camera fields to override; anything omitted keeps the preset value
    pub camera: Map<String, Value>,
}

impl RenderSettings {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Invalid render settings")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("In {}", path.display()))
    }

    /// Seed for the scene layout: the `camera.seed` override, or zero.
    pub fn seed(&self) -> u64 {
        self.camera.get("seed").and_then(Value::as_u64).unwrap_or(0)
    }

    /// Apply the camera overrides on top of a preset's configuration.
    pub fn camera_config(&self, preset: CameraConfig) -> Result<CameraConfig> {
        let mut merged = serde_json::to_value(preset).context("Failed to encode camera preset")?;
        if let Value::Object(fields) = &mut merged {
            for (key, value) in &self.camera {
                fields.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(merged).context("Invalid camera settings")
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::render::geometry::DEFAULT_MAX_MESH_VERTICES;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Meshes with more vertices than this are skipped.
    pub max_mesh_vertices: usize,
    /// Textures carry premultiplied alpha; selects the premultiplied blend table.
    pub premultiplied_alpha: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_mesh_vertices: DEFAULT_MAX_MESH_VERTICES,
            premultiplied_alpha: false,
        }
    }
}

impl RenderConfig {
    /// Loads config from a specified path.
    /// Returns default config if file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }
}

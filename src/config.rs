use std::path::Path;

use anyhow::Context as _;

use crate::{error::SpriteResult, grid::GridSpec, preview::PreviewSpec};

/// Everything that shapes the output of a run, apart from the path roots.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SlicerConfig {
    pub grid: GridSpec,
    pub preview: PreviewSpec,
}

impl SlicerConfig {
    /// Loads a JSON config. Omitted sections keep their defaults.
    pub fn from_path(path: &Path) -> SpriteResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config '{}'", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> SpriteResult<()> {
        self.grid.validate()?;
        self.preview.validate()
    }
}

//! The optional `--config` JSON file.
//!
//! ```json
//! {
//!   "transform": { "rewrite_import_paths": true, "collapse_blank_lines": false },
//!   "exclude": ["dist", "coverage"],
//!   "jobs": 4
//! }
//! ```
//!
//! Every field is optional. Command-line flags win over file values; file
//! excludes are added to the ones given with `--exclude`.

use std::path::Path;

use anyhow::{Context, Result};
use dt_transform::TransformOptions;
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub transform: TransformOptions,
    pub exclude: Vec<String>,
    pub jobs: Option<usize>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))
    }
}

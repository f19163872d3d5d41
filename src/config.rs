//! Configuration file loading.
//!
//! `.hamletrc.json` in the project root supplies defaults that CLI
//! flags override. Every field is optional; a missing file means
//! built-in defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::migrate::DEFAULT_STATE_DIR;

pub const CONFIG_FILE_NAME: &str = ".hamletrc.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
}

fn default_state_dir() -> String {
    DEFAULT_STATE_DIR.to_string()
}

impl Config {
    /// Load `.hamletrc.json` from `root`; absent file yields defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self {
                state_dir: default_state_dir(),
                ..Default::default()
            });
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }
}

/// Default config content written by `hamlet init`.
pub fn default_config_json() -> Result<String> {
    let config = Config {
        source: Some("cypress".to_string()),
        target: Some("playwright".to_string()),
        language: None,
        include: Vec::new(),
        ignore: vec!["**/node_modules/**".to_string()],
        state_dir: default_state_dir(),
    };
    let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
    Ok(format!("{json}\n"))
}

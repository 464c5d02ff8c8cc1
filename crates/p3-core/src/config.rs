use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::role::Role;

pub const DEFAULT_ANALYZE_ENDPOINT: &str = "https://52c3-14-143-227-22.ngrok-free.app/api/read";
pub const DEFAULT_IMPROVE_ENDPOINT: &str = "https://52c3-14-143-227-22.ngrok-free.app/api/improve";
pub const DEFAULT_MOCK_LATENCY_MS: u64 = 800;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Config {
    pub analyze_endpoint: Option<String>,
    pub improve_endpoint: Option<String>,
    pub document_endpoint: Option<String>,
    pub default_role: Option<String>,
    pub offline: bool,
    pub mock_latency_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn analyze_endpoint(&self) -> &str {
        self.analyze_endpoint.as_deref().unwrap_or(DEFAULT_ANALYZE_ENDPOINT)
    }

    pub fn improve_endpoint(&self) -> &str {
        self.improve_endpoint.as_deref().unwrap_or(DEFAULT_IMPROVE_ENDPOINT)
    }

    pub fn role(&self) -> Role {
        self.default_role
            .as_deref()
            .and_then(Role::from_str)
            .unwrap_or_default()
    }

    pub fn mock_latency_ms(&self) -> u64 {
        self.mock_latency_ms.unwrap_or(DEFAULT_MOCK_LATENCY_MS)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("p3").join("config.json"))
    }
}

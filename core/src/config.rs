//! Client configuration loaded from TOML.
//!
//! ```toml
//! [central]
//! base_url = "https://central.example.org"
//! token = "..."
//! default_project_id = 1
//! ```
//!
//! The file is looked up at an explicit path, then `CENTRAL_CONFIG_FILE`,
//! then `$HOME/.config/central/config.toml`.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::context::Defaults;
use crate::error::ApiError;

pub const CONFIG_ENV_VAR: &str = "CENTRAL_CONFIG_FILE";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CentralConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub default_project_id: Option<u64>,
    #[serde(default)]
    pub default_form_id: Option<String>,
    #[serde(default)]
    pub default_entity_list_name: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    central: CentralConfig,
}

impl CentralConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ApiError> {
        let file: ConfigFile = toml::from_str(text).map_err(|e| ApiError::Config(e.to_string()))?;
        if file.central.base_url.trim().is_empty() {
            return Err(ApiError::Config("central.base_url must not be empty".to_string()));
        }
        Ok(file.central)
    }

    pub fn load(path: &Path) -> Result<Self, ApiError> {
        let text = std::fs::read_to_string(path).map_err(|source| ApiError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Self::from_toml_str(&text)
    }

    /// Load from `CENTRAL_CONFIG_FILE`, or the per-user default location.
    pub fn load_default() -> Result<Self, ApiError> {
        Self::load(&default_path()?)
    }

    pub fn defaults(&self) -> Defaults {
        Defaults {
            project_id: self.default_project_id,
            form_id: self.default_form_id.clone(),
            entity_list_name: self.default_entity_list_name.clone(),
        }
    }
}

fn default_path() -> Result<PathBuf, ApiError> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let home = std::env::var_os("HOME")
        .ok_or_else(|| ApiError::Config(format!("neither {CONFIG_ENV_VAR} nor HOME is set")))?;
    Ok(PathBuf::from(home).join(".config").join("central").join("config.toml"))
}

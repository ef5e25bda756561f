//! Configuration loading and parsing

use anyhow::{Context, Result};
use car_interface::{default_table, CanPacker, FingerprintConfig, FingerprintTable};
use car_interface::car::chrysler::values::DBC as CHRYSLER_DBC;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub fingerprint: FingerprintConfig,
    /// Extra JSON fingerprint tables merged into the built-in one
    #[serde(default)]
    pub tables: Vec<PathBuf>,
    /// Skip the built-in reference signatures
    #[serde(default)]
    pub no_builtin_tables: bool,
    /// DBC used by the encoders instead of the built-in layout
    pub dbc: Option<PathBuf>,
}

impl AppConfig {
    /// Built-in table plus every configured and extra table
    pub fn load_tables(&self, extra: &[PathBuf]) -> Result<FingerprintTable> {
        let mut table = if self.no_builtin_tables {
            FingerprintTable::new()
        } else {
            default_table()
        };

        for path in self.tables.iter().chain(extra) {
            let loaded = FingerprintTable::from_json_file(path)
                .with_context(|| format!("Failed to load fingerprint table: {:?}", path))?;
            log::debug!("Loaded {} model(s) from {:?}", loaded.len(), path);
            table.extend(loaded);
        }
        Ok(table)
    }

    /// Packer for the encoders
    pub fn packer(&self) -> Result<CanPacker> {
        match &self.dbc {
            Some(path) => CanPacker::from_dbc_file(path)
                .with_context(|| format!("Failed to load DBC file: {:?}", path)),
            None => CanPacker::from_dbc_str(CHRYSLER_DBC, "chrysler")
                .context("Failed to parse built-in layout"),
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULTS: &str = include_str!("../../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub mods_dir: String,
    pub parked_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub archive_extension: String,
    pub manifest_name: String,
}

/// Resolved locations for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModPaths {
    pub active: PathBuf,
    pub parked: PathBuf,
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// `explicit` replaces the per-user config file and must exist. The user
    /// layer is merged key by key, so it only needs the keys it changes.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(DEFAULTS)?;

        let user_path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    return Err(anyhow!("config file not found: {}", path.display()));
                }
                Some(path.to_path_buf())
            }
            None => directories::ProjectDirs::from("", "", "modbisect")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .filter(|path| path.exists()),
        };

        if let Some(path) = user_path {
            let user_str = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let user: toml::Table = toml::from_str(&user_str)
                .with_context(|| format!("parsing {}", path.display()))?;
            merge_tables(&mut merged, user);
            tracing::debug!("merged user config from {}", path.display());
        }

        Self::from_table(merged)
    }

    fn from_table(table: toml::Table) -> Result<Self> {
        let config: AppConfig = toml::Value::Table(table).try_into()?;
        if config.scan.archive_extension.trim().is_empty() {
            return Err(anyhow!("scan.archive_extension must not be empty"));
        }
        Ok(config)
    }

    /// Work out the active and parked directories under `data_path`.
    /// CLI overrides win over the configured names.
    pub fn mod_paths(
        &self,
        data_path: &Path,
        mods_dir: Option<&Path>,
        parked_dir: Option<&Path>,
    ) -> ModPaths {
        let active = mods_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.general.mods_dir));
        let parked = parked_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.general.parked_dir));

        ModPaths {
            active: data_path.join(active),
            parked: data_path.join(parked),
        }
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(toml::Value::Table(existing)) if value.is_table() => {
                if let toml::Value::Table(incoming) = value {
                    merge_tables(existing, incoming);
                }
            }
            _ => {
                base.insert(key, value);
            }
        }
    }
}

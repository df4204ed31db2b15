use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

use crate::model::descriptor::{ModId, ModVersion, PluginDescriptor};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read archive: {0}")]
    Io(#[from] io::Error),
    #[error("invalid archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("malformed {name}: {source}")]
    Syntax {
        name: String,
        source: json5::Error,
    },
    #[error("failed to decode {name}: {source}")]
    Decode {
        name: String,
        source: serde_json::Error,
    },
    #[error("{0} does not declare a modid")]
    MissingModId(String),
}

/// The parts of `modinfo.json` the search cares about.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModManifest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub modid: String,
    pub name: String,
    pub version: String,
    #[serde(deserialize_with = "dependencies_or_empty")]
    pub dependencies: BTreeMap<String, String>,
}

impl ModManifest {
    /// Decode manifest text. Comments and trailing commas are accepted, and
    /// top-level keys match regardless of case, the way the game's own
    /// loader reads them.
    pub fn parse(name: &str, raw: &str) -> Result<Self, ManifestError> {
        let raw = raw.trim_start_matches('\u{feff}');

        let value: serde_json::Value =
            json5::from_str(raw).map_err(|source| ManifestError::Syntax {
                name: name.to_string(),
                source,
            })?;
        let value = match value {
            serde_json::Value::Object(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key.to_ascii_lowercase(), value))
                    .collect(),
            ),
            other => other,
        };

        let manifest: ModManifest =
            serde_json::from_value(value).map_err(|source| ManifestError::Decode {
                name: name.to_string(),
                source,
            })?;
        if manifest.modid.trim().is_empty() {
            return Err(ManifestError::MissingModId(name.to_string()));
        }
        Ok(manifest)
    }

    /// Read `manifest_name` out of the zip archive at `path`.
    pub fn read_from_archive(path: &Path, manifest_name: &str) -> Result<Self, ManifestError> {
        let file = File::open(path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        let mut entry = archive.by_name(manifest_name)?;

        let mut raw = String::new();
        entry.read_to_string(&mut raw)?;
        Self::parse(manifest_name, &raw)
    }

    pub fn into_descriptor(self, source: impl Into<String>) -> PluginDescriptor {
        let name = if self.name.trim().is_empty() {
            self.modid.clone()
        } else {
            self.name
        };

        PluginDescriptor {
            id: ModId::new(self.modid),
            name,
            version: ModVersion(self.version),
            dependencies: self
                .dependencies
                .into_iter()
                .map(|(id, version)| (ModId::new(id), ModVersion(version)))
                .collect(),
            source: source.into(),
        }
    }
}

fn dependencies_or_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(id, version)| {
            let version = match version {
                serde_json::Value::String(text) => text,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            (id, version)
        })
        .collect())
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ignore::WalkBuilder;

use crate::model::config::ScanConfig;
use crate::model::descriptor::PluginDescriptor;
use crate::plugin::manifest::ModManifest;

/// Every mod archive found in one directory, keyed by archive file name.
#[derive(Debug, Default)]
pub struct PluginManager {
    plugins: BTreeMap<String, PluginDescriptor>,
}

impl PluginManager {
    /// Read the manifest of every archive directly inside `dir`. Any archive
    /// that fails to decode aborts the scan.
    pub fn scan(dir: &Path, config: &ScanConfig) -> Result<Self> {
        let mut manager = Self::default();

        for path in archive_paths(dir, &config.archive_extension)? {
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                tracing::warn!("skipping archive with non-utf8 name: {}", path.display());
                continue;
            };

            let manifest = ModManifest::read_from_archive(&path, &config.manifest_name)
                .with_context(|| format!("failed to read mod info from {file_name}"))?;
            if let Some(kind) = manifest.kind.as_deref() {
                tracing::debug!("{file_name}: {kind} mod");
            }

            let descriptor = manifest.into_descriptor(file_name);
            tracing::debug!("{file_name}: {} {}", descriptor.id, descriptor.version);
            manager.plugins.insert(file_name.to_string(), descriptor);
        }

        tracing::info!("loaded {} mods from {}", manager.plugin_count(), dir.display());
        Ok(manager)
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn into_descriptors(self) -> Vec<PluginDescriptor> {
        self.plugins.into_values().collect()
    }

    pub fn summary_notification(&self) -> String {
        let dependencies: usize = self
            .plugins
            .values()
            .map(|plugin| plugin.dependencies.len())
            .sum();
        format!(
            "mods: {} loaded, {dependencies} declared dependencies",
            self.plugin_count()
        )
    }
}

/// Archive files directly inside `dir`, sorted by name.
pub fn archive_paths(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("mods directory not found: {}", dir.display());
    }

    let mut paths: Vec<PathBuf> = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .standard_filters(false)
        .build()
        .flatten()
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            matches.then(|| path.to_path_buf())
        })
        .collect();

    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::descriptor::ModId;
    use crate::plugin::manifest::tests::write_mod_archive;
    use pretty_assertions::assert_eq;

    fn scan_config() -> ScanConfig {
        ScanConfig {
            archive_extension: "zip".into(),
            manifest_name: "modinfo.json".into(),
        }
    }

    #[test]
    fn scans_only_top_level_archives() {
        let dir = tempfile::tempdir().unwrap();
        write_mod_archive(&dir.path().join("b.zip"), r#"{"modid": "b", "name": "B"}"#);
        write_mod_archive(
            &dir.path().join("a.ZIP"),
            r#"{"modid": "a", "name": "A", "dependencies": {"b": "1.0"}}"#,
        );
        std::fs::write(dir.path().join("notes.txt"), "not a mod").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_mod_archive(&dir.path().join("nested/c.zip"), r#"{"modid": "c"}"#);

        let manager = PluginManager::scan(dir.path(), &scan_config()).unwrap();
        assert_eq!(manager.plugin_count(), 2);
        assert_eq!(
            manager.summary_notification(),
            "mods: 2 loaded, 1 declared dependencies"
        );

        let descriptors = manager.into_descriptors();
        assert_eq!(descriptors[0].source, "a.ZIP");
        assert_eq!(descriptors[0].id, ModId::new("a"));
        assert_eq!(descriptors[1].id, ModId::new("b"));
    }

    #[test]
    fn broken_archive_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.zip"), "definitely not a zip").unwrap();

        let err = PluginManager::scan(dir.path(), &scan_config()).unwrap_err();
        assert!(format!("{err:#}").contains("broken.zip"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PluginManager::scan(&dir.path().join("Mods"), &scan_config()).is_err());
    }
}

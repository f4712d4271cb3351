use crate::mods::ModType;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tool-wide settings loaded from `vrmodkit.yaml`.
///
/// Passed explicitly to everything that needs it; there is no global settings instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModSettings {
    /// Directory holding one sub-directory of release files per mod type.
    pub data_dir: Utf8PathBuf,

    /// User-supplied replacement source directories, e.g. for a newer release.
    pub mod_data_dirs: BTreeMap<ModType, Utf8PathBuf>,

    pub scanner: ScannerSettings,

    pub debug_mode: bool,
}

impl Default for ModSettings {
    fn default() -> Self {
        Self {
            data_dir: Utf8PathBuf::from("data"),
            mod_data_dirs: BTreeMap::new(),
            scanner: ScannerSettings::default(),
            debug_mode: false,
        }
    }
}

impl ModSettings {
    /// Directory holding the release DLL and default config for `mod_type`.
    ///
    /// An override is used only if it contains both the target DLL and the config file;
    /// otherwise `<data_dir>/<source dir name>`.
    pub fn mod_source_dir(&self, mod_type: ModType) -> Utf8PathBuf {
        let descriptor = mod_type.descriptor();

        if let Some(dir) = self.mod_data_dirs.get(&mod_type) {
            let complete = dir.join(descriptor.target_file).is_file()
                && dir.join(descriptor.config_file).is_file();
            if complete {
                return dir.clone();
            }
            tracing::warn!(
                "Ignoring {} data dir {}: needs both {} and {}",
                mod_type,
                dir,
                descriptor.target_file,
                descriptor.config_file
            );
        }

        self.data_dir.join(descriptor.source_dir_name)
    }
}

/// Scanner batching and worker pool limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScannerSettings {
    /// Applications per batch submitted to the pool.
    pub chunk_size: usize,
    pub min_workers: usize,
    pub max_workers: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            min_workers: 4,
            max_workers: 48,
        }
    }
}

impl ScannerSettings {
    /// Number of batches allowed to run at once: the CPU count bounded by the limits.
    pub fn worker_count(&self) -> usize {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cpus.max(self.min_workers).min(self.max_workers).max(1)
    }
}

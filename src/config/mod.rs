use crate::models::{AppMap, AppRecord, ModSettings};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// File name of the tool-wide settings inside the config directory.
pub const SETTINGS_FILE: &str = "vrmodkit.yaml";

/// Configuration manager for loading and saving [`ModSettings`].
///
/// Settings live in `vrmodkit.yaml` inside the config directory. A missing file is not an
/// error: defaults are returned and written on the next save.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    settings_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory holding `vrmodkit.yaml`; created if missing
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            settings_path: config_dir.join(SETTINGS_FILE),
            config_dir,
        })
    }

    /// Load the settings file.
    ///
    /// # Returns
    /// The loaded ModSettings, or defaults if the file doesn't exist
    pub fn load_settings(&self) -> Result<ModSettings> {
        if !self.settings_path.exists() {
            tracing::warn!(
                "Settings file not found at {}, using defaults",
                self.settings_path
            );
            return Ok(ModSettings::default());
        }

        let file_contents = fs::read_to_string(&self.settings_path)
            .with_context(|| format!("Failed to read settings: {}", self.settings_path))?;

        let settings: ModSettings = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse settings: {}", self.settings_path))?;

        tracing::info!("Loaded settings from {}", self.settings_path);
        Ok(settings)
    }

    /// Save the settings file.
    ///
    /// # Arguments
    /// * `settings` - The ModSettings to save
    pub fn save_settings(&self, settings: &ModSettings) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.settings_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.settings_path))?;

        tracing::info!("Saved settings to {}", self.settings_path);
        Ok(())
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    pub fn settings_path(&self) -> &Utf8Path {
        &self.settings_path
    }
}

/// Load an application collection from a JSON file.
///
/// Accepts either an object keyed by app id or a plain array of records; both yield a map
/// keyed by each record's `id`.
pub fn load_app_collection(path: &Utf8Path) -> Result<AppMap> {
    let file_contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read apps: {}", path))?;

    let value: serde_json::Value = serde_json::from_str(&file_contents)
        .with_context(|| format!("Failed to parse apps: {}", path))?;

    let records: Vec<AppRecord> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value),
        _ => serde_json::from_value::<AppMap>(value).map(|apps| apps.into_values().collect()),
    }
    .with_context(|| format!("Invalid application records in {}", path))?;

    let apps: AppMap = records.into_iter().map(|r| (r.id.clone(), r)).collect();
    tracing::info!("Loaded {} applications from {}", apps.len(), path);
    Ok(apps)
}

/// Write an application collection as a pretty-printed JSON object keyed by app id.
pub fn save_app_collection(path: &Utf8Path, apps: &AppMap) -> Result<()> {
    let json = serde_json::to_string_pretty(apps).context("Failed to serialize apps to JSON")?;

    fs::write(path, json).with_context(|| format!("Failed to write apps: {}", path))?;

    tracing::info!("Saved {} applications to {}", apps.len(), path);
    Ok(())
}

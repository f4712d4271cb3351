use super::descriptor::{ModDescriptor, ModType};
use super::fingerprint::{UNKNOWN_VERSION, fingerprint};
use super::installer::{InstallError, Installer};
use crate::codec::{ConfigCodec, codec_for};
use crate::models::{AppRecord, ModSettings};
use crate::options::{OptionRecord, OptionTree};
use camino::{Utf8Path, Utf8PathBuf};

/// One mod type bound to one application record.
///
/// Built fresh for every operation from the record's stored option snapshot; every operation
/// writes its outcome (installed flag, version, options) back into the record. Failures never
/// escape as errors: operations return `false` and append a message to [`error`](Self::error).
pub struct ModInstance<'a> {
    descriptor: &'static ModDescriptor,
    options: OptionTree,
    record: &'a mut AppRecord,
    installer: Installer<'static>,
    codec: Box<dyn ConfigCodec>,
    errors: Vec<String>,
}

/// Construct the [`ModInstance`] for `mod_type` over `record`.
pub fn get_mod<'a>(
    record: &'a mut AppRecord,
    mod_type: ModType,
    settings: &ModSettings,
) -> ModInstance<'a> {
    ModInstance::new(record, mod_type, settings)
}

impl<'a> ModInstance<'a> {
    pub fn new(record: &'a mut AppRecord, mod_type: ModType, settings: &ModSettings) -> Self {
        let descriptor = mod_type.descriptor();
        let mut options = OptionTree::new(descriptor.defaults);

        let slot = record.slot_mut(mod_type);
        if slot.settings.is_empty() {
            slot.settings = options.to_flat_list(true);
        } else {
            options.apply_overrides(&slot.settings);
        }

        let kind = descriptor.target_kind;
        if !record.selection_is_valid(kind) {
            tracing::warn!(
                "Selected target paths of {} are out of date, selecting all discovered paths",
                record.name
            );
            record.reset_selection(kind);
        }

        Self {
            descriptor,
            options,
            record,
            installer: Installer::new(descriptor, settings.mod_source_dir(mod_type)),
            codec: codec_for(descriptor.format),
            errors: Vec::new(),
        }
    }

    pub fn mod_type(&self) -> ModType {
        self.descriptor.mod_type
    }

    pub fn descriptor(&self) -> &'static ModDescriptor {
        self.descriptor
    }

    pub fn options(&self) -> &OptionTree {
        &self.options
    }

    pub fn record(&self) -> &AppRecord {
        &*self.record
    }

    /// Messages accumulated by the last operation, joined by spaces.
    pub fn error(&self) -> String {
        self.errors.join(" ")
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn push_error(&mut self, message: String) {
        tracing::error!("{}", message);
        self.errors.push(message);
    }

    /// Store the current option values in the record.
    fn persist_options(&mut self) {
        let flat = self.options.to_flat_list(true);
        self.record.slot_mut(self.descriptor.mod_type).settings = flat;
    }

    /// Apply option overrides coming from the front end and store them in the record.
    pub fn apply_overrides(&mut self, overrides: &[OptionRecord]) -> usize {
        let applied = self.options.apply_overrides(overrides);
        self.persist_options();
        applied
    }

    /// Distinct parent directories of the selected target paths, in selection order.
    pub fn target_dirs(&self) -> Vec<Utf8PathBuf> {
        let mut dirs: Vec<Utf8PathBuf> = Vec::new();
        let parents = self
            .record
            .selected(self.descriptor.target_kind)
            .iter()
            .filter_map(|path| path.parent());
        for dir in parents {
            if !dirs.iter().any(|d| d.as_path() == dir) {
                dirs.push(dir.to_path_buf());
            }
        }
        dirs
    }

    fn config_path(&self, dir: &Utf8Path) -> Utf8PathBuf {
        dir.join(self.descriptor.config_file)
    }

    fn template_path(&self) -> Utf8PathBuf {
        self.installer.source_dir().join(self.descriptor.config_file)
    }

    /// Read the config file from every target into the option tree.
    ///
    /// The record is marked installed when any target has a readable config. Returns `true`
    /// only when every target was read.
    pub fn update_from_disk(&mut self) -> bool {
        self.errors.clear();
        let mut results = Vec::new();

        for dir in self.target_dirs() {
            let file = self.config_path(&dir);
            match self.codec.read(&file) {
                Ok(map) => {
                    let applied = self.options.apply_structured(&map);
                    tracing::debug!("Applied {} values from {}", applied, file);
                    results.push(true);
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!("No {} config at {}", self.mod_type(), file);
                    results.push(false);
                }
                Err(e) => {
                    self.push_error(format!("Error reading mod config: {}", e));
                    results.push(false);
                }
            }
        }

        let any = results.iter().any(|r| *r);
        if any {
            self.current_version();
        }
        self.persist_options();
        self.record.slot_mut(self.descriptor.mod_type).installed = any;

        !results.is_empty() && results.iter().all(|r| *r)
    }

    /// Write the current option values to every target's config file.
    pub fn write_updated_config(&mut self) -> bool {
        self.errors.clear();
        self.persist_options();
        let template = self.template_path();
        let mut ok = true;

        for dir in self.target_dirs() {
            let file = self.config_path(&dir);
            if let Err(e) = self.codec.write(&self.options, &file, Some(&template)) {
                self.push_error(format!("Error writing updated settings: {}", e));
                ok = false;
            }
        }
        ok
    }

    pub fn install(&mut self) -> bool {
        self.set_installed(true)
    }

    pub fn uninstall(&mut self) -> bool {
        self.set_installed(false)
    }

    /// Install when the record says not installed, uninstall otherwise.
    pub fn toggle_install(&mut self) -> bool {
        if self.record.is_installed(self.mod_type()) {
            self.uninstall()
        } else {
            self.install()
        }
    }

    fn set_installed(&mut self, install: bool) -> bool {
        self.errors.clear();
        let dirs = self.target_dirs();
        if install && dirs.is_empty() {
            self.push_error(format!(
                "No {} target locations selected for {}",
                self.descriptor.target_file, self.record.name
            ));
            return false;
        }

        let mut ok = true;
        for dir in &dirs {
            let done = if install {
                self.install_target(dir)
            } else {
                self.uninstall_target(dir)
            };
            ok &= done;
        }

        if !ok {
            tracing::warn!(
                "{} {} failed for some targets of {}, installed flag left unchanged",
                self.descriptor.display_name,
                if install { "install" } else { "uninstall" },
                self.record.name
            );
            return false;
        }

        self.record.slot_mut(self.descriptor.mod_type).installed = install;
        if install {
            self.current_version();
        } else {
            self.record.slot_mut(self.descriptor.mod_type).version.clear();
        }
        true
    }

    fn install_target(&mut self, dir: &Utf8Path) -> bool {
        if let Err(e) = self.installer.install_binary(dir) {
            self.push_error(format!("Error during {} install: {}", self.mod_type(), e));
            if let Err(e) = self.remove_from(dir) {
                self.push_error(format!("Error restoring {} after failed install: {}", dir, e));
            }
            return false;
        }

        // The binary stays in place if the config cannot be written.
        let file = self.config_path(dir);
        let template = self.template_path();
        if let Err(e) = self.codec.write(&self.options, &file, Some(&template)) {
            self.push_error(format!("Error writing mod config: {}", e));
            return false;
        }
        true
    }

    fn uninstall_target(&mut self, dir: &Utf8Path) -> bool {
        match self.remove_from(dir) {
            Ok(()) => true,
            Err(e) => {
                self.push_error(format!("Error during {} uninstall: {}", self.mod_type(), e));
                false
            }
        }
    }

    fn remove_from(&self, dir: &Utf8Path) -> Result<(), InstallError> {
        self.installer.restore_binary(dir)?;
        self.codec.delete(&self.config_path(dir))?;
        Ok(())
    }

    /// Restore compiled-in defaults and store them in the record.
    pub fn reset_to_defaults(&mut self) -> bool {
        self.errors.clear();
        self.options.reset_to_defaults();
        self.persist_options();
        true
    }

    /// Fingerprint the installed binary in every target and store the result in the record.
    ///
    /// Differing versions across targets are logged; the last one found wins.
    pub fn current_version(&mut self) -> String {
        let mut version: Option<String> = None;

        for dir in self.target_dirs() {
            let binary = dir.join(self.descriptor.target_file);
            match fingerprint(&binary, self.descriptor) {
                Ok(Some(found)) => {
                    if version.as_ref().is_some_and(|v| *v != found) {
                        tracing::warn!(
                            "Found multiple installed {} versions for {}",
                            self.mod_type(),
                            self.record.id
                        );
                    }
                    version = Some(found);
                }
                Ok(None) => {}
                Err(e) => self.push_error(format!("Error reading dll version: {:#}", e)),
            }
        }

        let version = version.unwrap_or_else(|| UNKNOWN_VERSION.to_string());
        self.record.slot_mut(self.descriptor.mod_type).version = version.clone();
        version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mods::TargetKind;
    use crate::options::OptionValue;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        settings: ModSettings,
        record: AppRecord,
    }

    /// A game with one `openvr_api.dll` and an FSR source directory.
    fn fixture() -> Fixture {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();

        let source = root.join("data").join("openvr_fsr");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("openvr_api.dll"), vec![7u8; 64]).unwrap();

        let bin = root.join("game").join("bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("openvr_api.dll"), b"0123456789").unwrap();

        let mut record = AppRecord::new("42", "Test Game", root.join("game"));
        record.set_discovered(TargetKind::EngineDll, vec![bin.join("openvr_api.dll")]);
        record.reset_selection(TargetKind::EngineDll);

        let settings = ModSettings {
            data_dir: root.join("data"),
            ..ModSettings::default()
        };

        Fixture {
            _temp_dir: temp_dir,
            settings,
            record,
        }
    }

    #[test]
    fn test_construction_seeds_slot_and_fixes_selection() {
        let mut fx = fixture();
        fx.record.open_vr_dll_paths_selected = vec!["/moved/openvr_api.dll".into()];

        let instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);
        assert_eq!(instance.target_dirs().len(), 1);
        drop(instance);

        let slot = fx.record.slot(ModType::Fsr).unwrap();
        assert!(!slot.settings.is_empty());
        assert!(fx.record.selection_is_valid(TargetKind::EngineDll));
    }

    #[test]
    fn test_saved_settings_override_defaults() {
        let mut fx = fixture();
        fx.record.slot_mut(ModType::Fsr).settings =
            vec![OptionRecord::new("renderScale", None, OptionValue::Float(1.2))];

        let instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);
        assert_eq!(
            instance.options().value("renderScale", None),
            Some(&OptionValue::Float(1.2))
        );
        assert_eq!(
            instance.options().value("sharpness", None),
            Some(&OptionValue::Float(0.9))
        );
    }

    #[test]
    fn test_toggle_round_trip() {
        let mut fx = fixture();
        let mut instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);

        assert!(instance.toggle_install(), "{}", instance.error());
        assert!(instance.record().is_installed(ModType::Fsr));
        assert_eq!(
            instance.record().slot(ModType::Fsr).unwrap().version,
            UNKNOWN_VERSION
        );

        assert!(instance.toggle_install(), "{}", instance.error());
        let slot = instance.record().slot(ModType::Fsr).unwrap();
        assert!(!slot.installed);
        assert!(slot.version.is_empty());
    }

    #[test]
    fn test_update_from_disk_without_config() {
        let mut fx = fixture();
        let mut instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);

        assert!(!instance.update_from_disk());
        assert!(instance.error().is_empty());
        assert!(!instance.record().is_installed(ModType::Fsr));
    }

    #[test]
    fn test_malformed_config_is_reported() {
        let mut fx = fixture();
        let dir = fx.record.open_vr_dll_paths[0].parent().unwrap().to_path_buf();
        fs::write(dir.join("openvr_mod.cfg"), "{ broken").unwrap();

        let mut instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);
        assert!(!instance.update_from_disk());
        assert!(instance.error().contains("Error reading mod config"));
    }

    #[test]
    fn test_install_with_missing_source_restores_target() {
        let mut fx = fixture();
        fs::remove_file(fx.settings.data_dir.join("openvr_fsr").join("openvr_api.dll")).unwrap();
        let game_dll = fx.record.open_vr_dll_paths[0].clone();

        let mut instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);
        assert!(!instance.install());
        assert!(!instance.error().is_empty());
        assert!(!instance.record().is_installed(ModType::Fsr));
        assert_eq!(fs::read(&game_dll).unwrap(), b"0123456789");
    }

    #[test]
    fn test_install_without_targets_fails() {
        let mut fx = fixture();
        fx.record.set_selected(TargetKind::EngineDll, Vec::new());

        let mut instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);
        assert!(!instance.install());
        assert!(instance.uninstall());
    }

    #[test]
    fn test_reset_to_defaults_persists_defaults() {
        let mut fx = fixture();
        let mut instance = get_mod(&mut fx.record, ModType::Fsr, &fx.settings);
        instance.apply_overrides(&[OptionRecord::new(
            "renderScale",
            None,
            OptionValue::Float(1.5),
        )]);

        assert!(instance.reset_to_defaults());
        drop(instance);

        let stored = &fx.record.slot(ModType::Fsr).unwrap().settings;
        let scale = stored.iter().find(|r| r.key == "renderScale").unwrap();
        assert_eq!(scale.value, OptionValue::Float(0.77));
    }
}

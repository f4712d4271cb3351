use crate::mods::{ModType, TargetKind};
use crate::options::OptionRecord;
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Application records keyed by app id, in library order.
pub type AppMap = IndexMap<String, AppRecord>;

/// Per-mod state stored inside an [`AppRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModSlot {
    pub installed: bool,
    /// Release name of the installed binary; empty when not installed.
    pub version: String,
    /// Persisted option values, applied as overrides over the compiled-in defaults.
    pub settings: Vec<OptionRecord>,
}

/// One installed game as supplied by the library scan, plus everything this tool learns about it.
///
/// Field names serialize in camelCase (`openVrDllPaths`, `executablePathsSelected`, ...) to stay
/// compatible with existing app collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub id: String,
    pub name: String,
    /// Install root of the application.
    pub path: Utf8PathBuf,

    /// At least one VR runtime API DLL was found under `path`.
    #[serde(default)]
    pub open_vr: bool,

    #[serde(default)]
    pub open_vr_dll_paths: Vec<Utf8PathBuf>,
    #[serde(default)]
    pub open_vr_dll_paths_selected: Vec<Utf8PathBuf>,
    #[serde(default)]
    pub executable_paths: Vec<Utf8PathBuf>,
    #[serde(default)]
    pub executable_paths_selected: Vec<Utf8PathBuf>,

    #[serde(default)]
    pub mods: BTreeMap<ModType, ModSlot>,
}

impl AppRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            open_vr: false,
            open_vr_dll_paths: Vec::new(),
            open_vr_dll_paths_selected: Vec::new(),
            executable_paths: Vec::new(),
            executable_paths_selected: Vec::new(),
            mods: BTreeMap::new(),
        }
    }

    /// Every discovered file path of the given kind.
    pub fn discovered(&self, kind: TargetKind) -> &[Utf8PathBuf] {
        match kind {
            TargetKind::EngineDll => &self.open_vr_dll_paths,
            TargetKind::Executable => &self.executable_paths,
        }
    }

    /// The subset of discovered paths the user wants mods installed beside.
    pub fn selected(&self, kind: TargetKind) -> &[Utf8PathBuf] {
        match kind {
            TargetKind::EngineDll => &self.open_vr_dll_paths_selected,
            TargetKind::Executable => &self.executable_paths_selected,
        }
    }

    pub fn set_discovered(&mut self, kind: TargetKind, paths: Vec<Utf8PathBuf>) {
        match kind {
            TargetKind::EngineDll => self.open_vr_dll_paths = paths,
            TargetKind::Executable => self.executable_paths = paths,
        }
    }

    pub fn set_selected(&mut self, kind: TargetKind, paths: Vec<Utf8PathBuf>) {
        match kind {
            TargetKind::EngineDll => self.open_vr_dll_paths_selected = paths,
            TargetKind::Executable => self.executable_paths_selected = paths,
        }
    }

    /// Select every discovered path of `kind`.
    pub fn reset_selection(&mut self, kind: TargetKind) {
        let all = self.discovered(kind).to_vec();
        self.set_selected(kind, all);
    }

    /// Whether every selected path of `kind` is still among the discovered ones.
    pub fn selection_is_valid(&self, kind: TargetKind) -> bool {
        let discovered = self.discovered(kind);
        self.selected(kind).iter().all(|p| discovered.contains(p))
    }

    pub fn slot(&self, mod_type: ModType) -> Option<&ModSlot> {
        self.mods.get(&mod_type)
    }

    /// The slot for `mod_type`, created empty if missing.
    pub fn slot_mut(&mut self, mod_type: ModType) -> &mut ModSlot {
        self.mods.entry(mod_type).or_default()
    }

    pub fn is_installed(&self, mod_type: ModType) -> bool {
        self.slot(mod_type).is_some_and(|s| s.installed)
    }
}

use crate::options::{ModOption, defaults};
use serde::{Deserialize, Serialize};
use std::fmt;

/// VR runtime API DLL replaced by engine-replacement mods.
pub const OPEN_VR_DLL: &str = "openvr_api.dll";

/// System DLL name injector mods disguise themselves as.
pub const DXGI_DLL: &str = "dxgi.dll";

/// Config file shared by the OpenVR mods; each writes its own top-level section.
pub const OPEN_VR_MOD_CFG: &str = "openvr_mod.cfg";

pub const VRPERFKIT_CFG: &str = "vrperfkit.yml";

/// Every supported mod type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModType {
    Fsr,
    Foveated,
    Vrperfkit,
}

impl ModType {
    pub const ALL: [ModType; 3] = [ModType::Fsr, ModType::Foveated, ModType::Vrperfkit];

    pub fn descriptor(self) -> &'static ModDescriptor {
        match self {
            ModType::Fsr => &FSR,
            ModType::Foveated => &FOVEATED,
            ModType::Vrperfkit => &VRPERFKIT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModType::Fsr => "fsr",
            ModType::Foveated => "foveated",
            ModType::Vrperfkit => "vrperfkit",
        }
    }
}

impl fmt::Display for ModType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ModType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown mod type: {}", s))
    }
}

/// Which discovered target list a mod is installed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Directories containing the VR runtime API DLL.
    EngineDll,
    /// Directories containing any executable.
    Executable,
}

/// On-disk format of a mod's config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON with `//` / `#` line comments, wrapped in a single named section.
    CommentJson { section: &'static str },
    Yaml,
}

/// Static per-mod-type metadata.
#[derive(Debug)]
pub struct ModDescriptor {
    pub mod_type: ModType,
    pub display_name: &'static str,
    /// File name of the binary the mod occupies in each target directory.
    pub target_file: &'static str,
    pub target_kind: TargetKind,
    pub config_file: &'static str,
    pub format: ConfigFormat,
    /// Directory name under the data dir holding the release DLL and default config.
    pub source_dir_name: &'static str,
    /// `(version, md5 hex)` pairs for every known release.
    pub versions: &'static [(&'static str, &'static str)],
    pub defaults: fn() -> Vec<ModOption>,
}

impl ModDescriptor {
    pub fn version_for_hash(&self, hash: &str) -> Option<&'static str> {
        self.versions
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(hash))
            .map(|(version, _)| *version)
    }

    pub fn latest_version(&self) -> Option<&'static str> {
        self.versions.last().map(|(version, _)| *version)
    }
}

static FSR: ModDescriptor = ModDescriptor {
    mod_type: ModType::Fsr,
    display_name: "OpenVR FSR",
    target_file: OPEN_VR_DLL,
    target_kind: TargetKind::EngineDll,
    config_file: OPEN_VR_MOD_CFG,
    format: ConfigFormat::CommentJson { section: "fsr" },
    source_dir_name: "openvr_fsr",
    versions: &[
        ("v0.5", "d74d3083e3506d83fac0d95520625eab"),
        ("v0.6", "18c46267b042cac7c21a2059786e660c"),
        ("v0.7", "f3a0706ea3929234a73bdfde58493601"),
        ("v0.8", "68fcb526c619103e4d9775e4fba2b747"),
        ("v0.9", "ddccc71f8239bf17ead5df1db43eeedb"),
        ("v1.0", "da03ca34b51587addebd78422f4d5c39"),
        ("v1.1", "628a13f0faae439229237c3b44e5426c"),
        ("v1.2", "2d551d67a642d3edba3e8467b00667cb"),
        ("v1.3", "ea417d2480b9a285ea9f6a3e9aa703b3"),
        ("v2.0", "b173ef3e95283c47f840152786d6ebf9"),
        ("v2.1.1", "1f15031338f117ccc8d68a98f71d6b65"),
    ],
    defaults: defaults::fsr,
};

static FOVEATED: ModDescriptor = ModDescriptor {
    mod_type: ModType::Foveated,
    display_name: "OpenVR Foveated",
    target_file: OPEN_VR_DLL,
    target_kind: TargetKind::EngineDll,
    config_file: OPEN_VR_MOD_CFG,
    format: ConfigFormat::CommentJson { section: "foveated" },
    source_dir_name: "openvr_foveated",
    versions: &[
        ("v0.1", "f113aa2bbc9e13603fdc99c3944fcc48"),
        ("v0.2", "51bec8ad9c6860615a71c2449feee780"),
    ],
    defaults: defaults::foveated,
};

static VRPERFKIT: ModDescriptor = ModDescriptor {
    mod_type: ModType::Vrperfkit,
    display_name: "VRPerfKit",
    target_file: DXGI_DLL,
    target_kind: TargetKind::Executable,
    config_file: VRPERFKIT_CFG,
    format: ConfigFormat::Yaml,
    source_dir_name: "vrperfkit",
    versions: &[
        ("v0.1", "161e5a771afe5f24c99592c9d4f95c30"),
        ("v0.1.1", "0559a8e6a1fc0021f9d5fb4d1cd9cc00"),
        ("v0.1.2", "caed41dd77a7f5873f00215e67dded31"),
        ("v0.2", "017212ff2fabff1178462bf32923a6ce"),
        ("v0.2.1", "2baca682f41b5046f3245d200b4e3c02"),
        ("v0.2.2", "30531b66aa251f7ee7cfbc9b005d10b3"),
        ("v0.3.0", "8bd81654a1a8cf77e7f7a54bb137c7ac"),
    ],
    defaults: defaults::vrperfkit,
};

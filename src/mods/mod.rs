//! Mod catalogue and lifecycle.
//!
//! - [`descriptor`]: static per-mod-type metadata and the closed [`ModType`] enum
//! - [`fingerprint`]: release identification of installed binaries
//! - [`installer`]: backup/restore file operations for one target directory
//! - [`instance`]: [`ModInstance`], binding a mod type to one application record

pub mod descriptor;
pub mod fingerprint;
pub mod installer;
pub mod instance;

pub use descriptor::{
    ConfigFormat, DXGI_DLL, ModDescriptor, ModType, OPEN_VR_DLL, OPEN_VR_MOD_CFG, TargetKind,
    VRPERFKIT_CFG,
};
pub use fingerprint::{UNKNOWN_VERSION, fingerprint};
pub use installer::{InstallError, Installer};
pub use instance::{ModInstance, get_mod};

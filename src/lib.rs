// vrmodkit - OpenVR upscaling mod manager
//
// This is the library crate containing the option model, config codecs, mod lifecycle
// and the library scanner. The binary crate (main.rs) provides the command line entry point.

pub mod codec;
pub mod config;
pub mod logging;
pub mod models;
pub mod mods;
pub mod options;
pub mod services;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use models::{AppMap, AppRecord, ModSettings, ModSlot};
pub use mods::{ModInstance, ModType, get_mod};
pub use options::{OptionRecord, OptionTree, OptionValue};
pub use services::{ScanReport, Scanner};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

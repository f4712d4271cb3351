//! Data models shared by the mod lifecycle and the scanner.
//!
//! - [`AppRecord`]: one application, its discovered target paths and per-mod state
//! - [`ModSettings`]: tool-wide settings loaded from `vrmodkit.yaml`

pub mod app_record;
pub mod settings;

pub use app_record::{AppMap, AppRecord, ModSlot};
pub use settings::{ModSettings, ScannerSettings};

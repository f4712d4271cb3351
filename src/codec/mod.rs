//! Format codecs translating an [`OptionTree`] to and from a mod's on-disk config file.
//!
//! - [`JsonCodec`]: JSON with line comments, all data wrapped in one named section
//! - [`YamlCodec`]: YAML edited in place so comments and ordering survive a write
//!
//! Both codecs share one contract: `read` yields a [`StructuredMap`] that the caller applies to
//! its tree by key matching, `write` serializes the tree's structured map. A missing individual
//! key never fails a read; only an absent or unparsable file does.

pub mod json;
pub mod yaml;
mod yaml_doc;

pub use json::JsonCodec;
pub use yaml::YamlCodec;

use crate::mods::ConfigFormat;
use crate::options::{OptionTree, StructuredMap};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// Errors reading or writing a mod config file
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Config file {0} not found")]
    NotFound(Utf8PathBuf),

    #[error("Config file {0} has no '{1}' section")]
    MissingSection(Utf8PathBuf, String),

    #[error("Failed to parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CodecError {
    pub(crate) fn io(path: &Utf8Path, source: std::io::Error) -> Self {
        CodecError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Utf8Path, message: impl ToString) -> Self {
        CodecError::Parse {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Absent file or section: a valid "nothing configured here" state rather than a fault.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CodecError::NotFound(_) | CodecError::MissingSection(..)
        )
    }
}

pub trait ConfigCodec: Send + Sync {
    /// Read `file` into a nested key/value map.
    fn read(&self, file: &Utf8Path) -> Result<StructuredMap, CodecError>;

    /// Write `tree` to `file`. `template` seeds the file's structure when it does not exist yet.
    fn write(
        &self,
        tree: &OptionTree,
        file: &Utf8Path,
        template: Option<&Utf8Path>,
    ) -> Result<(), CodecError>;

    /// Remove `file`. A file that is already gone counts as success.
    fn delete(&self, file: &Utf8Path) -> Result<(), CodecError> {
        remove_if_exists(file)
    }
}

/// Pick the codec for a descriptor's config format.
pub fn codec_for(format: ConfigFormat) -> Box<dyn ConfigCodec> {
    match format {
        ConfigFormat::CommentJson { section } => Box::new(JsonCodec::new(section)),
        ConfigFormat::Yaml => Box::new(YamlCodec::new()),
    }
}

pub(crate) fn read_text(file: &Utf8Path) -> Result<String, CodecError> {
    if !file.exists() {
        return Err(CodecError::NotFound(file.to_path_buf()));
    }
    fs::read_to_string(file).map_err(|e| CodecError::io(file, e))
}

pub(crate) fn remove_if_exists(file: &Utf8Path) -> Result<(), CodecError> {
    match fs::remove_file(file) {
        Ok(()) => {
            tracing::info!("Deleted config at {}", file);
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CodecError::io(file, e)),
    }
}

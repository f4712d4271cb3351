//! File operations behind install and uninstall of a single target directory.
//!
//! Backups are made by rename, never by copy, so the original binary is either at its own name
//! or at the backup name at every point in time. Two backup naming schemes are recognised on
//! restore, checked in order:
//!
//! 1. `<stem>.orig<ext>` (`openvr_api.orig.dll`), written by every install
//! 2. `<stem>.original` (`openvr_api.original`), written by older releases of this tool

use super::ModDescriptor;
use super::fingerprint::file_hash;
use crate::codec::CodecError;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Mod release file {0} not found")]
    SourceMissing(Utf8PathBuf),

    #[error("Target directory {0} not found")]
    TargetDirMissing(Utf8PathBuf),

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to fingerprint {path}: {message}")]
    Fingerprint { path: Utf8PathBuf, message: String },

    #[error(transparent)]
    Config(#[from] CodecError),
}

fn io_err(action: &'static str, path: &Utf8Path) -> impl FnOnce(std::io::Error) -> InstallError {
    let path = path.to_path_buf();
    move |source| InstallError::Io {
        action,
        path,
        source,
    }
}

/// Backup name written by install: `<stem>.orig<ext>` beside the target.
pub fn backup_path(target: &Utf8Path) -> Utf8PathBuf {
    let stem = target.file_stem().unwrap_or_default();
    let name = match target.extension() {
        Some(ext) => format!("{}.orig.{}", stem, ext),
        None => format!("{}.orig", stem),
    };
    target.with_file_name(name)
}

/// All backup names recognised on restore, in the order they are checked.
pub fn backup_candidates(target: &Utf8Path) -> [Utf8PathBuf; 2] {
    [backup_path(target), target.with_extension("original")]
}

/// Installs one mod's release binary into target directories.
#[derive(Debug, Clone)]
pub struct Installer<'a> {
    descriptor: &'a ModDescriptor,
    source_dir: Utf8PathBuf,
}

impl<'a> Installer<'a> {
    pub fn new(descriptor: &'a ModDescriptor, source_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            descriptor,
            source_dir: source_dir.into(),
        }
    }

    pub fn source_dir(&self) -> &Utf8Path {
        &self.source_dir
    }

    /// The release DLL copied into each target.
    pub fn source_binary(&self) -> Utf8PathBuf {
        self.source_dir.join(self.descriptor.target_file)
    }

    pub fn target_binary(&self, dir: &Utf8Path) -> Utf8PathBuf {
        dir.join(self.descriptor.target_file)
    }

    /// Back up the original binary in `dir` (unless a backup already exists) and copy the
    /// release binary in its place.
    ///
    /// # Returns
    /// The path of the installed binary
    pub fn install_binary(&self, dir: &Utf8Path) -> Result<Utf8PathBuf, InstallError> {
        let source = self.source_binary();
        if !source.is_file() {
            return Err(InstallError::SourceMissing(source));
        }
        if !dir.is_dir() {
            return Err(InstallError::TargetDirMissing(dir.to_path_buf()));
        }

        let target = self.target_binary(dir);
        let has_backup = backup_candidates(&target).iter().any(|b| b.exists());

        if !has_backup && target.exists() {
            let backup = backup_path(&target);
            fs::rename(&target, &backup).map_err(io_err("back up", &target))?;
            tracing::info!("Backed up {} to {}", target, backup);
        }

        if target.exists() {
            fs::remove_file(&target).map_err(io_err("remove", &target))?;
        }

        fs::copy(&source, &target).map_err(io_err("copy release binary to", &target))?;
        tracing::info!("Installed {} into {}", self.descriptor.display_name, dir);
        Ok(target)
    }

    /// Undo [`install_binary`](Self::install_binary) in `dir`.
    ///
    /// With a backup present the installed binary is replaced by it. Without one, the target
    /// is removed only if it is this mod's own binary, so a game's original DLL is never
    /// deleted. Nothing to undo is not an error.
    pub fn restore_binary(&self, dir: &Utf8Path) -> Result<(), InstallError> {
        let target = self.target_binary(dir);
        let backups = backup_candidates(&target);

        if let Some(backup) = backups.iter().find(|b| b.exists()) {
            if target.exists() {
                fs::remove_file(&target).map_err(io_err("remove", &target))?;
            }
            fs::rename(backup, &target).map_err(io_err("restore", backup))?;
            tracing::info!("Restored original {} from {}", target, backup);

            for stale in backups.iter().filter(|b| b.exists()) {
                tracing::warn!("Leaving additional backup {} in place", stale);
            }
            return Ok(());
        }

        if target.exists() && self.is_mod_binary(&target)? {
            fs::remove_file(&target).map_err(io_err("remove", &target))?;
            tracing::info!("Removed {} (no original to restore)", target);
        }
        Ok(())
    }

    /// Whether `binary` is a release of this mod: same bytes as the source DLL or a known hash.
    fn is_mod_binary(&self, binary: &Utf8Path) -> Result<bool, InstallError> {
        let hash = |path: &Utf8Path| {
            file_hash(path).map_err(|e| InstallError::Fingerprint {
                path: path.to_path_buf(),
                message: format!("{:#}", e),
            })
        };

        let installed = hash(binary)?;
        if self.descriptor.version_for_hash(&installed).is_some() {
            return Ok(true);
        }

        let source = self.source_binary();
        Ok(source.is_file() && hash(source.as_path())? == installed)
    }
}

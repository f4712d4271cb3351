//! Concurrent discovery of mod targets across an application library.
//!
//! Applications are split into fixed-size batches. Each batch runs on tokio's blocking pool,
//! with a semaphore bounding how many batches walk the filesystem at once. Workers own clones
//! of their records and hand them back; only the drain loop in [`Scanner::scan`] writes into
//! the caller's map, so the map needs no locking.

use crate::models::{AppMap, AppRecord, ModSettings};
use crate::mods::{ModType, OPEN_VR_DLL, TargetKind, get_mod};
use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Semaphore, watch};
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// Progress published while a scan runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanProgress {
    /// Applications finished so far, scanned or skipped.
    pub scanned: usize,
    pub total: usize,
    /// Install root of the application being scanned.
    pub current_path: Option<Utf8PathBuf>,
}

impl fmt::Display for ScanProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.scanned, self.total)
    }
}

/// Outcome of a full scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub scanned: usize,
    /// Applications whose install path was missing or unreadable.
    pub skipped: usize,
    /// Batches whose worker panicked; their records are left as they were.
    pub failed_batches: usize,
}

/// Per-application scan step run by the workers.
type ScanFn = fn(&mut AppRecord, &ModSettings) -> Result<()>;

/// Target files found under one install root.
#[derive(Debug, Default)]
struct Discovered {
    open_vr_dlls: Vec<Utf8PathBuf>,
    executables: Vec<Utf8PathBuf>,
}

#[derive(Debug, Default)]
struct BatchResult {
    scanned: Vec<AppRecord>,
    skipped: Vec<String>,
}

pub struct Scanner {
    settings: Arc<ModSettings>,
    progress: Arc<watch::Sender<ScanProgress>>,
}

impl Scanner {
    pub fn new(settings: Arc<ModSettings>) -> Self {
        let (progress, _) = watch::channel(ScanProgress::default());
        Self {
            settings,
            progress: Arc::new(progress),
        }
    }

    /// Receiver for progress updates of this scanner's scans.
    pub fn subscribe(&self) -> watch::Receiver<ScanProgress> {
        self.progress.subscribe()
    }

    /// Rediscover target paths and mod state for every application in `apps`.
    ///
    /// Never fails as a whole: applications with a missing install path are skipped, and a
    /// batch whose worker panics is logged and dropped.
    pub async fn scan(&self, apps: &mut AppMap) -> ScanReport {
        self.scan_with(apps, scan_app).await
    }

    pub(crate) async fn scan_with(&self, apps: &mut AppMap, scan_fn: ScanFn) -> ScanReport {
        let chunk_size = self.settings.scanner.chunk_size.max(1);
        let workers = self.settings.scanner.worker_count();
        let ids: Vec<String> = apps.keys().cloned().collect();

        tracing::debug!(
            "Using {} workers to scan {} apps in {} batches",
            workers,
            ids.len(),
            ids.len().div_ceil(chunk_size)
        );
        self.progress.send_replace(ScanProgress {
            scanned: 0,
            total: ids.len(),
            current_path: None,
        });

        let semaphore = Arc::new(Semaphore::new(workers));
        let mut batches = JoinSet::new();

        for chunk in ids.chunks(chunk_size) {
            let batch: Vec<AppRecord> =
                chunk.iter().filter_map(|id| apps.get(id).cloned()).collect();
            let settings = Arc::clone(&self.settings);
            let progress = Arc::clone(&self.progress);
            let semaphore = Arc::clone(&semaphore);

            batches.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                tokio::task::spawn_blocking(move || {
                    scan_batch(batch, &settings, &progress, scan_fn)
                })
                .await
            });
        }

        let mut report = ScanReport::default();
        while let Some(joined) = batches.join_next().await {
            match joined {
                Ok(Ok(batch)) => {
                    for id in batch.skipped {
                        if let Some(record) = apps.get_mut(&id) {
                            record.open_vr = false;
                        }
                        report.skipped += 1;
                    }
                    for record in batch.scanned {
                        apps.insert(record.id.clone(), record);
                        report.scanned += 1;
                    }
                }
                Ok(Err(e)) | Err(e) => {
                    tracing::error!("Scan batch failed, dropping its results: {}", e);
                    report.failed_batches += 1;
                }
            }
        }

        tracing::info!(
            "Scan finished: {} scanned, {} skipped, {} failed batches",
            report.scanned,
            report.skipped,
            report.failed_batches
        );
        report
    }
}

fn scan_batch(
    batch: Vec<AppRecord>,
    settings: &ModSettings,
    progress: &watch::Sender<ScanProgress>,
    scan_fn: ScanFn,
) -> BatchResult {
    let mut result = BatchResult::default();

    for mut record in batch {
        progress.send_modify(|p| p.current_path = Some(record.path.clone()));
        let outcome = scan_fn(&mut record, settings);
        progress.send_modify(|p| p.scanned += 1);

        match outcome {
            Ok(()) => result.scanned.push(record),
            Err(e) => {
                tracing::error!("Skipping {}: {:#}", record.name, e);
                result.skipped.push(record.id);
            }
        }
    }

    result
}

/// Refresh one record's discovered targets and the state of every mod.
pub fn scan_app(record: &mut AppRecord, settings: &ModSettings) -> Result<()> {
    record.open_vr = false;
    if !record.path.is_dir() {
        bail!("install path {} does not exist", record.path);
    }

    let found = discover(&record.path)
        .with_context(|| format!("Failed to search {}", record.path))?;
    let has_targets = !found.open_vr_dlls.is_empty() || !found.executables.is_empty();

    record.open_vr = !found.open_vr_dlls.is_empty();
    record.set_discovered(TargetKind::EngineDll, found.open_vr_dlls);
    record.set_discovered(TargetKind::Executable, found.executables);
    record.reset_selection(TargetKind::EngineDll);
    record.reset_selection(TargetKind::Executable);

    if has_targets {
        for mod_type in ModType::ALL {
            let mut instance = get_mod(record, mod_type, settings);
            instance.update_from_disk();
            if !instance.errors().is_empty() {
                tracing::warn!(
                    "{} state of {} is inconsistent: {}",
                    mod_type,
                    instance.record().name,
                    instance.error()
                );
            }
        }
    }

    Ok(())
}

/// Walk `root` for VR runtime API DLLs and executables. File names match case-insensitively.
fn discover(root: &Utf8Path) -> Result<Discovered> {
    let mut found = Discovered::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e).context("Install root is not readable"),
            Err(e) => {
                tracing::debug!("Skipping unreadable entry under {}: {}", root, e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(path) = Utf8PathBuf::from_path_buf(entry.into_path()) else {
            tracing::debug!("Skipping non UTF-8 path under {}", root);
            continue;
        };
        let Some(name) = path.file_name() else {
            continue;
        };

        if name.eq_ignore_ascii_case(OPEN_VR_DLL) {
            found.open_vr_dlls.push(path);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"))
        {
            found.executables.push(path);
        }
    }

    Ok(found)
}

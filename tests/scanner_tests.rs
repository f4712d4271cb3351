//! Integration tests for the concurrent library scanner
//!
//! These tests verify:
//! - Every record is scanned or skipped, and a missing install path never aborts its batch
//! - Discovered target paths and selections are refreshed from disk
//! - Installed mods are rediscovered during a scan
//! - Progress is published for every application

use camino::Utf8PathBuf;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use vrmodkit::mods::{ModType, TargetKind, get_mod};
use vrmodkit::{AppMap, AppRecord, ModSettings, ScanReport, Scanner};

fn temp_root() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, root)
}

/// `count` games under `root`; the game at index `missing` has no install directory.
fn library(root: &Utf8PathBuf, count: usize, missing: usize) -> AppMap {
    let mut apps = AppMap::new();
    for i in 0..count {
        let path = root.join("games").join(format!("game{}", i));
        if i != missing {
            let bin = path.join("bin");
            fs::create_dir_all(&bin).unwrap();
            fs::write(bin.join("openvr_api.dll"), b"runtime").unwrap();
            fs::write(path.join(format!("game{}.exe", i)), b"MZ").unwrap();
        }
        let record = AppRecord::new(format!("{}", 1000 + i), format!("Game {}", i), path);
        apps.insert(record.id.clone(), record);
    }
    apps
}

fn small_batches(data_dir: Utf8PathBuf) -> ModSettings {
    let mut settings = ModSettings {
        data_dir,
        ..ModSettings::default()
    };
    settings.scanner.chunk_size = 4;
    settings.scanner.min_workers = 2;
    settings.scanner.max_workers = 3;
    settings
}

#[tokio::test]
async fn test_scan_skips_missing_install_path() {
    let (_temp_dir, root) = temp_root();
    let mut apps = library(&root, 50, 17);
    apps.get_mut("1017").unwrap().open_vr = true;

    let scanner = Scanner::new(Arc::new(small_batches(root.join("data"))));
    let report = scanner.scan(&mut apps).await;

    assert_eq!(report.scanned, 49);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed_batches, 0);
    assert_eq!(apps.len(), 50);

    let missing = &apps["1017"];
    assert!(!missing.open_vr);
    assert!(missing.open_vr_dll_paths.is_empty());

    for (id, record) in apps.iter().filter(|(id, _)| id.as_str() != "1017") {
        assert!(record.open_vr, "{} should have an OpenVR DLL", id);
        assert_eq!(record.discovered(TargetKind::EngineDll).len(), 1);
        assert_eq!(record.discovered(TargetKind::Executable).len(), 1);
        assert!(record.selection_is_valid(TargetKind::Executable));
        assert!(!record.is_installed(ModType::Fsr));
    }
}

#[tokio::test]
async fn test_scan_reports_progress() {
    let (_temp_dir, root) = temp_root();
    let mut apps = library(&root, 10, usize::MAX);

    let scanner = Scanner::new(Arc::new(small_batches(root.join("data"))));
    let progress = scanner.subscribe();
    scanner.scan(&mut apps).await;

    let last = progress.borrow().clone();
    assert_eq!(last.scanned, 10);
    assert_eq!(last.total, 10);
    assert!(last.current_path.is_some());
    assert_eq!(last.to_string(), "10 / 10");
}

#[tokio::test]
async fn test_scan_resets_stale_selection_and_finds_installed_mod() {
    let (_temp_dir, root) = temp_root();
    let data = root.join("data").join("openvr_fsr");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("openvr_api.dll"), vec![3u8; 80]).unwrap();
    let settings = small_batches(root.join("data"));

    let mut apps = library(&root, 3, usize::MAX);
    let record = apps.get_mut("1001").unwrap();
    let dll = record.path.join("bin").join("openvr_api.dll");
    record.set_discovered(TargetKind::EngineDll, vec![dll]);
    record.reset_selection(TargetKind::EngineDll);
    let mut fsr = get_mod(record, ModType::Fsr, &settings);
    assert!(fsr.install(), "{}", fsr.error());
    drop(fsr);

    // Forget the install and point the selection at a path that no longer exists.
    *record.slot_mut(ModType::Fsr) = Default::default();
    record.set_selected(TargetKind::EngineDll, vec!["/old/place/openvr_api.dll".into()]);

    let scanner = Scanner::new(Arc::new(settings));
    let report = scanner.scan(&mut apps).await;
    assert_eq!(report.scanned, 3);

    let record = &apps["1001"];
    assert!(record.selection_is_valid(TargetKind::EngineDll));
    assert!(record.is_installed(ModType::Fsr));
    assert!(!record.is_installed(ModType::Vrperfkit));
    assert!(!apps["1000"].is_installed(ModType::Fsr));
}

#[tokio::test]
async fn test_scan_empty_collection() {
    let scanner = Scanner::new(Arc::new(ModSettings::default()));
    let mut apps = AppMap::new();

    assert_eq!(scanner.scan(&mut apps).await, ScanReport::default());
}

//! vrmodkit - OpenVR upscaling mod manager
//!
//! Main entry point for the command line application.
//!
//! # Overview
//!
//! This binary crate drives the library over an application collection stored as JSON.
//! It initializes:
//! - Logging infrastructure (file rotation + optional stderr output)
//! - Tokio async runtime for the library scanner
//! - Configuration loading ([`ConfigManager`])
//!
//! # Commands
//!
//! - `scan <apps.json>`: rediscover targets and mod state for every application
//! - `status <apps.json>`: print the stored state of every application
//! - `toggle <apps.json> <app-id> <mod>`: install or uninstall one mod
//! - `reset <apps.json> <app-id> <mod>`: restore a mod's default settings
//!
//! Every command that changes state writes the collection back to the same file.

use anyhow::{Context, Result, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use vrmodkit::config::{load_app_collection, save_app_collection};
use vrmodkit::{APP_NAME, AppMap, ConfigManager, ModSettings, ModType, Scanner, VERSION, get_mod};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding vrmodkit.yaml and the logs directory
    #[arg(long, default_value = ".")]
    config_dir: Utf8PathBuf,

    /// Log at debug level regardless of the settings file
    #[arg(long)]
    debug: bool,

    /// Mirror log output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan every application for mod targets and installed mods
    Scan {
        /// The application collection file
        apps: Utf8PathBuf,
    },
    /// Show the stored mod state of every application
    Status {
        /// The application collection file
        apps: Utf8PathBuf,
    },
    /// Install a mod if it is not installed, otherwise uninstall it
    Toggle {
        /// The application collection file
        apps: Utf8PathBuf,
        /// Id of the application to change
        app_id: String,
        /// One of fsr, foveated, vrperfkit
        mod_type: ModType,
    },
    /// Restore a mod's default settings and rewrite its config where installed
    Reset {
        /// The application collection file
        apps: Utf8PathBuf,
        /// Id of the application to change
        app_id: String,
        /// One of fsr, foveated, vrperfkit
        mod_type: ModType,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_manager = ConfigManager::new(&args.config_dir)?;
    let settings = config_manager.load_settings()?;

    let _guard = vrmodkit::logging::setup_logging_with_console(
        &args.config_dir.join("logs"),
        APP_NAME,
        args.debug || settings.debug_mode,
        args.verbose,
    )?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    match args.command {
        Commands::Scan { apps } => scan(&apps, settings),
        Commands::Status { apps } => {
            status(&load_app_collection(&apps)?);
            Ok(())
        }
        Commands::Toggle {
            apps,
            app_id,
            mod_type,
        } => change_mod(&apps, &app_id, mod_type, &settings, ModChange::Toggle),
        Commands::Reset {
            apps,
            app_id,
            mod_type,
        } => change_mod(&apps, &app_id, mod_type, &settings, ModChange::Reset),
    }
}

fn scan(apps_path: &Utf8Path, settings: ModSettings) -> Result<()> {
    let mut apps = load_app_collection(apps_path)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("vrmodkit-worker")
        .build()
        .context("Failed to create tokio runtime")?;

    let scanner = Scanner::new(Arc::new(settings));
    let report = runtime.block_on(scanner.scan(&mut apps));

    save_app_collection(apps_path, &apps)?;
    status(&apps);
    println!(
        "Scanned {} applications, skipped {}",
        report.scanned, report.skipped
    );

    if report.failed_batches > 0 {
        bail!("{} scan batches failed, see the log for details", report.failed_batches);
    }
    Ok(())
}

fn status(apps: &AppMap) {
    for record in apps.values() {
        let mods: Vec<String> = ModType::ALL
            .into_iter()
            .filter_map(|t| {
                let slot = record.slot(t)?;
                slot.installed.then(|| format!("{} {}", t, slot.version))
            })
            .collect();

        println!(
            "{:<12} {:<32} openvr={:<5} {}",
            record.id,
            record.name,
            record.open_vr,
            if mods.is_empty() {
                "-".to_string()
            } else {
                mods.join(", ")
            }
        );
    }
}

enum ModChange {
    Toggle,
    Reset,
}

fn change_mod(
    apps_path: &Utf8Path,
    app_id: &str,
    mod_type: ModType,
    settings: &ModSettings,
    change: ModChange,
) -> Result<()> {
    let mut apps = load_app_collection(apps_path)?;
    let Some(record) = apps.get_mut(app_id) else {
        bail!("No application with id {} in {}", app_id, apps_path);
    };

    let mut instance = get_mod(record, mod_type, settings);
    let ok = match change {
        ModChange::Toggle => instance.toggle_install(),
        ModChange::Reset => {
            let installed = instance.record().is_installed(mod_type);
            instance.reset_to_defaults() && (!installed || instance.write_updated_config())
        }
    };
    let error = instance.error();
    let installed = instance.record().is_installed(mod_type);
    drop(instance);

    save_app_collection(apps_path, &apps)?;

    if !ok {
        bail!("{} on {} failed: {}", mod_type, app_id, error);
    }
    println!(
        "{} on {} is {}",
        mod_type,
        app_id,
        if installed { "installed" } else { "not installed" }
    );
    Ok(())
}

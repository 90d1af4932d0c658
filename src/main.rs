//! BethVFS - Load-order-aware virtual file system for Bethesda game data
//!
//! Main entry point for the load-order report CLI.
//!
//! # Overview
//!
//! The report tool answers "which archives will load, and in what order"
//! for a given installation without opening a single archive: it reads the
//! plugin load order, seeds from the game INI `[Archive]` fields, applies
//! the plugin prefix heuristic and prints the resolved priority list plus
//! any orphaned archives. Archive content enumeration needs an external
//! decoder and is the host application's job.
//!
//! # Execution Flow
//!
//! 1. Initialize logging → logs/bethvfs_<date>.log (+ console)
//! 2. Read the plugin load order (fatal if unreadable)
//! 3. Resolve archive priority from INI fields + plugin discovery
//! 4. Print the report; orphaned archives are flagged
//!
//! Fatal errors terminate with a non-zero exit code and an explanatory
//! message; everything recoverable is a logged warning.

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

use bethvfs::models::{GameProfile, GameType};
use bethvfs::services::{list_archives_in_dir, read_load_order, resolve_archive_priority};
use bethvfs::{APP_NAME, VERSION};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GameArg {
    SkyrimSe,
    SkyrimVr,
    SkyrimLe,
}

impl From<GameArg> for GameType {
    fn from(arg: GameArg) -> Self {
        match arg {
            GameArg::SkyrimSe => GameType::SkyrimSe,
            GameArg::SkyrimVr => GameType::SkyrimVr,
            GameArg::SkyrimLe => GameType::SkyrimLe,
        }
    }
}

/// Archive load-order report for Bethesda game data
#[derive(Parser, Debug)]
#[command(name = "bethvfs", version)]
struct Args {
    /// Game data directory containing archives and loose files
    #[arg(long)]
    data_dir: Utf8PathBuf,

    /// Plugin load-order file (loadorder.txt)
    #[arg(long)]
    load_order: Utf8PathBuf,

    /// Game INI file, lowest precedence first; repeat for the custom INI
    #[arg(long = "ini")]
    ini_paths: Vec<Utf8PathBuf>,

    /// Game edition
    #[arg(long, value_enum, default_value = "skyrim-se")]
    game: GameArg,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = bethvfs::logging::setup_logging("logs", "bethvfs", args.debug, true)?;

    tracing::info!("Starting {} v{}", APP_NAME, VERSION);

    let profile = GameProfile::new(
        args.game.into(),
        args.data_dir,
        args.load_order,
        args.ini_paths,
    );

    let load_order = read_load_order(&profile.load_order_path, true)
        .context("Failed to read plugin load order")?;

    println!("{} ({})", profile.game.label(), profile.data_dir);
    println!();
    println!("Plugins ({}):", load_order.len());
    for plugin in &load_order {
        println!("  {}", plugin);
    }

    let archives = resolve_archive_priority(&profile, &load_order);

    println!();
    println!("Archive load order ({}, lowest priority first):", archives.len());
    for archive in &archives {
        let marker = if archive.path.exists() { "" } else { "  [missing on disk]" };
        println!("  {}{}", archive.name, marker);
    }

    let orphans: Vec<String> = list_archives_in_dir(&profile.data_dir)
        .into_iter()
        .filter(|name| !archives.iter().any(|a| &a.name == name))
        .collect();

    if !orphans.is_empty() {
        println!();
        println!("Orphaned archives (present on disk, loaded by nothing):");
        for orphan in &orphans {
            println!("  {}", orphan);
        }
    }

    tracing::info!(
        "Report complete: {} plugins, {} archives, {} orphans",
        load_order.len(),
        archives.len(),
        orphans.len()
    );

    Ok(())
}

//! Headless timeslip runner.
//!
//! This binary drives the emulator core from the command line. It performs:
//! 1. **Run:** Load a cartridge file, tick a number of frames, print statistics.
//! 2. **Resume:** Restore the last session (latest savestate or last cartridge) and keep running.
//! 3. **Library:** Add, list and remove stored cartridges.
//! 4. **Export / wipe:** Write the latest savestate to a `.sav` file, or delete all saves.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{fs, process};
use tracing_subscriber::EnvFilter;

use timeslip_core::Emulator;
use timeslip_core::config::Config;
use timeslip_core::sim::{loader, machine};
use timeslip_core::storage::{DirStore, PersistentStore};

#[derive(Parser, Debug)]
#[command(
    name = "timeslip",
    author,
    version,
    about = "Handheld emulator front-end with rewind and persistent savestates",
    long_about = "Run cartridges headless, resume previous sessions and manage the ROM library.\n\nExamples:\n  timeslip run game.gba --frames 600 --speed 4\n  timeslip resume --frames 120\n  timeslip library list\n  timeslip export --out backup.sav"
)]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the ROM library and savestates.
    #[arg(short, long, global = true, default_value = ".timeslip")]
    data: PathBuf,

    /// Print the reference engine registers after running.
    #[arg(long, global = true)]
    dump_regs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a cartridge file and run it.
    Run {
        /// Cartridge image.
        rom: PathBuf,

        /// Frames to run before pausing.
        #[arg(short, long, default_value_t = 600)]
        frames: u64,

        /// Speed multiplier (1, 2, 4 or 8).
        #[arg(short, long, default_value_t = 1)]
        speed: u32,
    },

    /// Resume the last session and run it.
    Resume {
        /// Frames to run before pausing.
        #[arg(short, long, default_value_t = 600)]
        frames: u64,
    },

    /// Manage stored cartridges.
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Write the latest savestate to a file.
    Export {
        /// Output path; defaults to `<cartridge>.sav` in the current directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Delete every savestate and the last-cartridge pointer.
    Wipe,
}

#[derive(Subcommand, Debug)]
enum LibraryAction {
    /// Store a cartridge image.
    Add {
        /// Cartridge image.
        rom: PathBuf,
    },
    /// List stored cartridges, newest first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Remove a stored cartridge.
    Remove {
        /// Library id (`rom_<ms>_<seq>`).
        id: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());
    let mut emu = open_emulator(&config, &cli.data);

    match cli.command {
        Commands::Run { rom, frames, speed } => {
            cmd_run(&mut emu, &rom, frames, speed);
            finish(&emu, cli.dump_regs);
        }
        Commands::Resume { frames } => {
            cmd_resume(&mut emu, frames);
            finish(&emu, cli.dump_regs);
        }
        Commands::Library { action } => cmd_library(&emu, action),
        Commands::Export { out } => cmd_export(&emu, out),
        Commands::Wipe => match emu.clear_all_data() {
            Ok(deleted) => println!("[*] Deleted {deleted} savestates"),
            Err(e) => fatal(&format!("wipe failed: {e}")),
        },
    }
}

fn fatal(message: &str) -> ! {
    eprintln!("\n[!] FATAL: {message}");
    process::exit(1);
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => Config::from_file(p).unwrap_or_else(|e| fatal(&e.to_string())),
        None => Config::default(),
    }
}

fn open_emulator(config: &Config, data: &Path) -> Emulator {
    let store: Arc<dyn PersistentStore> = match DirStore::open(data) {
        Ok(store) => Arc::new(store),
        Err(e) => fatal(&format!("cannot open data directory {}: {e}", data.display())),
    };
    let mut emu = Emulator::new(config, store).unwrap_or_else(|e| fatal(&e.to_string()));
    emu.set_status_sink(Box::new(|event| println!("[*] {event}")));
    emu
}

/// Adds the cartridge to the library, loads it and runs `frames` ticks.
fn cmd_run(emu: &mut Emulator, rom: &Path, frames: u64, speed: u32) {
    let bytes = loader::load_binary(rom).unwrap_or_else(|e| fatal(&format!("{}: {e}", rom.display())));
    let name = loader::cartridge_meta(rom).name;
    let id = emu
        .library()
        .find_or_add(&name, &bytes)
        .unwrap_or_else(|e| fatal(&e.to_string()));
    if let Err(e) = emu.set_speed(speed) {
        fatal(&e.to_string());
    }
    if let Err(e) = emu.load_from_library(&id) {
        fatal(&e.to_string());
    }
    drive(emu, frames);
}

fn cmd_resume(emu: &mut Emulator, frames: u64) {
    match emu.restore_last_session() {
        Ok(Some(_)) => drive(emu, frames),
        Ok(None) => process::exit(1),
        Err(e) => fatal(&e.to_string()),
    }
}

fn drive(emu: &mut Emulator, frames: u64) {
    if let Err(e) = emu.start() {
        fatal(&e.to_string());
    }
    let ran = emu.run(frames);
    emu.pause();
    emu.rewind_store().flush();
    println!("[*] Ran {ran} frames");
}

fn finish(emu: &Emulator, dump_regs: bool) {
    emu.scheduler().stats().print();
    if dump_regs {
        eprintln!();
        machine::lock(emu.machine()).reference().registers().dump();
    }
}

fn cmd_library(emu: &Emulator, action: LibraryAction) {
    let library = emu.library();
    match action {
        LibraryAction::Add { rom } => {
            let bytes = loader::load_binary(&rom).unwrap_or_else(|e| fatal(&e.to_string()));
            let name = loader::cartridge_meta(&rom).name;
            match library.add(&name, &bytes) {
                Ok(id) => println!("{id}"),
                Err(e) => fatal(&e.to_string()),
            }
        }
        LibraryAction::List { json } => {
            let records = library.list().unwrap_or_else(|e| fatal(&e.to_string()));
            if json {
                let rows: Vec<_> = records
                    .iter()
                    .map(|r| serde_json::json!({ "id": r.key, "meta": r.meta }))
                    .collect();
                match serde_json::to_string_pretty(&rows) {
                    Ok(text) => println!("{text}"),
                    Err(e) => fatal(&e.to_string()),
                }
                return;
            }
            for record in &records {
                let name = record.meta.get("name").map_or("?", String::as_str);
                println!("{:<28} {:>10} B  {}", record.key, record.data.len(), name);
            }
        }
        LibraryAction::Remove { id } => {
            if let Err(e) = library.remove(&id) {
                fatal(&e.to_string());
            }
            println!("[*] Removed {id}");
        }
    }
}

fn cmd_export(emu: &Emulator, out: Option<PathBuf>) {
    let Some(artifact) = emu.export_current() else {
        eprintln!("[!] No save available");
        process::exit(1);
    };
    let path = out.unwrap_or_else(|| PathBuf::from(&artifact.filename));
    if let Err(e) = fs::write(&path, &artifact.bytes) {
        fatal(&format!("{}: {e}", path.display()));
    }
    println!("[*] Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
}

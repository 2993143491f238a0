//! # engine_pack
//!
//! Writes and inspects packed world snapshots.
//!
//! ```text
//! engine_pack demo --out world.pack --delta
//! engine_pack inspect world.pack
//! ```
//!
//! `demo` builds a small world from the stock components, packs it and reads
//! the result back into a fresh world as a check. `inspect` prints a snapshot
//! as JSON.

mod demo;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use engine_persist::{
    AllowAll, EncodeMode, FieldCheck, PersistedOnly, ReplicatedFields, ReplicatedOnly,
    WorldSnapshot,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "engine_pack", about = "Write and inspect packed world snapshots")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a demo world and write it as a snapshot
    Demo {
        /// Output file
        #[arg(short, long, default_value = "world.pack")]
        out: PathBuf,

        /// Store prefab-derived entities as differences from their prefab
        #[arg(long)]
        delta: bool,

        /// Keep only replicated components and fields
        #[arg(long)]
        replicated_only: bool,

        /// Number of prefab instances to spawn
        #[arg(short, long, default_value_t = 5)]
        count: usize,
    },

    /// Print a snapshot as JSON
    Inspect {
        /// Snapshot file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    match Args::parse().command {
        Command::Demo {
            out,
            delta,
            replicated_only,
            count,
        } => run_demo(&out, delta, replicated_only, count),
        Command::Inspect { path } => run_inspect(&path),
    }
}

fn run_demo(out: &Path, delta: bool, replicated_only: bool, count: usize) -> Result<()> {
    let library = demo::library()?;
    let mut serializer = demo::serializer(library.clone());
    let entities = demo::populate(serializer.entity_manager_mut(), count);

    let field_check: &dyn FieldCheck = if replicated_only {
        serializer.set_component_check(ReplicatedOnly);
        &ReplicatedFields
    } else {
        serializer.set_component_check(PersistedOnly);
        &AllowAll
    };
    let mode = if delta {
        EncodeMode::Delta
    } else {
        EncodeMode::Full
    };

    let snapshot = WorldSnapshot::capture(&serializer, entities, mode, field_check)?;
    let bytes = snapshot.to_bytes()?;
    std::fs::write(out, &bytes).with_context(|| format!("writing {}", out.display()))?;
    info!(
        path = %out.display(),
        bytes = bytes.len(),
        ?mode,
        replicated_only,
        "snapshot written"
    );

    // Read it back into an empty world with the same prefabs.
    let mut check = demo::serializer(library);
    let restored = WorldSnapshot::from_bytes(&bytes)?.restore(&mut check)?;
    ensure!(
        restored.len() == snapshot.entities.len(),
        "restored {} of {} entities",
        restored.len(),
        snapshot.entities.len()
    );
    info!(entities = restored.len(), "snapshot verified");
    Ok(())
}

fn run_inspect(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let snapshot = WorldSnapshot::from_bytes(&bytes)
        .with_context(|| format!("{} is not a packed snapshot", path.display()))?;
    info!(
        path = %path.display(),
        entities = snapshot.entities.len(),
        components = snapshot.id_mapping.len(),
        "snapshot loaded"
    );
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

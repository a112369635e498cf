//! # zonekit - Lighting Zone Editor
//!
//! Command-line shell over the zonekit draft engine and the local JSON store.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a space and a zone
//! cargo run -- create living
//! cargo run -- add-zone living sensor.sofa
//!
//! # Add a neighbor row and look at the result
//! cargo run -- add-pair living sensor.sofa sensor.hall --far sensor.door --group light.hall
//! cargo run -- show living
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zonekit_core::model::{PairColumn, ZoneDraft, ZoneField};
use zonekit_core::validation::describe;
use zonekit_core::{
    AreaFilter, Config, CoreError, DraftCommand, DraftError, SaveStatus, SpaceDraftStore,
    SyncController, ValidationErrorIndex,
};
use zonekit_local::LocalService;

/// zonekit - edit lighting zone neighbor configurations
#[derive(Parser, Debug)]
#[command(name = "zonekit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Store file (defaults to the configured path)
    #[arg(short, long, value_name = "FILE", global = true)]
    store: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// List spaces
    Spaces,

    /// Show the zones of a space
    Show {
        space: String,
        /// Print the stored JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create an empty space
    Create { space: String },

    /// Delete a space
    Delete { space: String },

    /// Add an empty zone
    AddZone { space: String, zone: String },

    /// Change a zone's key
    RenameZone {
        space: String,
        from: String,
        to: String,
    },

    /// Remove a zone
    RemoveZone { space: String, zone: String },

    /// Add a neighbor row to a zone
    AddPair {
        space: String,
        zone: String,
        neighbor: String,
        /// Far neighbor of the row
        #[arg(long, default_value = "")]
        far: String,
        /// Neighbor light group of the row
        #[arg(long, default_value = "")]
        group: String,
        /// Row position (defaults to the end)
        #[arg(long)]
        at: Option<usize>,
    },

    /// Move a neighbor row
    MovePair {
        space: String,
        zone: String,
        from: usize,
        to: usize,
    },

    /// Remove a neighbor row
    RemovePair {
        space: String,
        zone: String,
        index: usize,
    },

    /// Replace a zone's own light group
    SetLight {
        space: String,
        zone: String,
        lights: Vec<String>,
    },

    /// List areas
    Areas,

    /// List selectable sensors and lights
    Entities {
        /// Restrict to one area id
        #[arg(long)]
        area: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting zonekit v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load(),
    };

    if args.command == Command::Config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let store = args.store.unwrap_or_else(|| config.store.path.clone());
    let service = LocalService::open(&store)
        .await
        .with_context(|| format!("Failed to open store {}", store.display()))?;

    let mut controller = SyncController::new(Arc::new(service))
        .with_domains(config.catalog.domains.clone())
        .with_default_filter(config.catalog.default_filter());

    let ok = run(&mut controller, &config, args.command).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs one subcommand. Returns false if errors were printed.
async fn run(
    controller: &mut SyncController,
    config: &Config,
    command: Command,
) -> anyhow::Result<bool> {
    match command {
        Command::Spaces => {
            if let Err(e) = controller.reload_spaces().await {
                return Ok(fail(&e));
            }
            for space in controller.spaces() {
                println!("{} ({} zones)", space.name, space.zones_count);
            }
            Ok(true)
        }

        Command::Show { space, json } => {
            if let Err(e) = controller.load_space(space).await {
                return Ok(fail(&e));
            }
            if let Some(draft) = controller.draft() {
                if json {
                    println!("{}", draft.snapshot().to_json_pretty()?);
                } else {
                    print_draft(draft);
                }
            }
            Ok(true)
        }

        Command::Create { space } => match controller.create_space(&space).await {
            Ok(_) => {
                println!("created {}", space.trim());
                Ok(true)
            }
            Err(e) => Ok(fail(&e)),
        },

        Command::Delete { space } => match controller.delete_space(&space).await {
            Ok(()) => {
                println!("deleted {space}");
                Ok(true)
            }
            Err(e) => Ok(fail(&e)),
        },

        Command::AddZone { space, zone } => {
            let add = DraftCommand::AddZone { key: zone };
            edit(controller, config, &space, |_| Ok(vec![add])).await
        }

        Command::RenameZone { space, from, to } => {
            let rename = DraftCommand::RenameZone { from, to };
            edit(controller, config, &space, |_| Ok(vec![rename])).await
        }

        Command::RemoveZone { space, zone } => {
            edit(controller, config, &space, |draft| {
                require_zone(draft, &zone)?;
                Ok(vec![DraftCommand::RemoveZone { key: zone }])
            })
            .await
        }

        Command::AddPair {
            space,
            zone,
            neighbor,
            far,
            group,
            at,
        } => {
            edit(controller, config, &space, |draft| {
                let len = require_zone(draft, &zone)?.pairs().len();
                let index = at.map_or(len, |at| at.min(len));
                let cell = |column, value| DraftCommand::SetPairValue {
                    zone: zone.clone(),
                    index,
                    column,
                    value,
                };
                Ok(vec![
                    DraftCommand::InsertPair {
                        zone: zone.clone(),
                        at: Some(index),
                    },
                    cell(PairColumn::Neighbors, neighbor),
                    cell(PairColumn::FarNeighbors, far),
                    cell(PairColumn::NeighborGroups, group),
                ])
            })
            .await
        }

        Command::MovePair { space, zone, from, to } => {
            edit(controller, config, &space, |draft| {
                require_zone(draft, &zone)?;
                Ok(vec![DraftCommand::MovePair { zone, from, to }])
            })
            .await
        }

        Command::RemovePair { space, zone, index } => {
            edit(controller, config, &space, |draft| {
                require_zone(draft, &zone)?;
                Ok(vec![DraftCommand::RemovePair { zone, index }])
            })
            .await
        }

        Command::SetLight {
            space,
            zone,
            mut lights,
        } => {
            let limit = config.editor.light_group_limit;
            if limit > 0 && lights.len() > limit {
                eprintln!("warning: keeping the first {limit} of {} lights", lights.len());
                lights.truncate(limit);
            }
            edit(controller, config, &space, |draft| {
                require_zone(draft, &zone)?;
                Ok(vec![DraftCommand::SetField {
                    zone,
                    field: ZoneField::LightGroup,
                    values: lights,
                }])
            })
            .await
        }

        Command::Areas => {
            if let Err(e) = controller.reload_areas().await {
                return Ok(fail(&e));
            }
            for area in controller.areas() {
                println!("{}\t{}", area.id, area.name);
            }
            Ok(true)
        }

        Command::Entities { area } => {
            let filter = AreaFilter::from_id(area.as_deref().unwrap_or_default());
            if let Err(e) = controller.set_area_filter(filter).await {
                return Ok(fail(&e));
            }
            let catalog = controller.catalog();
            for id in catalog.sensors().iter().chain(catalog.lights()) {
                println!("{id}");
            }
            Ok(true)
        }

        Command::Config => Ok(true),
    }
}

/// Loads `space`, applies the commands built from it, and saves.
async fn edit<F>(
    controller: &mut SyncController,
    config: &Config,
    space: &str,
    build: F,
) -> anyhow::Result<bool>
where
    F: FnOnce(&SpaceDraftStore) -> Result<Vec<DraftCommand>, DraftError>,
{
    if let Err(e) = controller.load_space(space).await {
        return Ok(fail(&e));
    }

    let commands = match controller.draft().map(build) {
        Some(Ok(commands)) => commands,
        Some(Err(e)) => return Ok(fail(&e.into())),
        None => return Ok(fail(&CoreError::NoSpaceSelected)),
    };
    for command in commands {
        if let Err(e) = controller.apply(command) {
            return Ok(fail(&e));
        }
    }

    if config.editor.warn_on_truncate {
        if let Some(report) = controller.preview_normalization().filter(|r| r.lost_data()) {
            eprintln!(
                "warning: {} value(s) past the end of the neighbor list will be dropped",
                report.dropped
            );
        }
    }

    match controller.save_space().await {
        Ok(SaveStatus::Saved) => {
            println!("saved");
            Ok(true)
        }
        Ok(SaveStatus::Rejected(_)) => {
            print_errors(controller.errors());
            Ok(false)
        }
        Err(e) => Ok(fail(&e)),
    }
}

fn require_zone<'a>(draft: &'a SpaceDraftStore, zone: &str) -> Result<&'a ZoneDraft, DraftError> {
    draft
        .zone(zone)
        .ok_or_else(|| DraftError::ZoneNotFound(zone.to_string()))
}

fn print_draft(draft: &SpaceDraftStore) {
    println!("{} ({} zones)", draft.name(), draft.len());
    for (key, zone) in draft.zones() {
        println!();
        println!("{key}");
        if !zone.light_group().is_empty() {
            println!("  light group: {}", zone.light_group().join(", "));
        }
        for (index, row) in zone.pairs().rows().enumerate() {
            println!(
                "  [{index}] {} | {} | {}",
                or_dash(row.neighbor),
                or_dash(row.far_neighbor),
                or_dash(row.neighbor_group)
            );
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn print_errors(errors: &ValidationErrorIndex) {
    for line in errors.describe_all() {
        eprintln!("{line}");
    }
}

/// Prints an error and returns false.
fn fail(err: &CoreError) -> bool {
    match err.to_report() {
        Some(report) => eprintln!("{}", describe(&report)),
        None => eprintln!("error: {err}"),
    }
    if let Some(source) = std::error::Error::source(err) {
        eprintln!("  caused by: {source}");
    }
    false
}

//! CLI struct definitions and dispatch for the stockpile command-line
//! interface.

use crate::core::catalog::ItemCatalog;
use crate::core::config::Config;
use crate::core::error::StockpileError;
use crate::core::identity::Requester;
use crate::core::store::Store;
use crate::core::{schematic, time, units};
use crate::plugins::intake::{self, StagingCache, StagingKey};
use crate::plugins::{loc, shell, task};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "stockpile",
    version = env!("CARGO_PKG_VERSION"),
    about = "Daemonless material-list tracker for large voxel construction projects"
)]
pub(crate) struct Cli {
    /// Directory holding stockpile.toml (defaults to current directory).
    #[clap(long, global = true)]
    pub config_dir: Option<PathBuf>,
    /// Name to act as; recorded as creator/recipient on mutations.
    #[clap(long, global = true, default_value = "operator")]
    pub user: String,
    /// Bypass ownership checks (server operator mode).
    #[clap(long, global = true)]
    pub admin: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Create the data directory and database
    #[clap(name = "init")]
    Init,

    /// Interactive line-command session (announce + file upload flow)
    #[clap(name = "shell")]
    Shell,

    /// Track projects and their material lists
    #[clap(name = "task", visible_alias = "t")]
    Task(TaskCli),

    /// Named coordinate bookmarks
    #[clap(name = "loc")]
    Loc(LocCli),

    /// Item id / display name catalog
    #[clap(name = "catalog")]
    Catalog(CatalogCli),

    /// Decode a schematic and print its block counts (debugging aid)
    #[clap(name = "decode")]
    Decode(DecodeCli),
}

#[derive(clap::Args, Debug)]
pub(crate) struct TaskCli {
    #[clap(subcommand)]
    pub command: TaskCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum TaskCommand {
    /// Create a project from a material file in one step
    Add {
        name: String,
        /// 0/1/2 or overworld/nether/end
        dimension: String,
        x: String,
        y: String,
        z: String,
        /// Material file: .litematic, .txt or .csv
        #[clap(long)]
        file: PathBuf,
    },
    /// Delete a project and its materials
    Remove { name: String },
    /// List all projects
    List,
    /// Show a project's material report
    Show { name: String },
    /// Rename and relocate a project
    Set {
        name: String,
        new_name: String,
        dimension: String,
        x: String,
        y: String,
        z: String,
    },
    /// Claim a material line as its recipient
    Claim { name: String, sequence: u32 },
    /// Commit stock against a material line
    Commit {
        name: String,
        sequence: u32,
        /// Amount with optional unit suffix: 3, 2s, 1b, 2组, 1盒
        amount: String,
        /// Where the stock was dropped off
        location: String,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct LocCli {
    #[clap(subcommand)]
    pub command: LocCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum LocCommand {
    /// Add a bookmark with one dimension slot filled
    Add {
        name: String,
        dimension: String,
        x: String,
        y: String,
        z: String,
    },
    /// Update one dimension slot of a bookmark
    Set {
        name: String,
        dimension: String,
        x: String,
        y: String,
        z: String,
    },
    /// Remove a bookmark
    Remove { name: String },
    /// List bookmark names
    List,
    /// Show a bookmark's slots
    Show { name: String },
}

#[derive(clap::Args, Debug)]
pub(crate) struct CatalogCli {
    #[clap(subcommand)]
    pub command: CatalogCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CatalogCommand {
    /// Case-insensitive substring search over ids and names
    Search { keyword: String },
    /// Show catalog size and source file
    Stats,
    /// Re-read the catalog file and report the loaded size
    Reload,
}

#[derive(clap::Args, Debug)]
pub(crate) struct DecodeCli {
    /// Schematic file to decode
    pub file: PathBuf,
    /// Output format: 'text' or 'json'
    #[clap(long, default_value = "text")]
    pub format: String,
}

pub fn run() -> Result<(), StockpileError> {
    let cli = Cli::parse();
    let config_dir = match &cli.config_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let config = Config::load(&config_dir)?;
    let requester = Requester::new(&cli.user, &cli.user, cli.admin);

    match cli.command {
        Command::Init => {
            let store = Store::open(&config.data_dir)?;
            println!(
                "{} initialized {}",
                "●".bright_green(),
                store.root().display()
            );
            Ok(())
        }
        Command::Decode(decode_cli) => run_decode(&decode_cli),
        Command::Catalog(catalog_cli) => {
            let mut catalog = ItemCatalog::load(&config.catalog_file)?;
            run_catalog(&mut catalog, &config, catalog_cli)
        }
        Command::Shell => {
            let mut store = Store::open(&config.data_dir)?;
            let mut catalog = ItemCatalog::load(&config.catalog_file)?;
            shell::run(&mut store, &config, &mut catalog, requester, "local")
        }
        Command::Task(task_cli) => {
            let mut store = Store::open(&config.data_dir)?;
            let catalog = ItemCatalog::load(&config.catalog_file)?;
            run_task(&mut store, &config, &catalog, &requester, task_cli)
        }
        Command::Loc(loc_cli) => {
            let mut store = Store::open(&config.data_dir)?;
            run_loc(&mut store, loc_cli)
        }
    }
}

fn run_task(
    store: &mut Store,
    config: &Config,
    catalog: &ItemCatalog,
    requester: &Requester,
    task_cli: TaskCli,
) -> Result<(), StockpileError> {
    match task_cli.command {
        TaskCommand::Add {
            name,
            dimension,
            x,
            y,
            z,
            file,
        } => {
            let dimension: task::Dimension = dimension.parse()?;
            let location = task::Coordinates::parse(&x, &y, &z)?;
            // One-shot flow: announce and deliver the file back to back
            // through the same staging path the shell uses.
            let mut staging = StagingCache::new(config.staging_ttl_secs);
            let now = time::now_unix_secs();
            intake::announce(
                store, &mut staging, requester, "cli", &name, dimension, location, now,
            )?;
            let key = StagingKey {
                group: "cli".to_string(),
                submitter: requester.session_key.clone(),
            };
            let filename = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let outcome =
                intake::intake_file(store, &mut staging, config, catalog, &key, &file, &filename, now)?;
            match outcome {
                intake::IntakeOutcome::NotApplicable => Err(StockpileError::UserInput(format!(
                    "unsupported material file: {}",
                    filename
                ))),
                intake::IntakeOutcome::Completed {
                    material_count,
                    warnings,
                    ..
                } => {
                    println!(
                        "{} created {} with {} material entries",
                        "●".bright_green(),
                        name.bright_white(),
                        material_count
                    );
                    for warning in warnings {
                        eprintln!("{} {}", "⚠".bright_yellow(), warning);
                    }
                    Ok(())
                }
            }
        }
        TaskCommand::Remove { name } => {
            task::delete_project(store, &name, requester)?;
            println!("{} removed {}", "●".bright_green(), name);
            Ok(())
        }
        TaskCommand::List => {
            let projects = task::list_projects(store)?;
            if projects.is_empty() {
                println!("no projects yet");
                return Ok(());
            }
            for project in projects {
                println!(
                    "{}  {} ({}) by {}",
                    project.name.bright_white(),
                    project.location,
                    project.dimension,
                    project.creator_name
                );
            }
            Ok(())
        }
        TaskCommand::Show { name } => {
            let project = task::get_project_by_name(store, &name)?
                .ok_or_else(|| StockpileError::NotFound(format!("project {}", name)))?;
            let materials = task::get_materials(store, project.id)?;
            println!("{}", task::render_report(&project, &materials));
            Ok(())
        }
        TaskCommand::Set {
            name,
            new_name,
            dimension,
            x,
            y,
            z,
        } => {
            let dimension: task::Dimension = dimension.parse()?;
            let location = task::Coordinates::parse(&x, &y, &z)?;
            task::rename_project(store, &name, &new_name, dimension, location, requester)?;
            println!("{} updated {}", "●".bright_green(), new_name);
            Ok(())
        }
        TaskCommand::Claim { name, sequence } => {
            let material = task::claim_material(store, &name, sequence, requester)?;
            println!(
                "{} {} claimed #{} {}",
                "●".bright_green(),
                requester.display_name,
                material.sequence_number,
                material.display_label()
            );
            Ok(())
        }
        TaskCommand::Commit {
            name,
            sequence,
            amount,
            location,
        } => {
            let delta = units::parse_amount(&amount)?;
            let material = task::commit_material(store, &name, sequence, delta, &location)?;
            println!(
                "{} {} now {}/{}",
                "●".bright_green(),
                material.display_label(),
                material.commit_count,
                material.total
            );
            Ok(())
        }
    }
}

fn run_loc(store: &mut Store, loc_cli: LocCli) -> Result<(), StockpileError> {
    match loc_cli.command {
        LocCommand::Add {
            name,
            dimension,
            x,
            y,
            z,
        } => {
            let dimension: task::Dimension = dimension.parse()?;
            let coordinates = task::Coordinates::parse(&x, &y, &z)?;
            loc::add_location(store, &name, dimension, coordinates)?;
            println!("{} added {}", "●".bright_green(), name);
            Ok(())
        }
        LocCommand::Set {
            name,
            dimension,
            x,
            y,
            z,
        } => {
            let dimension: task::Dimension = dimension.parse()?;
            let coordinates = task::Coordinates::parse(&x, &y, &z)?;
            loc::set_location(store, &name, dimension, coordinates)?;
            println!("{} updated {}", "●".bright_green(), name);
            Ok(())
        }
        LocCommand::Remove { name } => {
            loc::remove_location(store, &name)?;
            println!("{} removed {}", "●".bright_green(), name);
            Ok(())
        }
        LocCommand::List => {
            let locations = loc::list_locations(store)?;
            if locations.is_empty() {
                println!("no locations yet");
                return Ok(());
            }
            for record in locations {
                println!("{}", record.name);
            }
            Ok(())
        }
        LocCommand::Show { name } => {
            let record = loc::get_location(store, &name)?
                .ok_or_else(|| StockpileError::NotFound(format!("location {}", name)))?;
            println!("{}", loc::render_location(&record));
            Ok(())
        }
    }
}

fn run_catalog(
    catalog: &mut ItemCatalog,
    config: &Config,
    catalog_cli: CatalogCli,
) -> Result<(), StockpileError> {
    match catalog_cli.command {
        CatalogCommand::Search { keyword } => {
            let hits = catalog.search(&keyword);
            if hits.is_empty() {
                println!("no matches");
                return Ok(());
            }
            for (id, name) in hits {
                println!("{} = {}", id.bright_white(), name);
            }
            Ok(())
        }
        CatalogCommand::Stats => {
            println!(
                "{} items from {}",
                catalog.len(),
                config.catalog_file.display()
            );
            Ok(())
        }
        CatalogCommand::Reload => {
            catalog.reload()?;
            println!(
                "{} reloaded {} items from {}",
                "●".bright_green(),
                catalog.len(),
                config.catalog_file.display()
            );
            Ok(())
        }
    }
}

fn run_decode(decode_cli: &DecodeCli) -> Result<(), StockpileError> {
    let regions = schematic::decode_file(&decode_cli.file)?;
    if decode_cli.format == "json" {
        let value: Vec<serde_json::Value> = regions
            .iter()
            .map(|region| {
                serde_json::json!({
                    "region": region.name,
                    "truncated": region.truncated,
                    "counts": region
                        .counts
                        .iter()
                        .map(|(id, count)| serde_json::json!({"id": id, "count": count}))
                        .collect::<Vec<_>>(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&value)
                .map_err(|e| StockpileError::Decode(e.to_string()))?
        );
        return Ok(());
    }
    for region in &regions {
        println!("{}", region.name.bright_white().bold());
        if region.truncated {
            eprintln!(
                "{} block data shorter than region volume, trailing voxels ignored",
                "⚠".bright_yellow()
            );
        }
        for (id, count) in &region.counts {
            println!("  {:>10}  {}", count, id);
        }
    }
    Ok(())
}

//! Line-oriented dispatcher: the interactive stand-in for the chat surface.
//!
//! Each input line is one already-tokenized command; a line naming an
//! existing supported file plays the "material file arrived" event, which is
//! how an announced project gets its list while the staging entry is still
//! warm.

use crate::core::catalog::ItemCatalog;
use crate::core::config::Config;
use crate::core::error::StockpileError;
use crate::core::identity::Requester;
use crate::core::store::Store;
use crate::core::time;
use crate::plugins::intake::{self, IntakeOutcome, StagingCache, StagingKey};
use crate::plugins::loc;
use crate::plugins::task::{self, Coordinates, Dimension};
use crate::core::units;
use std::io::{self, BufRead, Write};
use std::path::Path;

const TASK_HELP: &str = "task commands:
  task add <name> <0|1|2> <x> <y> <z>   announce a project, then send its file
  task remove <name>                     delete a project
  task list                              list projects
  task <name>                            show a project's material report
  task set <name> <new> <0|1|2> <x> <y> <z>  rename/relocate a project
  task claim <name> <seq>                claim a material line
  task commit <name> <seq> <amount> <where>  commit stock (64/item: 3, 2s, 1b)";

const LOC_HELP: &str = "loc commands:
  loc add <name> <0|1|2> <x> <y> <z>
  loc set <name> <0|1|2> <x> <y> <z>
  loc remove <name>
  loc list
  loc <name>";

pub struct Session<'a> {
    pub store: &'a mut Store,
    pub staging: StagingCache,
    pub config: &'a Config,
    pub catalog: &'a mut ItemCatalog,
    pub requester: Requester,
    /// Group/channel scope for staging keys; one shell is one group.
    pub group: String,
}

impl<'a> Session<'a> {
    pub fn new(
        store: &'a mut Store,
        config: &'a Config,
        catalog: &'a mut ItemCatalog,
        requester: Requester,
        group: &str,
    ) -> Self {
        let staging = StagingCache::new(config.staging_ttl_secs);
        Self {
            store,
            staging,
            config,
            catalog,
            requester,
            group: group.to_string(),
        }
    }

    fn staging_key(&self) -> StagingKey {
        StagingKey {
            group: self.group.clone(),
            submitter: self.requester.session_key.clone(),
        }
    }

    /// Dispatch one line. `None` means the line was not for us.
    pub fn handle_line(&mut self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let reply = match tokens[0] {
            "task" => self.handle_task(&tokens),
            "loc" => self.handle_loc(&tokens),
            "catalog" => self.handle_catalog(&tokens),
            "help" => Ok(format!("{}\n{}", TASK_HELP, LOC_HELP)),
            _ if Path::new(line).is_file() => self.handle_file(line),
            _ => return None,
        };
        Some(reply.unwrap_or_else(|err| err.to_string()))
    }

    fn handle_task(&mut self, tokens: &[&str]) -> Result<String, StockpileError> {
        match tokens {
            ["task", "add", name, dim, x, y, z] => {
                let dimension: Dimension = dim.parse()?;
                let location = Coordinates::parse(x, y, z)?;
                intake::announce(
                    self.store,
                    &mut self.staging,
                    &self.requester,
                    &self.group,
                    name,
                    dimension,
                    location,
                    time::now_unix_secs(),
                )?;
                Ok(format!(
                    "announced {}; now send its .litematic/.txt/.csv file",
                    name
                ))
            }
            ["task", "remove", name] => {
                task::delete_project(self.store, name, &self.requester)?;
                Ok(format!("removed {}", name))
            }
            ["task", "list"] => {
                let projects = task::list_projects(self.store)?;
                if projects.is_empty() {
                    return Ok("no projects yet".to_string());
                }
                let mut out = String::from("projects:\n");
                for project in projects {
                    out.push_str(&format!("  - {}\n", project.name));
                }
                Ok(out.trim_end().to_string())
            }
            ["task", "set", old_name, new_name, dim, x, y, z] => {
                let dimension: Dimension = dim.parse()?;
                let location = Coordinates::parse(x, y, z)?;
                task::rename_project(
                    self.store,
                    old_name,
                    new_name,
                    dimension,
                    location,
                    &self.requester,
                )?;
                Ok(format!("updated {}", new_name))
            }
            ["task", "claim", name, seq] => {
                let sequence = parse_sequence(seq)?;
                let material = task::claim_material(self.store, name, sequence, &self.requester)?;
                Ok(format!(
                    "{} claimed #{} {}",
                    self.requester.display_name,
                    material.sequence_number,
                    material.display_label()
                ))
            }
            ["task", "commit", name, seq, amount, location] => {
                let sequence = parse_sequence(seq)?;
                let delta = units::parse_amount(amount)?;
                let material =
                    task::commit_material(self.store, name, sequence, delta, location)?;
                Ok(format!(
                    "recorded: {} now {}/{}",
                    material.display_label(),
                    material.commit_count,
                    material.total
                ))
            }
            ["task", name] => {
                let project = task::get_project_by_name(self.store, name)?
                    .ok_or_else(|| StockpileError::NotFound(format!("project {}", name)))?;
                let materials = task::get_materials(self.store, project.id)?;
                Ok(task::render_report(&project, &materials))
            }
            _ => Ok(TASK_HELP.to_string()),
        }
    }

    fn handle_loc(&mut self, tokens: &[&str]) -> Result<String, StockpileError> {
        match tokens {
            ["loc", "add", name, dim, x, y, z] => {
                let dimension: Dimension = dim.parse()?;
                let coordinates = Coordinates::parse(x, y, z)?;
                loc::add_location(self.store, name, dimension, coordinates)?;
                Ok(format!("added {}", name))
            }
            ["loc", "set", name, dim, x, y, z] => {
                let dimension: Dimension = dim.parse()?;
                let coordinates = Coordinates::parse(x, y, z)?;
                loc::set_location(self.store, name, dimension, coordinates)?;
                Ok(format!("updated {}", name))
            }
            ["loc", "remove", name] => {
                loc::remove_location(self.store, name)?;
                Ok(format!("removed {}", name))
            }
            ["loc", "list"] => {
                let locations = loc::list_locations(self.store)?;
                if locations.is_empty() {
                    return Ok("no locations yet".to_string());
                }
                let mut out = String::from("locations:\n");
                for record in locations {
                    out.push_str(&format!("  - {}\n", record.name));
                }
                Ok(out.trim_end().to_string())
            }
            ["loc", name] => {
                let record = loc::get_location(self.store, name)?
                    .ok_or_else(|| StockpileError::NotFound(format!("location {}", name)))?;
                Ok(loc::render_location(&record))
            }
            _ => Ok(LOC_HELP.to_string()),
        }
    }

    fn handle_catalog(&mut self, tokens: &[&str]) -> Result<String, StockpileError> {
        match tokens {
            ["catalog", "reload"] => {
                self.catalog.reload()?;
                Ok(format!("catalog reloaded: {} items", self.catalog.len()))
            }
            ["catalog", "search", keyword] => {
                let hits = self.catalog.search(keyword);
                if hits.is_empty() {
                    return Ok("no matches".to_string());
                }
                Ok(hits
                    .iter()
                    .map(|(id, name)| format!("{} = {}", id, name))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            _ => Ok("catalog commands: reload, search <keyword>".to_string()),
        }
    }

    fn handle_file(&mut self, path_str: &str) -> Result<String, StockpileError> {
        let path = Path::new(path_str);
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = self.staging_key();
        let outcome = intake::intake_file(
            self.store,
            &mut self.staging,
            self.config,
            self.catalog,
            &key,
            path,
            &filename,
            time::now_unix_secs(),
        )?;
        match outcome {
            IntakeOutcome::NotApplicable => {
                Ok("that file type is not a material list".to_string())
            }
            IntakeOutcome::Completed {
                material_count,
                warnings,
                ..
            } => {
                let mut reply = format!("material list saved: {} entries", material_count);
                for warning in warnings {
                    reply.push_str(&format!("\n  warning: {}", warning));
                }
                Ok(reply)
            }
        }
    }
}

/// Interactive loop over stdin until EOF or `exit`.
pub fn run(
    store: &mut Store,
    config: &Config,
    catalog: &mut ItemCatalog,
    requester: Requester,
    group: &str,
) -> Result<(), StockpileError> {
    let mut session = Session::new(store, config, catalog, requester, group);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    write!(stdout, "stockpile> ")?;
    stdout.flush()?;
    for line in stdin.lock().lines() {
        let line = line?;
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if let Some(reply) = session.handle_line(&line) {
            writeln!(stdout, "{}", reply)?;
        }
        write!(stdout, "stockpile> ")?;
        stdout.flush()?;
    }
    Ok(())
}

fn parse_sequence(token: &str) -> Result<u32, StockpileError> {
    token
        .trim_start_matches('#')
        .parse()
        .map_err(|_| StockpileError::UserInput(format!("not a material number: {}", token)))
}

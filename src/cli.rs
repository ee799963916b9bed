/// CLI argument parsing and command handling.
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use crate::color::{self, ProjectColor};
use crate::ledger::Ledger;
use crate::stats::{self, CALENDAR_DAYS, CHART_POINTS, DAILY_HISTORY_DAYS, PORTFOLIO_POINTS};
use crate::types::{DEFAULT_PALIER, NewProject, Project, ProjectPatch};

#[derive(Parser)]
#[command(
    name = "mydream",
    version,
    about = "MyDream - A savings goal tracker for the terminal"
)]
pub struct Cli {
    /// Path of the SQLite store.
    #[arg(long, global = true, env = "MYDREAM_DB")]
    pub db: Option<String>,
    /// Log filter, e.g. `info` or `mydream=debug`.
    #[arg(long = "log-level", global = true, env = "MYDREAM_LOG", default_value = "warn")]
    pub log_level: String,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Progress of one project (the active one by default).
    Status {
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
    },
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    Deposit {
        #[command(subcommand)]
        command: DepositCommand,
    },
    /// Milestones gained per day, most recent first.
    History {
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
        #[arg(short = 'd', long = "days", default_value_t = DAILY_HISTORY_DAYS)]
        days: usize,
    },
    /// Cumulative savings per day.
    Chart {
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
        #[arg(short = 'w', long = "window", default_value_t = CHART_POINTS)]
        window: usize,
    },
    /// Which of the last days had a deposit.
    Calendar {
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
        #[arg(short = 'd', long = "days", default_value_t = CALENDAR_DAYS)]
        days: usize,
    },
    /// Totals and cumulative series across all projects.
    Portfolio {
        #[arg(short = 'w', long = "window", default_value_t = PORTFOLIO_POINTS)]
        window: usize,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ProjectCommand {
    Add {
        name: String,
        target: f64,
        #[arg(long = "palier", default_value_t = DEFAULT_PALIER)]
        palier: f64,
        #[arg(short = 'c', long = "color")]
        color: Option<ProjectColor>,
        #[arg(long = "deadline")]
        deadline: Option<NaiveDate>,
    },
    List,
    Edit {
        project: String,
        #[arg(long = "name")]
        name: Option<String>,
        #[arg(long = "target")]
        target: Option<f64>,
        #[arg(long = "palier")]
        palier: Option<f64>,
        #[arg(short = 'c', long = "color")]
        color: Option<ProjectColor>,
        #[arg(long = "deadline", conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,
        #[arg(long = "clear-deadline")]
        clear_deadline: bool,
        /// Cover image URL.
        #[arg(long = "image", conflicts_with = "clear_image")]
        image: Option<String>,
        #[arg(long = "clear-image")]
        clear_image: bool,
    },
    Delete {
        project: String,
    },
    Switch {
        project: String,
    },
    /// Remove every deposit of a project.
    Reset {
        project: String,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum DepositCommand {
    Add {
        amount: f64,
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
    },
    /// Deposit a number of milestones worth of the project's palier.
    Milestones {
        count: u32,
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
    },
    /// Take back the most recent deposit.
    Undo {
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
    },
    Remove {
        id: String,
    },
    List {
        #[arg(short = 'n', long = "count", default_value_t = 10)]
        count: usize,
        #[arg(short = 'p', long = "project")]
        project: Option<String>,
    },
}

/// Execute a CLI command against the ledger.
pub fn run(command: Command, ledger: &mut Ledger) -> Result<()> {
    match command {
        Command::Status { project } => handle_status(project, ledger)?,
        Command::Project { command } => run_project(command, ledger)?,
        Command::Deposit { command } => run_deposit(command, ledger)?,
        Command::History { project, days } => handle_history(project, days, ledger),
        Command::Chart { project, window } => handle_chart(project, window, ledger),
        Command::Calendar { project, days } => handle_calendar(project, days, ledger),
        Command::Portfolio { window } => handle_portfolio(window, ledger),
    }
    Ok(())
}

fn run_project(command: ProjectCommand, ledger: &mut Ledger) -> Result<()> {
    match command {
        ProjectCommand::Add {
            name,
            target,
            palier,
            color,
            deadline,
        } => {
            let color = color.unwrap_or_else(color::random_color);
            let project = ledger.create_project(
                NewProject::new(name, target, color)
                    .palier(palier)
                    .deadline(deadline),
            )?;
            println!("Created project '{}' ({})", project.name, project.id);
        }
        ProjectCommand::List => handle_project_list(ledger),
        ProjectCommand::Edit {
            project,
            name,
            target,
            palier,
            color,
            deadline,
            clear_deadline,
            image,
            clear_image,
        } => {
            let patch = ProjectPatch {
                name,
                target_amount: target,
                palier_value: palier,
                color,
                image_url: if clear_image { Some(None) } else { image.map(Some) },
                deadline: if clear_deadline { Some(None) } else { deadline.map(Some) },
                ..ProjectPatch::default()
            };
            if patch.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            let Some(found) = pick(ledger, Some(project.as_str())) else {
                return Ok(());
            };
            if let Some(updated) = ledger.update_project(&found.id, patch)? {
                println!("Updated project '{}'", updated.name);
            }
        }
        ProjectCommand::Delete { project } => {
            let Some(found) = pick(ledger, Some(project.as_str())) else {
                return Ok(());
            };
            if ledger.delete_project(&found.id)? {
                println!("Deleted project '{}' and its deposits", found.name);
            } else {
                println!("Cannot delete '{}', at least one project must remain.", found.name);
            }
        }
        ProjectCommand::Switch { project } => {
            let Some(found) = pick(ledger, Some(project.as_str())) else {
                return Ok(());
            };
            ledger.switch_active(&found.id)?;
            println!("Switched to '{}'", found.name);
        }
        ProjectCommand::Reset { project } => {
            let Some(found) = pick(ledger, Some(project.as_str())) else {
                return Ok(());
            };
            let removed = ledger.reset_project(&found.id)?;
            println!("Removed {removed} deposits from '{}'", found.name);
        }
    }
    Ok(())
}

fn run_deposit(command: DepositCommand, ledger: &mut Ledger) -> Result<()> {
    match command {
        DepositCommand::Add { amount, project } => {
            let Some(found) = pick(ledger, project.as_deref()) else {
                return Ok(());
            };
            let deposit = ledger.add_deposit(&found.id, amount)?;
            println!(
                "Added {} to '{}'",
                format_amount(deposit.amount),
                found.name
            );
        }
        DepositCommand::Milestones { count, project } => {
            let Some(found) = pick(ledger, project.as_deref()) else {
                return Ok(());
            };
            let deposit = ledger.add_milestones(&found.id, count)?;
            println!(
                "+{count} milestone{} ({}) added to '{}'",
                plural(count as i64),
                format_amount(deposit.amount),
                found.name
            );
        }
        DepositCommand::Undo { project } => {
            let Some(found) = pick(ledger, project.as_deref()) else {
                return Ok(());
            };
            match ledger.undo_last_deposit(&found.id)? {
                Some(deposit) => println!(
                    "Removed last deposit of {} from '{}'",
                    format_amount(deposit.amount),
                    found.name
                ),
                None => println!("Nothing to undo for '{}'", found.name),
            }
        }
        DepositCommand::Remove { id } => match ledger.remove_deposit(&id)? {
            Some(deposit) => println!("Removed deposit {} ({})", id, format_amount(deposit.amount)),
            None => println!("Deposit '{id}' not found"),
        },
        DepositCommand::List { count, project } => {
            let Some(found) = pick(ledger, project.as_deref()) else {
                return Ok(());
            };
            let recent = ledger.recent_deposits(&found.id, count);
            if recent.is_empty() {
                println!("No deposits yet for '{}'", found.name);
            }
            for deposit in recent {
                println!(
                    "{}  {:>10}  {}{}",
                    deposit.date,
                    format_amount(deposit.amount),
                    deposit.id,
                    if deposit.is_seed { "  (seed)" } else { "" }
                );
            }
        }
    }
    Ok(())
}

fn handle_status(project: Option<String>, ledger: &Ledger) -> Result<()> {
    let Some(found) = pick(ledger, project.as_deref()) else {
        return Ok(());
    };
    let Some(summary) = ledger.summary(&found.id) else {
        return Ok(());
    };
    let today = Local::now().date_naive();
    let active = if found.id == ledger.active_project_id() {
        " (active)"
    } else {
        ""
    };
    println!("{} [{}]{active}", found.name, found.color);
    println!(
        "Saved       {} / {}",
        format_amount(summary.saved),
        format_amount(found.target_amount)
    );
    println!(
        "Milestones  {} / {} ({:.0}%)",
        summary.current_milestones, summary.total_milestones, summary.progress_percent
    );
    println!("Remaining   {}", format_amount(summary.remaining));
    if let Some(deadline) = found.deadline {
        let days = stats::days_remaining(deadline, today);
        println!("Deadline    {deadline} ({days} day{} left)", plural(days));
    }
    if let Some(cover) = found.cover_image() {
        println!("Cover       {cover}");
    }
    if ledger.has_deposited_on(&found.id, today) {
        println!("Deposited today.");
    } else {
        println!("No deposit yet today.");
    }
    Ok(())
}

fn handle_project_list(ledger: &Ledger) {
    for project in ledger.projects() {
        let marker = if project.id == ledger.active_project_id() {
            "*"
        } else {
            " "
        };
        let saved = stats::total_saved(ledger.deposits_for(&project.id));
        println!(
            "{marker} {}  {:<20} {:>12} / {:<12} {:>6} x {}",
            project.id,
            project.name,
            format_amount(saved),
            format_amount(project.target_amount),
            project.color,
            format_amount(project.palier_value)
        );
    }
}

fn handle_history(project: Option<String>, days: usize, ledger: &Ledger) {
    let Some(found) = pick(ledger, project.as_deref()) else {
        return;
    };
    let history = stats::daily_history(ledger.deposits_for(&found.id), found.palier_value, days);
    if history.is_empty() {
        println!("No history yet.");
        return;
    }
    for entry in history {
        println!(
            "{}  +{} milestone{}",
            entry.date,
            entry.milestones,
            plural(entry.milestones)
        );
    }
}

fn handle_chart(project: Option<String>, window: usize, ledger: &Ledger) {
    let Some(found) = pick(ledger, project.as_deref()) else {
        return;
    };
    let points = stats::cumulative_by_day(ledger.deposits_for(&found.id), window);
    if points.is_empty() {
        println!("No data yet.");
        return;
    }
    for point in points {
        println!(
            "{}  {:>12}  {:>3}% of goal",
            point.date,
            format_amount(point.total),
            point.percent_of(found.target_amount)
        );
    }
}

fn handle_calendar(project: Option<String>, days: usize, ledger: &Ledger) {
    let Some(found) = pick(ledger, project.as_deref()) else {
        return;
    };
    let deposit_days = stats::deposit_days(ledger.deposits_for(&found.id));
    let today = Local::now().date_naive();
    let cells: Vec<String> = stats::calendar(&deposit_days, today, days)
        .into_iter()
        .map(|day| {
            let mark = if day.has_deposit {
                "x".to_string()
            } else {
                day.date.format("%d").to_string()
            };
            if day.is_today {
                format!("[{mark}]")
            } else {
                format!(" {mark} ")
            }
        })
        .collect();
    println!("{}", cells.join(""));
}

fn handle_portfolio(window: usize, ledger: &Ledger) {
    let projects = ledger.projects();
    let summary = stats::portfolio_summary(projects, ledger.all_deposits());
    println!("Total value   {}", format_amount(summary.total_value));
    println!("Total target  {}", format_amount(summary.total_target));
    println!("Progress      {:.1}%", summary.overall_progress);
    println!("Milestones    {}", summary.total_milestones);

    let series = stats::portfolio_series(projects, ledger.all_deposits(), window);
    for point in series {
        let parts: Vec<String> = point
            .per_project
            .iter()
            .filter_map(|(id, value)| {
                projects
                    .iter()
                    .find(|project| &project.id == id)
                    .map(|project| format!("{}={}", project.name, format_amount(*value)))
            })
            .collect();
        println!(
            "{}  {:>12}  {}",
            point.date,
            format_amount(point.total),
            parts.join(" ")
        );
    }
}

/// Finds a project by id or name, falling back to the active project.
fn pick(ledger: &Ledger, key: Option<&str>) -> Option<Project> {
    let found = match key {
        None => ledger.active_project(),
        Some(key) => ledger.project(key).or_else(|| {
            ledger
                .projects()
                .iter()
                .find(|project| project.name.eq_ignore_ascii_case(key))
        }),
    };
    if found.is_none() {
        println!("Project '{}' not found", key.unwrap_or_default());
    }
    found.cloned()
}

fn format_amount(value: f64) -> String {
    format!("€{value:.2}")
}

fn plural(count: i64) -> &'static str {
    if count == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::db;
    use crate::ledger::StorageKeys;

    fn ledger() -> Ledger {
        Ledger::open(db::init(":memory:").unwrap(), StorageKeys::default()).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_project_add_with_options() {
        let cli = Cli::try_parse_from([
            "mydream", "project", "add", "Watch", "1000", "--palier", "50", "--color", "green",
            "--deadline", "2030-06-01",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Project {
                command: ProjectCommand::Add {
                    name: "Watch".into(),
                    target: 1000.0,
                    palier: 50.0,
                    color: Some(ProjectColor::Green),
                    deadline: Some("2030-06-01".parse().unwrap()),
                }
            })
        );
    }

    #[test]
    fn palier_defaults_and_global_db_flag() {
        let cli =
            Cli::try_parse_from(["mydream", "project", "add", "Car", "500", "--db", "x.db"])
                .unwrap();
        assert_eq!(cli.db.as_deref(), Some("x.db"));
        match cli.command {
            Some(Command::Project {
                command: ProjectCommand::Add { palier, .. },
            }) => assert_eq!(palier, DEFAULT_PALIER),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_color() {
        assert!(Cli::try_parse_from(["mydream", "project", "add", "Car", "500", "-c", "pink"]).is_err());
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["mydream"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn commands_drive_the_ledger() {
        let mut ledger = ledger();
        run(
            Command::Project {
                command: ProjectCommand::Add {
                    name: "Watch".into(),
                    target: 1000.0,
                    palier: 50.0,
                    color: Some(ProjectColor::Blue),
                    deadline: None,
                },
            },
            &mut ledger,
        )
        .unwrap();
        run(
            Command::Project {
                command: ProjectCommand::Switch {
                    project: "watch".into(),
                },
            },
            &mut ledger,
        )
        .unwrap();
        run(
            Command::Deposit {
                command: DepositCommand::Milestones {
                    count: 3,
                    project: None,
                },
            },
            &mut ledger,
        )
        .unwrap();

        let active = ledger.active_project().unwrap().clone();
        assert_eq!(active.name, "Watch");
        let summary = ledger.summary(&active.id).unwrap();
        assert_eq!(summary.saved, 150.0);
        assert_eq!(summary.progress_percent, 15.0);

        for command in [
            Command::Status { project: None },
            Command::History { project: None, days: 7 },
            Command::Chart { project: None, window: 14 },
            Command::Calendar { project: None, days: 14 },
            Command::Portfolio { window: 30 },
            Command::Project { command: ProjectCommand::List },
        ] {
            run(command, &mut ledger).unwrap();
        }

        run(
            Command::Project {
                command: ProjectCommand::Delete {
                    project: active.id.clone(),
                },
            },
            &mut ledger,
        )
        .unwrap();
        assert_eq!(ledger.active_project_id(), "default");
        assert!(ledger.all_deposits().is_empty());
    }

    #[test]
    fn edit_rejects_deadline_together_with_clear() {
        assert!(
            Cli::try_parse_from([
                "mydream", "project", "edit", "default", "--deadline", "2030-06-01",
                "--clear-deadline",
            ])
            .is_err()
        );
    }

    #[test]
    fn edit_sets_then_clears_deadline_and_image() {
        let mut ledger = ledger();
        let edit = |args: &[&str]| {
            let mut argv = vec!["mydream", "project", "edit", "default"];
            argv.extend_from_slice(args);
            Cli::try_parse_from(argv).unwrap().command.unwrap()
        };

        run(edit(&["--deadline", "2030-06-01", "--image", "rolex.png"]), &mut ledger).unwrap();
        let project = ledger.project("default").unwrap();
        assert_eq!(project.deadline, Some("2030-06-01".parse().unwrap()));
        assert_eq!(project.image_url.as_deref(), Some("rolex.png"));

        run(edit(&["--clear-deadline", "--clear-image"]), &mut ledger).unwrap();
        let project = ledger.project("default").unwrap();
        assert_eq!(project.deadline, None);
        assert_eq!(project.image_url, None);
    }

    #[test]
    fn invalid_amount_surfaces_as_error() {
        let mut ledger = ledger();
        let result = run(
            Command::Deposit {
                command: DepositCommand::Add {
                    amount: -3.0,
                    project: None,
                },
            },
            &mut ledger,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_project_is_reported_not_failed() {
        let mut ledger = ledger();
        let result = run(
            Command::Project {
                command: ProjectCommand::Switch {
                    project: "nowhere".into(),
                },
            },
            &mut ledger,
        );
        assert!(result.is_ok());
        assert_eq!(ledger.active_project_id(), "default");
    }
}

//! Timesheet CLI - project hierarchy and overhead task bookkeeping

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use serde::Serialize;
use timesheet_core::application::ServiceLocator;
use timesheet_core::config::Config;
use timesheet_core::domain::timesheet::{
    NonChargeableTask, Project, ProjectService, SubProject, TimesheetRepository, Workstage,
};
use timesheet_core::storage::Database;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "timesheet")]
#[command(author, version, about = "Timesheet diary: projects, sub-projects and overhead tasks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Database file to use instead of the configured one
    #[arg(long, global = true)]
    database: Option<PathBuf>,
}

#[derive(Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage sub-projects
    Subprojects {
        #[command(subcommand)]
        action: SubProjectAction,
    },

    /// Manage workstages
    Workstages {
        #[command(subcommand)]
        action: WorkstageAction,
    },

    /// Manage non-chargeable tasks
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Run health check
    Doctor,
}

#[derive(Subcommand)]
enum ProjectAction {
    /// List projects, chargeable first
    List,
    /// Show a project and its sub-projects
    Show { code: String },
    /// Create a project
    Create {
        code: String,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// Mark the project as overhead
        #[arg(long)]
        non_chargeable: bool,
    },
    /// Edit a project
    Edit {
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        chargeable: Option<bool>,
    },
    /// Delete a project
    Delete { code: String },
}

#[derive(Subcommand)]
enum SubProjectAction {
    /// List sub-projects
    List {
        /// Only sub-projects of this project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Show a sub-project and its workstages
    Show { code: String, sub_number: i32 },
    /// Create a sub-project
    Create {
        code: String,
        sub_number: i32,
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Edit a sub-project
    Edit {
        code: String,
        sub_number: i32,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a sub-project
    Delete { code: String, sub_number: i32 },
}

#[derive(Subcommand)]
enum WorkstageAction {
    /// List the workstages of a sub-project
    List { code: String, sub_number: i32 },
    /// Create a workstage
    Create {
        code: String,
        sub_number: i32,
        workstage_number: String,
        name: String,
    },
    /// Delete a workstage
    Delete {
        code: String,
        sub_number: i32,
        workstage_number: String,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    /// List non-chargeable tasks
    List,
    /// Show a task
    Show { name: String },
    /// Create a task
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
    /// List all configuration values
    List,
    /// Reset configuration to defaults
    Reset,
    /// Show configuration file path
    Path,
}

/// How command results are written to stdout
#[derive(Clone, Copy)]
struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Informational line, suppressed in quiet and json modes
    fn note(&self, message: impl AsRef<str>) {
        if !self.quiet && !self.json() {
            println!("{}", message.as_ref());
        }
    }

    fn emit<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load();
    let filter = config
        .as_ref()
        .map(|c| c.logging.filter.clone())
        .unwrap_or_else(|_| "timesheet=info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        // `config reset` and `config path` still work so a broken file can be repaired
        Err(e) => match cli.command {
            Commands::Config { action } => cmd_config(action, cli.quiet),
            _ => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    if let Some(path) = cli.database {
        config.database.path = Some(path);
    }
    let out = Output {
        format: cli.format,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Projects { action } => {
            let locator = open_locator(&config).await?;
            cmd_projects(&locator, action, out).await
        }
        Commands::Subprojects { action } => {
            let locator = open_locator(&config).await?;
            cmd_sub_projects(&locator, action, out).await
        }
        Commands::Workstages { action } => {
            let locator = open_locator(&config).await?;
            cmd_workstages(&locator, action, out).await
        }
        Commands::Tasks { action } => {
            let locator = open_locator(&config).await?;
            cmd_tasks(&locator, action, out).await
        }
        Commands::Config { action } => cmd_config(action, cli.quiet),
        Commands::Doctor => cmd_doctor(&config, out).await,
    }
}

/// Print an error with its code and a suggested next command when there is one
fn report(err: &anyhow::Error) {
    match err.downcast_ref::<timesheet_core::Error>() {
        Some(e) => {
            eprintln!("Error [{}]: {}", e.code(), e);
            if let Some(suggestion) = e.suggestion() {
                eprintln!("  Try: {}", suggestion);
            }
        }
        None => eprintln!("Error: {:#}", err),
    }
}

async fn open_locator(config: &Config) -> anyhow::Result<ServiceLocator> {
    let db = Database::from_config(config).await?;
    debug!(path = %db.path().display(), "Opened timesheet database");
    let repository = Arc::new(TimesheetRepository::new(db.pool().clone()));
    Ok(ServiceLocator::new(repository))
}

// ============================================================================
// Lookups
// ============================================================================

async fn require_project(service: &ProjectService, code: &str) -> anyhow::Result<Project> {
    service
        .get_project_by_code(code)
        .await?
        .ok_or_else(|| anyhow!("No project with code '{}'. Use `timesheet projects list` to see projects.", code))
}

async fn require_sub_project(
    service: &ProjectService,
    code: &str,
    sub_number: i32,
) -> anyhow::Result<SubProject> {
    service
        .get_sub_project_by_code_and_sub_number(code, sub_number)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "No sub-project {}/{}. Use `timesheet subprojects list --project {}` to see sub-projects.",
                code,
                sub_number,
                code
            )
        })
}

fn describe_project(p: &Project) -> String {
    let mut line = format!("  {:<12} {}", p.code, p.name);
    if !p.is_chargeable {
        line.push_str(" [non-chargeable]");
    }
    line
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn cmd_projects(locator: &ServiceLocator, action: ProjectAction, out: Output) -> anyhow::Result<()> {
    let service = locator.project_service();

    match action {
        ProjectAction::List => {
            let projects = service.project_listing().await?;
            if out.json() {
                return out.emit(&projects);
            }
            if projects.is_empty() {
                out.note("No projects found.");
                out.note("\nCreate one with: timesheet projects create <code> <name>");
            } else {
                out.note("Projects:");
                for p in &projects {
                    println!("{}", describe_project(p));
                }
            }
        }
        ProjectAction::Show { code } => {
            let project = require_project(&service, &code).await?;
            let sub_projects = service.sub_projects_of(project.persisted_id()?).await?;
            if out.json() {
                return out.emit(&serde_json::json!({
                    "project": project,
                    "sub_projects": sub_projects,
                }));
            }
            println!("Project: {}", project.code);
            println!("  Name: {}", project.name);
            if let Some(description) = &project.description {
                println!("  Description: {}", description);
            }
            println!("  Chargeable: {}", if project.is_chargeable { "yes" } else { "no" });
            if !sub_projects.is_empty() {
                println!("  Sub-projects:");
                for s in &sub_projects {
                    println!("    {:>4}  {}", s.sub_number, s.name);
                }
            }
        }
        ProjectAction::Create {
            code,
            name,
            description,
            non_chargeable,
        } => {
            let mut project = Project::new(code, name);
            project.description = description;
            project.is_chargeable = !non_chargeable;
            service.save_project(&mut project).await?;
            if out.json() {
                return out.emit(&project);
            }
            out.note(format!("Project '{}' created.", project.code));
        }
        ProjectAction::Edit {
            code,
            name,
            description,
            chargeable,
        } => {
            let mut project = require_project(&service, &code).await?;
            if let Some(name) = name {
                project.name = name;
            }
            if let Some(description) = description {
                project.description = Some(description).filter(|d| !d.is_empty());
            }
            if let Some(chargeable) = chargeable {
                project.is_chargeable = chargeable;
            }
            service.save_project(&mut project).await?;
            if out.json() {
                return out.emit(&project);
            }
            out.note(format!("Project '{}' updated.", project.code));
        }
        ProjectAction::Delete { code } => {
            let project = require_project(&service, &code).await?;
            service.delete_project(&project).await?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct SubProjectListing<'a> {
    project_code: &'a str,
    #[serde(flatten)]
    sub_project: &'a SubProject,
}

async fn cmd_sub_projects(
    locator: &ServiceLocator,
    action: SubProjectAction,
    out: Output,
) -> anyhow::Result<()> {
    let service = locator.project_service();

    match action {
        SubProjectAction::List { project } => {
            let projects = service.projects().await?;
            let sub_projects = match project {
                Some(code) => {
                    let parent = require_project(&service, &code).await?;
                    service.sub_projects_of(parent.persisted_id()?).await?
                }
                None => service.sub_projects().await?,
            };
            let codes: HashMap<_, _> = projects
                .iter()
                .filter_map(|p| p.id.map(|id| (id, p.code.as_str())))
                .collect();
            let listing: Vec<SubProjectListing> = sub_projects
                .iter()
                .map(|s| SubProjectListing {
                    project_code: codes.get(&s.project_id).copied().unwrap_or("?"),
                    sub_project: s,
                })
                .collect();

            if out.json() {
                return out.emit(&listing);
            }
            if listing.is_empty() {
                out.note("No sub-projects found.");
            } else {
                out.note("Sub-projects:");
                for row in &listing {
                    let key = format!("{}/{}", row.project_code, row.sub_project.sub_number);
                    println!("  {:<16} {}", key, row.sub_project.name);
                }
            }
        }
        SubProjectAction::Show { code, sub_number } => {
            let sub_project = require_sub_project(&service, &code, sub_number).await?;
            let workstages = service.workstages_of(sub_project.persisted_id()?).await?;
            if out.json() {
                return out.emit(&serde_json::json!({
                    "sub_project": sub_project,
                    "workstages": workstages,
                }));
            }
            println!("Sub-project: {}/{}", code, sub_project.sub_number);
            println!("  Name: {}", sub_project.name);
            if let Some(description) = &sub_project.description {
                println!("  Description: {}", description);
            }
            print_workstages(&workstages);
        }
        SubProjectAction::Create {
            code,
            sub_number,
            name,
            description,
        } => {
            let parent = require_project(&service, &code).await?;
            let mut sub_project = SubProject::for_project(&parent, sub_number, name)?;
            sub_project.description = description;
            service.save_sub_project(&mut sub_project).await?;
            if out.json() {
                return out.emit(&sub_project);
            }
            out.note(format!("Sub-project {}/{} created.", parent.code, sub_number));
        }
        SubProjectAction::Edit {
            code,
            sub_number,
            name,
            description,
        } => {
            let mut sub_project = require_sub_project(&service, &code, sub_number).await?;
            if let Some(name) = name {
                sub_project.name = name;
            }
            if let Some(description) = description {
                sub_project.description = Some(description).filter(|d| !d.is_empty());
            }
            service.save_sub_project(&mut sub_project).await?;
            if out.json() {
                return out.emit(&sub_project);
            }
            out.note(format!("Sub-project {}/{} updated.", code, sub_number));
        }
        SubProjectAction::Delete { code, sub_number } => {
            let sub_project = require_sub_project(&service, &code, sub_number).await?;
            service.delete_sub_project(&sub_project).await?;
        }
    }
    Ok(())
}

fn print_workstages(workstages: &[Workstage]) {
    if workstages.is_empty() {
        println!("  No workstages.");
        return;
    }
    println!("  Workstages:");
    for w in workstages {
        println!("    {:<6} {}", w.workstage_number, w.name);
    }
}

async fn cmd_workstages(
    locator: &ServiceLocator,
    action: WorkstageAction,
    out: Output,
) -> anyhow::Result<()> {
    let service = locator.project_service();

    match action {
        WorkstageAction::List { code, sub_number } => {
            let sub_project = require_sub_project(&service, &code, sub_number).await?;
            let workstages = service.workstages_of(sub_project.persisted_id()?).await?;
            if out.json() {
                return out.emit(&workstages);
            }
            print_workstages(&workstages);
        }
        WorkstageAction::Create {
            code,
            sub_number,
            workstage_number,
            name,
        } => {
            let sub_project = require_sub_project(&service, &code, sub_number).await?;
            let mut workstage = Workstage::for_sub_project(&sub_project, workstage_number, name)?;
            service.save_workstage(&mut workstage).await?;
            out.note(format!("Workstage {} created.", workstage.workstage_number));
        }
        WorkstageAction::Delete {
            code,
            sub_number,
            workstage_number,
        } => {
            let sub_project = require_sub_project(&service, &code, sub_number).await?;
            let workstage = service
                .workstages_of(sub_project.persisted_id()?)
                .await?
                .into_iter()
                .find(|w| w.workstage_number == workstage_number)
                .ok_or_else(|| {
                    anyhow!("No workstage {} in sub-project {}/{}", workstage_number, code, sub_number)
                })?;
            service.delete_workstage(&workstage).await?;
        }
    }
    Ok(())
}

async fn cmd_tasks(locator: &ServiceLocator, action: TaskAction, out: Output) -> anyhow::Result<()> {
    let service = locator.task_service();

    match action {
        TaskAction::List => {
            let tasks = service.tasks().await?;
            if out.json() {
                return out.emit(&tasks);
            }
            if tasks.is_empty() {
                out.note("No non-chargeable tasks found.");
            } else {
                out.note("Non-chargeable tasks:");
                for t in &tasks {
                    println!("  {}", t.name);
                }
            }
        }
        TaskAction::Show { name } => {
            let task = service
                .get_task_by_name(&name)
                .await?
                .ok_or_else(|| anyhow!("No task named '{}'. Use `timesheet tasks list` to see tasks.", name))?;
            if out.json() {
                return out.emit(&task);
            }
            println!("Task: {}", task.name);
            if let Some(description) = &task.description {
                println!("  Description: {}", description);
            }
        }
        TaskAction::Create { name, description } => {
            let mut task = NonChargeableTask::new(name);
            task.description = description;
            service.save_task(&mut task).await?;
            if out.json() {
                return out.emit(&task);
            }
            out.note(format!("Task '{}' created.", task.name));
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Doctor line for a record count, and whether the read succeeded
fn count_line<T>(label: &str, records: timesheet_core::Result<Vec<T>>) -> (String, bool) {
    match records {
        Ok(records) => (format!("     {}: {}", label, records.len()), true),
        Err(e) => {
            warn!(error = %e, "Doctor could not read {}", label);
            (format!("[!!] {}: Read failed - [{}] {}", label, e.code(), e), false)
        }
    }
}

async fn cmd_doctor(config: &Config, out: Output) -> anyhow::Result<()> {
    out.note("Timesheet Health Check");
    out.note("======================");
    out.note("");

    let mut all_ok = true;

    match config.validate() {
        Ok(()) => out.note("[OK] Configuration: Valid"),
        Err(e) => {
            all_ok = false;
            out.note(format!("[!!] Configuration: Error - {}", e));
        }
    }

    match Config::config_path() {
        Ok(path) if path.exists() => out.note(format!("[OK] Config file: {}", path.display())),
        Ok(path) => out.note(format!("[--] Config file: {} (using defaults)", path.display())),
        Err(e) => out.note(format!("[!!] Config file: Error - {}", e)),
    }

    match Database::from_config(config).await {
        Ok(db) => match db.health_check().await {
            Ok(()) => {
                out.note("[OK] Database: Connected");
                out.note(format!("     Path: {}", db.path().display()));

                match db.migration_status().await {
                    Ok(status) if status.needs_migration => out.note(format!(
                        "[!!] Database: Migrations pending (v{} -> v{})",
                        status.current_version, status.target_version
                    )),
                    Ok(status) => out.note(format!("[OK] Database: Schema v{}", status.current_version)),
                    Err(e) => out.note(format!("[!!] Database: Migration check failed - {}", e)),
                }

                let locator = ServiceLocator::new(Arc::new(TimesheetRepository::new(db.pool().clone())));
                let counts = [
                    count_line("Projects", locator.project_service().projects().await),
                    count_line("Non-chargeable tasks", locator.task_service().tasks().await),
                ];
                for (line, ok) in counts {
                    all_ok &= ok;
                    out.note(line);
                }
            }
            Err(e) => {
                all_ok = false;
                out.note(format!("[!!] Database: Health check failed - {}", e));
            }
        },
        Err(e) => {
            all_ok = false;
            warn!(error = %e, "Database could not be opened");
            out.note(format!("[!!] Database: Failed to initialize - {:#}", e));
        }
    }

    if out.json() {
        return out.emit(&serde_json::json!({ "ok": all_ok }));
    }

    out.note("");
    if all_ok {
        out.note("All checks passed!");
    } else {
        out.note("Some checks failed. See above for details.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use timesheet_core::Error;

    #[test]
    fn test_count_line_reports_count() {
        let (line, ok) = count_line("Projects", Ok(vec![1, 2, 3]));
        assert!(ok);
        assert_eq!(line, "     Projects: 3");
    }

    #[test]
    fn test_count_line_surfaces_read_failure() {
        let records: timesheet_core::Result<Vec<Project>> =
            Err(Error::Parse("project id 'x': invalid".to_string()));
        let (line, ok) = count_line("Projects", records);
        assert!(!ok);
        assert!(line.starts_with("[!!] Projects: Read failed"));
        assert!(line.contains("E002"));
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["timesheet", "projects", "list", "--format", "json", "-q"])
            .unwrap();
        assert!(cli.quiet);
        assert!(cli.format == OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Projects {
                action: ProjectAction::List
            }
        ));
    }
}

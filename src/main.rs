use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};

use jira_version_manager::cli::{
    run_archive_workflow, run_cleanup_workflow, run_create_workflow, run_delete_workflow,
    run_list_workflow, BatchOutcome, CleanupWorkflowArgs, CreateWorkflowArgs, DeleteWorkflowArgs,
    ListWorkflowArgs,
};
use jira_version_manager::config::{self, Config};
use jira_version_manager::domain::calendar::parse_date;
use jira_version_manager::domain::record::ReleaseFilter;
use jira_version_manager::domain::version::{VersionBump, VersionSpec};
use jira_version_manager::error::VersionManagerError;
use jira_version_manager::lifecycle::{CreateRequest, VersionLifecycle};
use jira_version_manager::tracker::{JiraClient, VersionRepository};
use jira_version_manager::ui;

#[derive(Parser)]
#[command(
    name = "jira-version-manager",
    version,
    about = "Create, list, clean up and archive Jira versions from naming templates"
)]
struct Args {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, global = true, help = "Enable debug logging")]
    debug: bool,

    #[arg(long, global = true, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, global = true, help = "Skip TLS certificate verification")]
    no_verify_ssl: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Show the resolved configuration
    #[command(alias = "config")]
    Info,

    /// List the versions of a project
    List {
        project: String,

        #[arg(long, conflicts_with = "unreleased", help = "Only released versions")]
        released: bool,

        #[arg(long, help = "Only unreleased versions")]
        unreleased: bool,

        #[arg(long, help = "Show issues of the configured types")]
        issues: bool,
    },

    /// Create versions for the next month's release days
    Create(CreateArgs),

    /// Delete a version
    Delete {
        project: String,

        name: String,

        #[arg(long, help = "Move the version's issues to this version first")]
        move_to: Option<String>,

        #[arg(long, help = "Delete even if issues are assigned")]
        force: bool,
    },

    /// Delete old versions without issues
    Cleanup {
        #[arg(long, help = "Only this project")]
        project_key: Option<String>,

        #[arg(long, help = "Minimum age in days")]
        min_age_days: Option<u32>,

        #[arg(long, help = "Also delete released versions")]
        include_released: bool,
    },

    /// Archive old released versions
    Archive {
        #[arg(long, help = "Only this project")]
        project_key: Option<String>,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
#[command(group(ArgGroup::new("bump").args(["new_major", "new_minor", "new_patch"])))]
struct CreateArgs {
    #[arg(long, help = "Only this project")]
    project_key: Option<String>,

    #[arg(long, help = "Create for this date (YYYY-MM-DD) instead of the schedule")]
    date: Option<String>,

    #[arg(long, value_delimiter = ',', help = "Template ids to use, comma separated")]
    formats: Option<Vec<String>>,

    #[arg(long, help = "Schedule the current month instead of the next")]
    current_month: bool,

    #[arg(long)]
    new_major: bool,

    #[arg(long)]
    new_minor: bool,

    #[arg(long)]
    new_patch: bool,

    #[arg(long)]
    major: Option<u64>,

    #[arg(long)]
    minor: Option<u64>,

    #[arg(long)]
    patch: Option<u64>,

    #[arg(long, help = "Pre-release label, counter starts at 1")]
    pre_release: Option<String>,

    #[arg(long, help = "Next pre-release of this label after the latest version")]
    new_pre_release: Option<String>,

    #[arg(long, help = "Build number")]
    build: Option<u64>,

    #[arg(long, help = "Free-form metadata")]
    metadata: Option<String>,
}

impl CreateArgs {
    fn into_workflow_args(self) -> Result<CreateWorkflowArgs> {
        let date = match self.date.as_deref() {
            Some(text) => Some(parse_date(text).ok_or_else(|| {
                VersionManagerError::invalid_input(format!(
                    "invalid date '{}', expected YYYY-MM-DD",
                    text
                ))
            })?),
            None => None,
        };

        let bump = if self.new_major {
            Some(VersionBump::Major)
        } else if self.new_minor {
            Some(VersionBump::Minor)
        } else if self.new_patch {
            Some(VersionBump::Patch)
        } else {
            None
        };

        Ok(CreateWorkflowArgs {
            project_key: self.project_key,
            request: CreateRequest {
                date,
                formats: self.formats,
                current_month: self.current_month,
                version: VersionSpec {
                    bump,
                    major: self.major,
                    minor: self.minor,
                    patch: self.patch,
                    pre_release: self.pre_release,
                    new_pre_release: self.new_pre_release,
                    build: self.build,
                    metadata: self.metadata,
                },
            },
        })
    }
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

/// Resolve the configuration, pick the command and run it.
///
/// Returns `Ok(false)` when some project of a batch command failed.
fn run(args: Args) -> Result<bool> {
    let mut config = config::load_config_file(args.config.as_deref())?;
    config.apply_env_overrides(|name| std::env::var(name).ok());
    if args.no_verify_ssl {
        config.jira.verify_ssl = false;
    }
    let registry = config.validate()?;

    let command = match args.command {
        Some(command) => command,
        None => match interactive_command(&config)? {
            Some(command) => command,
            None => return Ok(true),
        },
    };

    match &command {
        Commands::Info => {
            ui::display_config(&config, &registry);
            return Ok(true);
        }
        // bad dates and conflicting flags are reported before credentials are needed
        Commands::Create(create) => {
            create.clone().into_workflow_args()?.request.version.validate()?
        }
        _ => {}
    }

    let tracker = JiraClient::new(&config.jira)?;
    let lifecycle =
        VersionLifecycle::new(&tracker, &config, &registry).with_dry_run(args.dry_run);
    if args.dry_run {
        ui::display_status("Dry run: no versions will be created, deleted or updated");
    }

    execute(&lifecycle, &config, command)
}

fn execute<R: VersionRepository>(
    lifecycle: &VersionLifecycle<'_, R>,
    config: &Config,
    command: Commands,
) -> Result<bool> {
    let outcome = match command {
        Commands::Info => return Ok(true),
        Commands::List {
            project,
            released,
            unreleased,
            issues,
        } => {
            let filter = if released {
                ReleaseFilter::Released
            } else if unreleased {
                ReleaseFilter::Unreleased
            } else {
                ReleaseFilter::All
            };
            run_list_workflow(
                lifecycle,
                &ListWorkflowArgs {
                    project_key: project,
                    filter,
                    with_issues: issues,
                },
            )?;
            return Ok(true);
        }
        Commands::Delete {
            project,
            name,
            move_to,
            force,
        } => {
            run_delete_workflow(
                lifecycle,
                &DeleteWorkflowArgs {
                    project_key: project,
                    name,
                    move_to,
                    force,
                },
            )?;
            return Ok(true);
        }
        Commands::Create(create) => {
            run_create_workflow(lifecycle, config, &create.into_workflow_args()?)?
        }
        Commands::Cleanup {
            project_key,
            min_age_days,
            include_released,
        } => run_cleanup_workflow(
            lifecycle,
            config,
            &CleanupWorkflowArgs {
                project_key,
                min_age_days,
                include_released,
            },
        )?,
        Commands::Archive { project_key } => {
            run_archive_workflow(lifecycle, config, project_key.as_deref())?
        }
    };

    report_batch(&outcome);
    Ok(outcome.is_success())
}

fn report_batch(outcome: &BatchOutcome) {
    if outcome.succeeded.len() + outcome.failed.len() <= 1 {
        return;
    }
    if outcome.is_success() {
        ui::display_success(&format!("All {} project(s) done", outcome.succeeded.len()));
    } else {
        for (project, error) in &outcome.failed {
            ui::display_error(&format!("{} failed: {}", project, error));
        }
    }
}

const MENU: [&str; 7] = [
    "Show configuration",
    "List versions",
    "Create versions",
    "Delete a version",
    "Clean up unused versions",
    "Archive old released versions",
    "Quit",
];

/// Numbered menu used when no subcommand is given.
fn interactive_command(config: &Config) -> Result<Option<Commands>> {
    let items: Vec<String> = MENU.iter().map(|s| s.to_string()).collect();
    let choice = ui::select_option("Jira version manager", &items)?;

    let command = match choice {
        0 => Commands::Info,
        1 => Commands::List {
            project: ui::select_project(&config.project_keys)?,
            released: false,
            unreleased: false,
            issues: ui::confirm_action("Show issues?")?,
        },
        2 => {
            let project_key = select_project_or_all(config)?;
            let date = ui::prompt_text("Date (YYYY-MM-DD, empty for the schedule)", None)?;
            Commands::Create(CreateArgs {
                project_key,
                date,
                ..CreateArgs::default()
            })
        }
        3 => {
            let project = ui::select_project(&config.project_keys)?;
            let name = ui::prompt_text("Version name", None)?
                .ok_or_else(|| anyhow::anyhow!("A version name is required"))?;
            let move_to = ui::prompt_text("Move issues to (empty for none)", None)?;
            let force = move_to.is_none() && ui::confirm_action("Delete even if issues are assigned?")?;
            Commands::Delete {
                project,
                name,
                move_to,
                force,
            }
        }
        4 => Commands::Cleanup {
            project_key: select_project_or_all(config)?,
            min_age_days: None,
            include_released: false,
        },
        5 => Commands::Archive {
            project_key: select_project_or_all(config)?,
        },
        _ => return Ok(None),
    };

    Ok(Some(command))
}

fn select_project_or_all(config: &Config) -> Result<Option<String>> {
    let mut options = vec!["All configured projects".to_string()];
    options.extend(config.project_keys.iter().cloned());

    let index = ui::select_option("Projects:", &options)?;
    Ok((index > 0).then(|| options[index].clone()))
}

//! plandoc - plan documents from the command line.
//!
//! Reads and writes markdown plan files; never runs processes or touches
//! the network.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plandoc::plan::{self, slugify, Phase, PhaseStatus, Plan, PlanStatus};
use plandoc::Config;

/// Plan documents: parse, validate, schedule and update
#[derive(Parser)]
#[command(name = "plandoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new draft plan
    New {
        /// Plan title
        #[arg(short, long)]
        title: String,

        /// Plan ID (defaults to the slugified title)
        #[arg(long)]
        id: Option<String>,

        /// Author (defaults to the configured author, then $USER)
        #[arg(short, long)]
        author: Option<String>,

        /// External issue reference
        #[arg(long)]
        issue: Option<String>,

        /// Output file (defaults to <plans_dir>/<id>.md)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Check a plan's structure and phase graph
    Validate {
        /// Plan file
        file: PathBuf,
    },

    /// Show a plan
    Show {
        /// Plan file
        file: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show phases grouped into dependency levels
    Levels {
        /// Plan file
        file: PathBuf,
    },

    /// List phases that can start now
    Next {
        /// Plan file
        file: PathBuf,
    },

    /// Change the plan status
    Transition {
        /// Plan file
        file: PathBuf,

        /// Target status (draft, reviewing, approved, in-progress, in-review, complete)
        status: PlanStatus,
    },

    /// Change a phase's status
    Phase {
        /// Plan file
        file: PathBuf,

        /// Phase ID
        phase: String,

        /// Target status (pending, in-progress, blocked, complete)
        status: PhaseStatus,
    },

    /// Show the branch name derived for each phase
    Branches {
        /// Plan file
        file: PathBuf,

        /// Pattern overriding the configured one
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// List plans in a directory
    List {
        /// Directory to scan (defaults to the configured plans_dir)
        dir: Option<PathBuf>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::New { title, id, author, issue, output, force } => {
            cmd_new(&title, id, author, issue, output, force)?;
        }
        Commands::Validate { file } => {
            cmd_validate(&file)?;
        }
        Commands::Show { file, format } => {
            cmd_show(&file, &format)?;
        }
        Commands::Levels { file } => {
            cmd_levels(&file)?;
        }
        Commands::Next { file } => {
            cmd_next(&file)?;
        }
        Commands::Transition { file, status } => {
            cmd_transition(&file, status)?;
        }
        Commands::Phase { file, phase, status } => {
            cmd_phase(&file, &phase, status)?;
        }
        Commands::Branches { file, pattern } => {
            cmd_branches(&file, pattern.as_deref())?;
        }
        Commands::List { dir, format } => {
            cmd_list(dir, &format)?;
        }
        Commands::Config { path } => {
            cmd_config(path)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

fn load_plan(file: &Path) -> Result<Plan> {
    plan::parse_file(file).with_context(|| format!("Failed to read plan {}", file.display()))
}

/// Create a new plan file.
fn cmd_new(
    title: &str,
    id: Option<String>,
    author: Option<String>,
    issue: Option<String>,
    output: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let config = Config::load()?;

    let id = id.unwrap_or_else(|| slugify(title));
    if id.is_empty() {
        anyhow::bail!("Cannot derive a plan ID from title '{title}'; pass --id");
    }

    let author = author
        .or_else(|| config.general.author.clone())
        .or_else(|| std::env::var("USER").ok())
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("No author given; pass --author or set general.author"))?;

    let path = output.unwrap_or_else(|| config.plans_dir().join(format!("{id}.md")));
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let mut plan = Plan::new(id, title, author);
    plan.issue_id = issue;
    plan.reviewers = config.reviewers;

    plan::save_file(&mut plan, &path)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Validate a plan file.
fn cmd_validate(file: &Path) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read plan {}", file.display()))?;

    plan::validate_structure(&content)?;
    let plan = plan::parse(&content)?;
    plan.validate()?;

    println!("{}: valid ({} phases)", file.display(), plan.phases.len());
    Ok(())
}

/// Show a plan.
fn cmd_show(file: &Path, format: &str) -> Result<()> {
    let plan = load_plan(file)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&plan)?;
            println!("{json}");
        }
        _ => {
            println!("{} ({})", plan.title, plan.id);
            println!("  Status:  {}", plan.status);
            println!("  Author:  {}", plan.author);
            println!("  Created: {}", plan.created.format("%Y-%m-%d %H:%M UTC"));
            if let Some(issue) = &plan.issue_id {
                println!("  Issue:   {issue}");
            }

            if !plan.phases.is_empty() {
                println!("\nPhases:");
                for phase in &plan.phases {
                    println!("  {}", phase_line(phase));
                }
            }

            if !plan.problem_statement.is_empty() {
                println!("\nProblem:\n  {}", plan.problem_statement);
            }
            if !plan.proposed_solution.is_empty() {
                println!("\nSolution:\n  {}", plan.proposed_solution);
            }
            if !plan.questions_answers.is_empty() {
                println!("\nOpen questions answered: {}", plan.questions_answers.len());
            }
        }
    }

    Ok(())
}

fn phase_line(phase: &Phase) -> String {
    let marker = match phase.status {
        PhaseStatus::Complete => "[x]",
        PhaseStatus::InProgress => "[~]",
        PhaseStatus::Blocked => "[!]",
        PhaseStatus::Pending => "[ ]",
    };
    let mut line = format!("{marker} {} - {}", phase.id, phase.title);
    if !phase.depends_on.is_empty() {
        line.push_str(&format!(" (after {})", phase.depends_on.join(", ")));
    }
    line
}

/// Print dependency levels.
fn cmd_levels(file: &Path) -> Result<()> {
    let plan = load_plan(file)?;
    plan.validate()?;

    for (i, level) in plan.phase_levels().iter().enumerate() {
        let ids: Vec<_> = level.iter().map(|p| p.id.as_str()).collect();
        println!("Level {}: {}", i + 1, ids.join(", "));
    }
    Ok(())
}

/// Print phases that can start.
fn cmd_next(file: &Path) -> Result<()> {
    let plan = load_plan(file)?;

    let next = plan.next_phases();
    if next.is_empty() {
        println!("No phases can start now");
    }
    for phase in next {
        println!("{} - {}", phase.id, phase.title);
    }

    let blocked = plan.blocked_phases();
    if !blocked.is_empty() {
        let ids: Vec<_> = blocked.iter().map(|p| p.id.as_str()).collect();
        println!("\nBlocked: {}", ids.join(", "));
    }
    Ok(())
}

/// Change the plan status and save.
fn cmd_transition(file: &Path, status: PlanStatus) -> Result<()> {
    let mut plan = load_plan(file)?;
    let from = plan.status;

    plan.transition_to(status)?;
    plan::save_file(&mut plan, file)?;

    println!("{}: {from} -> {status}", plan.id);
    Ok(())
}

/// Change a phase status and save.
fn cmd_phase(file: &Path, phase_id: &str, status: PhaseStatus) -> Result<()> {
    let mut plan = load_plan(file)?;
    let before = plan.status;

    plan.set_phase_status(phase_id, status)?;
    plan::save_file(&mut plan, file)?;

    println!("{phase_id}: {status}");
    if plan.status != before {
        println!("{}: {before} -> {}", plan.id, plan.status);
    }
    Ok(())
}

/// Print branch names.
fn cmd_branches(file: &Path, pattern: Option<&str>) -> Result<()> {
    let mut plan = load_plan(file)?;
    let config = Config::load()?;

    plan.assign_branches(pattern.unwrap_or(&config.branches.pattern));
    for phase in &plan.phases {
        println!("{}\t{}", phase.id, phase.branch.as_deref().unwrap_or_default());
    }
    Ok(())
}

/// List plans in a directory.
fn cmd_list(dir: Option<PathBuf>, format: &str) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => Config::load()?.plans_dir(),
    };
    let plans = plan::discover_plans(&dir)?;

    match format {
        "json" => {
            let list: Vec<_> = plans.iter().map(|(_, plan)| plan).collect();
            let json = serde_json::to_string_pretty(&list)?;
            println!("{json}");
        }
        _ => {
            for (path, plan) in &plans {
                println!("{}\t{}\t{}\t{}", plan.id, plan.status, plan.title, path.display());
            }
            println!("\nTotal: {} plans", plans.len());
        }
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        match Config::active_path().or_else(Config::config_dir) {
            Some(path) => println!("{}", path.display()),
            None => println!("(no config directory)"),
        }
        return Ok(());
    }

    let config = Config::load()?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "plandoc", &mut io::stdout());
}

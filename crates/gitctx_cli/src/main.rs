//! gitctx CLI - version control for the reasoning behind a codebase.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use gitctx_core::ContextError;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "gitctx")]
#[command(about = "Branch, commit and merge the context behind your code", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,
    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a context repository
    Init,
    /// Create a branch
    Branch {
        /// Branch name (may contain '/', e.g. feature/auth)
        name: String,
        /// Branch to copy (defaults to the current branch)
        #[arg(long)]
        from: Option<String>,
        /// Stay on the current branch
        #[arg(long)]
        no_checkout: bool,
    },
    /// List branches
    Branches,
    /// Switch to another branch
    Checkout {
        /// Branch name
        name: String,
    },
    /// Record a context commit on the current branch
    Commit {
        /// Commit message (generated from changed files if omitted)
        #[arg(short, long)]
        message: Option<String>,
        /// Decisions to record (comma-separated or repeated)
        #[arg(short, long = "decisions", value_delimiter = ',')]
        decisions: Vec<String>,
        /// JSON file with one reasoning log or an array of them; repeatable
        #[arg(long = "ota-file", value_name = "FILE")]
        ota_files: Vec<PathBuf>,
        /// Attach the staged reasoning logs
        #[arg(long)]
        staged: bool,
    },
    /// Stage one thought/action/result log for the next commit
    Ota {
        /// What was considered
        #[arg(short, long)]
        thought: String,
        /// What was done
        #[arg(short, long)]
        action: String,
        /// What came of it
        #[arg(short, long)]
        result: String,
        /// Affected files (comma-separated or repeated)
        #[arg(short, long, value_delimiter = ',')]
        files: Vec<String>,
    },
    /// List staged reasoning logs
    Staged {
        /// Discard them instead
        #[arg(long)]
        clear: bool,
    },
    /// Merge a branch into the current branch and delete it
    Merge {
        /// Branch to merge
        branch: String,
        /// Copy commits instead of squashing them into one summary
        #[arg(long)]
        no_squash: bool,
    },
    /// Show commit history
    Log {
        /// Branch (defaults to the current branch)
        #[arg(short, long)]
        branch: Option<String>,
        /// Maximum number of commits to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
        /// Output format
        #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
        format: LogFormat,
    },
    /// Show the current branch and pending changes
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one commit
    Show {
        /// Commit id
        id: String,
        /// Only search this branch
        #[arg(short, long)]
        branch: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a branch and its storage
    DeleteBranch {
        /// Branch name
        name: String,
    },
    /// List archived branches
    Archives,
    /// Remove old files from the temp directory
    Cleanup {
        /// Remove files older than this many hours
        #[arg(long, default_value = "24")]
        hours: u64,
    },
    /// Print the effective configuration
    Config,
}

/// How `log` prints commits
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Header, decisions and squash info per commit
    Pretty,
    /// One line per commit
    Oneline,
    /// JSON array, oldest first
    Json,
}

fn run(cli: Cli) -> Result<()> {
    let repo = cli.repo.as_path();
    match cli.command {
        Commands::Init => commands::init::run(repo),
        Commands::Branch {
            name,
            from,
            no_checkout,
        } => commands::branch::create(repo, &name, from.as_deref(), !no_checkout),
        Commands::Branches => commands::branch::list(repo),
        Commands::Checkout { name } => commands::branch::checkout(repo, &name),
        Commands::Commit {
            message,
            decisions,
            ota_files,
            staged,
        } => commands::commit::run(repo, message, decisions, &ota_files, staged),
        Commands::Ota {
            thought,
            action,
            result,
            files,
        } => commands::ota::add(repo, &thought, &action, &result, files),
        Commands::Staged { clear: false } => commands::ota::list(repo),
        Commands::Staged { clear: true } => commands::ota::clear(repo),
        Commands::Merge { branch, no_squash } => commands::merge::run(repo, &branch, !no_squash),
        Commands::Log {
            branch,
            limit,
            format,
        } => commands::log::log(repo, branch.as_deref(), limit, format),
        Commands::Status { json } => commands::status::run(repo, json),
        Commands::Show { id, branch, json } => {
            commands::log::show(repo, &id, branch.as_deref(), json)
        }
        Commands::DeleteBranch { name } => commands::branch::delete(repo, &name),
        Commands::Archives => commands::maintenance::archives(repo),
        Commands::Cleanup { hours } => commands::maintenance::cleanup(repo, hours),
        Commands::Config => commands::maintenance::config(repo),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Respects RUST_LOG (e.g. RUST_LOG=gitctx_core=debug)
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            let hint = e
                .chain()
                .find_map(|cause| cause.downcast_ref::<ContextError>())
                .and_then(ContextError::recovery_suggestion);
            if let Some(hint) = hint {
                eprintln!("  {} {}", style("hint:").cyan(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "metabolikal-sync")]
#[command(about = "Offline completion queue for daily plan tracking")]
#[command(long_about = "metabolikal-sync - offline completion queue

Records completion toggles for daily plan items (diet, supplements,
workouts, lifestyle) while the backend is unreachable, cancels out
toggles that undo each other, and pushes the rest once connectivity
returns.

QUICK START:
  metabolikal-sync queue complete meal-42 --plan diet    Queue a completion
  metabolikal-sync list                                  Show pending actions
  metabolikal-sync sync run                              Push pending actions

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  metabolikal-sync <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output or 'json' for
    /// machine-readable output. Defaults to `general.default_output` from
    /// the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Data directory (defaults to ~/.metabolikal)
    #[arg(long, global = true, env = "METABOLIKAL_HOME")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Queue a completion toggle
    ///
    /// A toggle that undoes a pending toggle for the same item and day
    /// cancels it out instead of being queued.
    ///
    /// # Examples
    ///
    ///   metabolikal-sync queue complete meal-42 --plan diet
    ///   metabolikal-sync queue uncomplete w-7 --plan workout --date yesterday
    #[command(alias = "q")]
    Queue(QueueArgs),

    /// Show the pending action for an item
    ///
    /// Without --date, reports the most recently queued action for the
    /// item on any day.
    Pending {
        /// Item ID
        source_id: String,

        /// Day to check (YYYY-MM-DD, today, yesterday, +N, -N)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },

    /// List pending actions
    #[command(alias = "ls")]
    List,

    /// Show queue statistics
    Status,

    /// Drop every pending action
    Clear {
        /// Confirm dropping unsynced actions
        #[arg(long)]
        force: bool,
    },

    /// Push pending actions to the ledger
    Sync(SyncArgs),

    /// Show confirmed completions
    Ledger {
        /// Only show completions for this day
        #[arg(long, short = 'd')]
        date: Option<String>,
    },

    /// Compute the plan day for a date
    ///
    /// Day 1 is the start date. With --cycle, day numbers wrap so a plan
    /// repeats every N days.
    PlanDay {
        /// First day of the plan
        #[arg(long, short = 's')]
        start: String,

        /// Day to compute (defaults to today)
        #[arg(long, short = 'd')]
        date: Option<String>,

        /// Plan cycle length in days
        #[arg(long, short = 'c')]
        cycle: Option<u32>,
    },

    /// Generate shell completions
    ///
    /// Example: metabolikal-sync completions bash > ~/.bash_completion.d/metabolikal-sync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,

        /// Show installation instructions
        #[arg(long, short = 'i')]
        install: bool,
    },
}

/// Arguments for queuing a toggle.
#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

/// Queue subcommands.
#[derive(Subcommand)]
pub enum QueueCommands {
    /// Mark an item completed
    #[command(alias = "done")]
    Complete(ToggleArgs),

    /// Mark an item not completed
    #[command(alias = "undo")]
    Uncomplete(ToggleArgs),
}

/// Target of a completion toggle.
#[derive(Args)]
pub struct ToggleArgs {
    /// Item ID
    pub source_id: String,

    /// Plan type (diet, supplement, workout, lifestyle)
    #[arg(long, short = 'p')]
    pub plan: String,

    /// Day the toggle applies to (YYYY-MM-DD, today, yesterday, +N, -N)
    #[arg(long, short = 'd', default_value = "today")]
    pub date: String,
}

/// Arguments for sync.
#[derive(Args)]
pub struct SyncArgs {
    #[command(subcommand)]
    pub command: SyncCommands,
}

/// Sync subcommands.
#[derive(Subcommand)]
pub enum SyncCommands {
    /// Push pending actions
    Run {
        /// Show what would be pushed without pushing
        #[arg(long)]
        dry_run: bool,

        /// Stop on first error
        #[arg(long)]
        stop_on_error: bool,

        /// Treat the backend as unreachable; nothing is pushed
        #[arg(long)]
        offline: bool,
    },

    /// Reset attempt counters so skipped actions are retried
    Retry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_output_format_default() {
        let cli = Cli::try_parse_from(["metabolikal-sync", "list"]).unwrap();
        assert!(cli.output.is_none());
    }

    #[test]
    fn test_cli_output_format_short() {
        let cli = Cli::try_parse_from(["metabolikal-sync", "-o", "json", "status"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_queue_complete() {
        let cli = Cli::try_parse_from([
            "metabolikal-sync",
            "queue",
            "complete",
            "meal-42",
            "--plan",
            "diet",
            "--date",
            "2026-01-27",
        ])
        .unwrap();

        match cli.command {
            Commands::Queue(args) => match args.command {
                QueueCommands::Complete(t) => {
                    assert_eq!(t.source_id, "meal-42");
                    assert_eq!(t.plan, "diet");
                    assert_eq!(t.date, "2026-01-27");
                }
                QueueCommands::Uncomplete(_) => panic!("expected complete"),
            },
            _ => panic!("expected queue command"),
        }
    }

    #[test]
    fn test_cli_queue_date_defaults_to_today() {
        let cli = Cli::try_parse_from(["metabolikal-sync", "q", "undo", "w-7", "-p", "workout"])
            .unwrap();

        match cli.command {
            Commands::Queue(args) => match args.command {
                QueueCommands::Uncomplete(t) => assert_eq!(t.date, "today"),
                QueueCommands::Complete(_) => panic!("expected uncomplete"),
            },
            _ => panic!("expected queue command"),
        }
    }

    #[test]
    fn test_cli_queue_requires_plan() {
        assert!(Cli::try_parse_from(["metabolikal-sync", "queue", "complete", "x"]).is_err());
    }

    #[test]
    fn test_cli_sync_run_flags() {
        let cli = Cli::try_parse_from([
            "metabolikal-sync",
            "sync",
            "run",
            "--dry-run",
            "--offline",
        ])
        .unwrap();

        match cli.command {
            Commands::Sync(args) => match args.command {
                SyncCommands::Run {
                    dry_run,
                    stop_on_error,
                    offline,
                } => {
                    assert!(dry_run);
                    assert!(!stop_on_error);
                    assert!(offline);
                }
                SyncCommands::Retry => panic!("expected run"),
            },
            _ => panic!("expected sync command"),
        }
    }

    #[test]
    fn test_cli_plan_day() {
        let cli = Cli::try_parse_from([
            "metabolikal-sync",
            "plan-day",
            "--start",
            "2026-01-01",
            "--cycle",
            "7",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::PlanDay { cycle: Some(7), date: None, .. }
        ));
    }

    #[test]
    fn test_cli_completions_shell() {
        let cli = Cli::try_parse_from(["metabolikal-sync", "completions", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Zsh, install: false }
        ));
    }

    #[test]
    fn test_cli_home_flag() {
        let cli = Cli::try_parse_from(["metabolikal-sync", "--home", "/tmp/mk", "list"]).unwrap();
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/mk")));
    }
}

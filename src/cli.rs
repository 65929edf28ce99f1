use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "plugctl")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Plan and apply plugin lifecycle changes", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Scenario file (.toml or .json, default: ~/.config/plugctl/scenario.toml)
    #[arg(short, long, global = true, env = "PLUGCTL_SCENARIO")]
    pub scenario: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compute the execution plan without running it
    Plan(PlanArgs),

    /// Run the apply loop against a simulated host
    Apply(ApplyArgs),

    /// Show final severities, running set and quarantine
    Status(StatusArgs),

    /// Check the scenario for dangling references
    Validate,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Also stop eager components that are already running
    #[arg(long)]
    pub stop_eager_running: bool,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Also stop eager components that are already running
    #[arg(long)]
    pub stop_eager_running: bool,

    /// Make the simulated host fail when starting this component (repeatable)
    #[arg(long = "fail", value_name = "COMPONENT")]
    pub fail: Vec<String>,

    /// Apply again after a failure, until nothing fails
    #[arg(long)]
    pub retry: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Print status as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply_flags() {
        let cli = Cli::parse_from([
            "plugctl",
            "-vv",
            "apply",
            "--fail",
            "vim",
            "--fail",
            "emacs",
            "--stop-eager-running",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.fail, vec!["vim", "emacs"]);
                assert!(args.stop_eager_running);
                assert!(!args.retry);
            }
            _ => panic!("expected apply"),
        }
    }

    #[test]
    fn test_scenario_is_global() {
        let cli = Cli::parse_from(["plugctl", "plan", "--scenario", "s.toml", "--json"]);
        assert_eq!(cli.scenario.as_deref(), Some("s.toml"));
    }
}

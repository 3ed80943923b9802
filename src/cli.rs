use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// appmerge - headless driver for the app content merge wizard
#[derive(Parser)]
#[command(name = "appmerge")]
#[command(about = "Merge screens, data sources, files and settings between hosted apps")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a merge plan file
    Validate {
        /// Path to the merge plan JSON file
        plan: PathBuf,
    },
    /// Run a scripted merge session against the in-memory service
    Simulate {
        /// Path to the merge plan JSON file
        #[arg(short, long)]
        plan: PathBuf,

        /// Lock duration granted by the simulated service, in seconds
        #[arg(long, default_value_t = 600)]
        lock_secs: u64,

        /// Inject a lock-acquisition failure to exercise the error path
        #[arg(long)]
        fail_lock: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from the process environment
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subcommand_parses() {
        let cli = Cli::try_parse_from(["appmerge", "validate", "plan.json"])
            .expect("Should parse");
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::try_parse_from(["appmerge", "simulate", "--plan", "plan.json"])
            .expect("Should parse");
        match cli.command {
            Commands::Simulate {
                lock_secs,
                fail_lock,
                ..
            } => {
                assert_eq!(lock_secs, 600);
                assert!(!fail_lock);
            }
            _ => panic!("Expected simulate"),
        }
    }

    #[test]
    fn test_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["appmerge"]).is_err());
    }
}

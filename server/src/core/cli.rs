use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DEBUG, ENV_HOST, ENV_PORT, ENV_RETENTION_MAX_LIFETIME_DAYS,
    ENV_RETENTION_MAX_NUM_ENTRIES, ENV_SERIES_LIMIT,
};

#[derive(Parser)]
#[command(name = "statline")]
#[command(version, about = "Typed metric store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode (verbose request logging)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Default maximum value age in days for new parameters (0 = unlimited)
    #[arg(long, global = true, env = ENV_RETENTION_MAX_LIFETIME_DAYS)]
    pub max_lifetime_days: Option<i64>,

    /// Default maximum entry count for new parameters
    #[arg(long, global = true, env = ENV_RETENTION_MAX_NUM_ENTRIES)]
    pub max_num_entries: Option<i64>,

    /// Default number of values returned by series reads
    #[arg(long, global = true, env = ENV_SERIES_LIMIT)]
    pub series_limit: Option<usize>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (the metric database). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub max_lifetime_days: Option<i64>,
    pub max_num_entries: Option<i64>,
    pub series_limit: Option<usize>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        max_lifetime_days: cli.max_lifetime_days,
        max_num_entries: cli.max_num_entries,
        series_limit: cli.series_limit,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_prune() {
        let cli = Cli::try_parse_from(["statline", "system", "prune", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::System {
                command: SystemCommands::Prune { yes: true }
            })
        ));
    }

    #[test]
    fn test_parse_start_with_flags() {
        let cli = Cli::try_parse_from([
            "statline",
            "start",
            "--port",
            "6000",
            "--series-limit",
            "50",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Start)));
        assert_eq!(cli.port, Some(6000));
        assert_eq!(cli.series_limit, Some(50));
    }
}

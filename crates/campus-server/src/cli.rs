use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI parser for the `campus` binary.
#[derive(Debug, Parser)]
#[command(name = "campus", version, about = "Campus - language school management server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Explicit config file, layered above the user and project files
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Interface to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create or upgrade the database schema
    Migrate,
    /// Insert demo users and courses
    Seed,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Cli, Commands};

    #[test]
    fn clap_command_tree_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "campus",
            "serve",
            "--port",
            "8080",
            "--config",
            "campus.toml",
            "-v",
        ])
        .expect("cli should parse");

        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("campus.toml")));
        match cli.command {
            Commands::Serve { host, port } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(8080));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn bare_subcommands() {
        let cli = Cli::try_parse_from(["campus", "--quiet", "migrate"]).expect("cli should parse");
        assert!(cli.quiet);
        assert!(matches!(cli.command, Commands::Migrate));
        assert!(Cli::try_parse_from(["campus"]).is_err());
    }
}

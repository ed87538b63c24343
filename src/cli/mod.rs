//! CLI argument definitions for studbook.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Studbook - pedigree viewer and account client for the studbook registry.
///
/// Log in with `studbook login`, then `studbook tree <animal-id>` to draw a pedigree.
#[derive(Parser, Debug)]
#[command(name = "studbook")]
#[command(
    author,
    version,
    about = "Pedigree viewer and account client for the studbook registry",
    long_about = None
)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Path to config.kdl (defaults to the platform config directory)
    #[arg(long, global = true, env = "STUDBOOK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the studbook API (overrides STUDBOOK_API_URL and config.kdl)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// File the session token is stored in (overrides STUDBOOK_TOKEN_FILE and config.kdl)
    #[arg(long, global = true)]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        /// Account email
        #[arg(long)]
        email: String,

        /// Account password (or STUDBOOK_PASSWORD)
        #[arg(long, env = "STUDBOOK_PASSWORD", hide_env_values = true)]
        password: String,

        /// Log in through the administrator endpoint
        #[arg(long)]
        admin: bool,
    },

    /// Register a new organization on a 14-day trial, then log in
    Register {
        /// Organization name
        #[arg(long)]
        name: String,

        /// Contact email, also the login
        #[arg(long)]
        email: String,

        /// Account password (or STUDBOOK_PASSWORD)
        #[arg(long, env = "STUDBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the stored session, trial status and days remaining
    Whoami {
        /// Evaluate at this time instead of now (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        at: Option<String>,
    },

    /// Check whether the stored session may open an application path
    Access {
        /// Application path, e.g. /dashboard/animals
        path: String,

        /// Evaluate at this time instead of now (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        at: Option<String>,
    },

    /// Build and draw the pedigree of an animal
    Tree {
        /// Animal ID to fetch the ancestry of
        #[arg(required_unless_present = "input")]
        animal_id: Option<String>,

        /// Read the ancestry from a JSON file instead of the API
        #[arg(long, conflicts_with = "animal_id")]
        input: Option<PathBuf>,

        /// Write the drawing as SVG to this file
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Drawing orientation (overrides config.kdl)
        #[arg(long, value_parser = ["horizontal", "vertical"])]
        layout: Option<String>,

        /// Drawing width in pixels
        #[arg(long, default_value_t = 900.0)]
        width: f64,

        /// Drawing height in pixels
        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },

    /// Animal registry commands
    Animals {
        #[command(subcommand)]
        command: AnimalCommands,
    },

    /// Subscription plan commands
    Plans {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Organization commands (administrators only)
    Orgs {
        #[command(subcommand)]
        command: OrgCommands,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Animal subcommands
#[derive(Subcommand, Debug)]
pub enum AnimalCommands {
    /// List the organization's animals
    List,

    /// Show one animal
    Show {
        /// Animal ID
        id: String,
    },
}

/// Plan subcommands
#[derive(Subcommand, Debug)]
pub enum PlanCommands {
    /// List available subscription plans
    List,
}

/// Organization subcommands
#[derive(Subcommand, Debug)]
pub enum OrgCommands {
    /// List all organizations
    List,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // This will panic if the CLI is misconfigured
        Cli::command().debug_assert();
    }

    #[test]
    fn test_tree_requires_id_or_input() {
        assert!(Cli::try_parse_from(["studbook", "tree"]).is_err());
        assert!(Cli::try_parse_from(["studbook", "tree", "a1"]).is_ok());
        assert!(Cli::try_parse_from(["studbook", "tree", "--input", "p.json"]).is_ok());
        assert!(Cli::try_parse_from(["studbook", "tree", "a1", "--input", "p.json"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["studbook", "whoami", "-H", "--api-url", "http://x"]).unwrap();
        assert!(cli.human_readable);
        assert_eq!(cli.api_url.as_deref(), Some("http://x"));
        assert!(matches!(cli.command, Commands::Whoami { at: None }));
    }

    #[test]
    fn test_layout_values_restricted() {
        assert!(Cli::try_parse_from(["studbook", "tree", "a1", "--layout", "diagonal"]).is_err());
    }
}

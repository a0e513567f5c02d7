//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plume, a single-document blog engine
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root; config and storage paths are relative to it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: plume.toml)
    #[arg(short = 'C', long, default_value = "plume.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a default config and an empty site document
    Init,

    /// Serve the blog and its dashboard
    Serve {
        /// Interface to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// The port you should provide
        #[arg(short, long)]
        port: Option<u16>,

        /// Local development mode: pretty JSON, no host redirect, no outbound webmentions
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        local: Option<bool>,
    },

    /// Print the hash to put in `[auth] password_hash`
    Passhash {
        /// Plain-text password
        password: String,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["plume", "--root", "site", "serve", "-p", "9000", "--local"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        assert_eq!(cli.config, PathBuf::from("plume.toml"));
        match cli.command {
            Commands::Serve { interface, port, local } => {
                assert_eq!(interface, None);
                assert_eq!(port, Some(9000));
                assert_eq!(local, Some(true));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_passhash() {
        let cli = Cli::parse_from(["plume", "-C", "other.toml", "passhash", "secret"]);
        assert_eq!(cli.config, PathBuf::from("other.toml"));
        assert!(matches!(cli.command, Commands::Passhash { ref password } if password == "secret"));
        assert!(!cli.is_init());
    }
}

//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "ahkforge",
    version,
    about = "Validate and upgrade AutoHotkey v2 scripts"
)]
pub struct Cli {
    /// Emit JSON reports instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file [default: $XDG_CONFIG_HOME/ahkforge/config.toml]
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override sanitize.max_passes
    #[arg(long, global = true, value_name = "N")]
    pub max_passes: Option<usize>,

    /// Never color output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate scripts without changing them
    Check {
        /// Script files or directories of *.ahk files
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Convert legacy syntax and report what changed
    Fix {
        /// Script files or directories of *.ahk files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write the result back instead of printing a diff
        #[arg(long)]
        write: bool,

        /// Prepend a comment header naming the applied rules
        #[arg(long)]
        annotate: bool,
    },

    /// Read a model response on stdin and print the sanitized script
    Extract,

    /// Print the request body for a generation prompt
    Payload {
        /// What the script should do
        prompt: String,
    },

    /// List the rule library
    Rules,

    /// Interactive session
    Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "ahkforge", "fix", "a.ahk", "scripts", "--write", "--json", "--max-passes", "5",
        ])
        .unwrap();

        assert!(cli.json);
        assert_eq!(cli.max_passes, Some(5));
        match cli.command {
            Command::Fix {
                paths,
                write,
                annotate,
            } => {
                assert_eq!(paths, vec![PathBuf::from("a.ahk"), PathBuf::from("scripts")]);
                assert!(write);
                assert!(!annotate);
            }
            other => panic!("expected fix, got {other:?}"),
        }
    }

    #[test]
    fn check_requires_a_path() {
        assert!(Cli::try_parse_from(["ahkforge", "check"]).is_err());
    }

    #[test]
    fn extract_takes_no_arguments() {
        let cli = Cli::try_parse_from(["ahkforge", "--config", "c.toml", "extract"]).unwrap();
        assert!(matches!(cli.command, Command::Extract));
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }
}

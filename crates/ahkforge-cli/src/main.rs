//! ahkforge: validate and upgrade AutoHotkey v2 scripts.
//!
//! # Usage
//!
//! ```bash
//! ahkforge check scripts/
//! ahkforge fix hotkeys.ahk --write
//! curl ... | ahkforge extract > generated.ahk
//! ```
//!
//! Exit status is 0 when every script is valid, 2 when any is not, and 1 on
//! errors such as unreadable files.

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ahkforge_cli::{App, Cli, Command, FixOptions, Output};
use ahkforge_kernel::Config;

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("ahkforge=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(passes) = cli.max_passes {
        config.sanitize.max_passes = passes;
    }
    config.validate().context("Invalid configuration")?;

    let output = Output {
        json: cli.json,
        color: !cli.no_color
            && std::env::var_os("NO_COLOR").is_none()
            && io::stdout().is_terminal(),
    };
    let app = App::new(config, output).context("Failed to build rule library")?;

    let mut out = io::stdout().lock();
    let valid = match cli.command {
        Command::Check { paths } => app.check(&paths, &mut out)?,
        Command::Fix {
            paths,
            write,
            annotate,
        } => app.fix(&paths, FixOptions { write, annotate }, &mut out)?,
        Command::Extract => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read stdin")?;
            app.extract(&raw, &mut out, &mut io::stderr())?
        }
        Command::Payload { prompt } => app.payload(&prompt, &mut out)?,
        Command::Rules => app.rules(&mut out)?,
        Command::Shell => {
            drop(out);
            ahkforge_cli::shell::run(app)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

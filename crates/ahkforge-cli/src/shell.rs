//! Interactive session.
//!
//! Plain lines are converted as they are typed and collected into a buffer;
//! `/validate` runs the full pipeline over the buffer. Slash commands work on
//! files and share the process-wide cache, so repeated `/check` calls on an
//! unchanged file are cache hits.

use std::path::{Path, PathBuf};

use ahkforge_kernel::converter::convert;
use ahkforge_kernel::paths;
use ahkforge_types::ScriptText;
use anyhow::{Context, Result};
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

use crate::app::{App, FixOptions};
use crate::report::{render_fix, render_messages};

const HELP_TEXT: &str = r#"ahkforge shell

Type AutoHotkey lines to convert them one at a time. Lines are kept in a
buffer until /reset.

Commands:
  /check <path>...    Validate files (cached by modification time)
  /fix <path>...      Show what fixing files would change
  /validate           Sanitize the buffer and print the verdict
  /show               Print the buffer
  /reset              Empty the buffer
  /rules              List the rule library
  /stats              Cache hits, misses and size
  /clear [path]       Drop one cache entry, or all of them
  /help               This text
  /quit               Leave
"#;

pub struct Shell {
    app: App,
    buffer: Vec<String>,
    done: bool,
}

impl Shell {
    pub fn new(app: App) -> Self {
        Self {
            app,
            buffer: Vec::new(),
            done: false,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Set once `/quit` has been processed.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn buffer(&self) -> ScriptText {
        ScriptText::from_lines(self.buffer.iter())
    }

    /// Process one line of input. `Ok(None)` means nothing to print.
    pub fn process_line(&mut self, line: &str) -> Result<Option<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed);
        }
        Ok(Some(self.convert_line(line)))
    }

    fn convert_line(&mut self, line: &str) -> String {
        let p = self.app.painter();
        let library = self.app.sanitizer().library();
        let conversion = convert(&ScriptText::new(line), library);

        let converted = conversion.text.line(1).unwrap_or(line).to_string();
        let mut out = converted.clone();
        for record in &conversion.records {
            out.push_str(&format!("\n  {} {}", p.note("converted"), record.rule));
        }
        for v in &conversion.unconvertible {
            out.push_str(&format!(
                "\n  {}: {} ({})",
                p.warn("unconvertible"),
                v.rule,
                library.hint(&v.rule)
            ));
        }
        self.buffer.push(converted);
        out
    }

    fn handle_meta_command(&mut self, cmd: &str) -> Result<Option<String>> {
        let mut parts = cmd.split_whitespace();
        let command = parts.next().unwrap_or_default();
        let paths: Vec<PathBuf> = parts.map(PathBuf::from).collect();

        match command {
            "/quit" | "/q" | "/exit" => {
                self.done = true;
                Ok(None)
            }
            "/help" | "/h" | "/?" => Ok(Some(HELP_TEXT.trim_end().to_string())),
            "/check" => {
                require_paths(command, &paths)?;
                let mut out = Vec::new();
                self.app.check(&paths, &mut out)?;
                Ok(Some(to_output(out)))
            }
            "/fix" => {
                require_paths(command, &paths)?;
                let mut out = String::new();
                for path in &paths {
                    let (report, diff) = self.app.fix_file(path, FixOptions::default())?;
                    out.push_str(&render_fix(self.app.painter(), &report, diff.as_deref()));
                }
                Ok(Some(out.trim_end().to_string()))
            }
            "/validate" => {
                let sanitized = self.app.sanitizer().sanitize(&self.buffer());
                let p = self.app.painter();
                let verdict = if sanitized.is_valid() {
                    p.ok("VALID")
                } else {
                    p.bad("INVALID")
                };
                let messages = render_messages(p, &sanitized.result.messages);
                Ok(Some(format!("{verdict}\n{messages}").trim_end().to_string()))
            }
            "/show" => {
                if self.buffer.is_empty() {
                    Ok(Some("(buffer is empty)".to_string()))
                } else {
                    Ok(Some(self.buffer.join("\n")))
                }
            }
            "/reset" => {
                self.buffer.clear();
                Ok(None)
            }
            "/rules" => {
                let mut out = Vec::new();
                self.app.rules(&mut out)?;
                Ok(Some(to_output(out)))
            }
            "/stats" => {
                let stats = self.app.cache().stats();
                Ok(Some(format!(
                    "cache: {} entries, {} hits, {} misses",
                    stats.entries, stats.hits, stats.misses
                )))
            }
            "/clear" => match paths.as_slice() {
                [] => {
                    self.app.cache().clear();
                    Ok(Some("cache cleared".to_string()))
                }
                [path] => {
                    let removed = self.app.cache().clear_entry(path);
                    Ok(Some(if removed {
                        format!("dropped {}", path.display())
                    } else {
                        format!("{} was not cached", path.display())
                    }))
                }
                _ => anyhow::bail!("/clear takes at most one path"),
            },
            _ => Ok(Some(format!(
                "Unknown command: {command}\nType /help for available commands."
            ))),
        }
    }
}

fn require_paths(command: &str, paths: &[PathBuf]) -> Result<()> {
    if paths.is_empty() {
        anyhow::bail!("{command} needs at least one path");
    }
    Ok(())
}

fn to_output(bytes: Vec<u8>) -> String {
    String::from_utf8_lossy(&bytes).trim_end().to_string()
}

fn save_history(rl: &mut Editor<(), DefaultHistory>, path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = rl.save_history(path) {
        tracing::debug!(error = %e, "could not save history");
    }
}

/// Run the interactive loop until `/quit` or end of input.
pub fn run(app: App) -> Result<()> {
    println!("ahkforge v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.\n");

    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;
    let history = paths::history_file();
    let _ = rl.load_history(&history);

    let mut shell = Shell::new(app);
    while !shell.is_done() {
        match rl.readline("ahk> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match shell.process_line(&line) {
                    Ok(Some(output)) => println!("{output}"),
                    Ok(None) => {}
                    Err(e) => eprintln!("Error: {e:#}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    save_history(&mut rl, &history);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Output;
    use ahkforge_kernel::Config;

    fn shell() -> Shell {
        Shell::new(App::new(Config::default(), Output::default()).unwrap())
    }

    #[test]
    fn plain_line_is_converted_and_buffered() {
        let mut shell = shell();
        let out = shell.process_line("^j::MsgBox, Hello").unwrap().unwrap();

        assert!(out.starts_with("^j::MsgBox('Hello')\n"));
        assert!(out.contains("converted msgbox-command"));
        assert_eq!(shell.buffer().lines(), ["^j::MsgBox('Hello')"]);
    }

    #[test]
    fn detect_only_line_names_the_rule() {
        let mut shell = shell();
        let out = shell.process_line("Gosub, Menu").unwrap().unwrap();
        assert!(out.contains("unconvertible: gosub-command"));
    }

    #[test]
    fn validate_runs_over_the_whole_buffer() {
        let mut shell = shell();
        shell.process_line("F1::{").unwrap();
        let out = shell.process_line("/validate").unwrap().unwrap();
        assert!(out.starts_with("INVALID"));

        shell.process_line("}").unwrap();
        let out = shell.process_line("/validate").unwrap().unwrap();
        assert!(out.starts_with("VALID"));
    }

    #[test]
    fn check_then_stats_shows_cache_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ahk");
        std::fs::write(&path, "Sleep(1)\n").unwrap();
        let cmd = format!("/check {}", path.display());

        let mut shell = shell();
        shell.process_line(&cmd).unwrap();
        let out = shell.process_line(&cmd).unwrap().unwrap();
        assert!(out.contains("(cached)"));

        let stats = shell.process_line("/stats").unwrap().unwrap();
        assert_eq!(stats, "cache: 1 entries, 1 hits, 1 misses");

        let cleared = shell.process_line(&format!("/clear {}", path.display())).unwrap();
        assert_eq!(cleared, Some(format!("dropped {}", path.display())));
    }

    #[test]
    fn check_without_paths_is_an_error() {
        assert!(shell().process_line("/check").is_err());
    }

    #[test]
    fn quit_sets_done() {
        let mut shell = shell();
        assert_eq!(shell.process_line("/quit").unwrap(), None);
        assert!(shell.is_done());
    }

    #[test]
    fn unknown_command_points_at_help() {
        let out = shell().process_line("/frobnicate").unwrap().unwrap();
        assert!(out.starts_with("Unknown command: /frobnicate"));
    }
}

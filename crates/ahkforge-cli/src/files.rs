//! Script file access.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use ahkforge_types::ScriptText;
use anyhow::{Context, Result};
use tracing::{debug, warn};

pub const SCRIPT_EXTENSION: &str = "ahk";

/// A script read from disk.
#[derive(Debug, Clone)]
pub struct ScriptFile {
    pub path: PathBuf,
    pub text: ScriptText,
    pub modified: SystemTime,
}

fn is_script(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SCRIPT_EXTENSION))
}

/// Replace each directory with the `*.ahk` files directly inside it.
///
/// Files are passed through as given, whatever their extension. Directory
/// listings are sorted; subdirectories are not descended into.
pub fn expand_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            out.push(input.clone());
            continue;
        }

        let mut found = Vec::new();
        let entries = fs::read_dir(input)
            .with_context(|| format!("Failed to list {}", input.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list {}", input.display()))?
                .path();
            if is_script(&path) {
                found.push(path);
            }
        }
        found.sort();

        if found.is_empty() {
            warn!(dir = %input.display(), "no .{SCRIPT_EXTENSION} files");
        }
        debug!(dir = %input.display(), count = found.len(), "expanded directory");
        out.extend(found);
    }
    Ok(out)
}

pub fn read_script(path: &Path) -> Result<ScriptFile> {
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let modified = modified(path)?;
    Ok(ScriptFile {
        path: path.to_path_buf(),
        text: ScriptText::new(&source),
        modified,
    })
}

/// Write `text` to `path` and return the new modification time.
pub fn write_script(path: &Path, text: &ScriptText) -> Result<SystemTime> {
    fs::write(path, text.to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    modified(path)
}

fn modified(path: &Path) -> Result<SystemTime> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .with_context(|| format!("Failed to stat {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_expand_to_scripts_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.ahk"), "").unwrap();
        fs::write(dir.path().join("a.AHK"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.ahk"), "").unwrap();

        let explicit = dir.path().join("notes.txt");
        let paths = expand_paths(&[dir.path().to_path_buf(), explicit.clone()]).unwrap();

        assert_eq!(
            paths,
            vec![dir.path().join("a.AHK"), dir.path().join("b.ahk"), explicit]
        );
    }

    #[test]
    fn missing_file_passes_through_and_fails_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.ahk");

        assert_eq!(expand_paths(&[missing.clone()]).unwrap(), vec![missing.clone()]);
        let err = read_script(&missing).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[test]
    fn write_keeps_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.ahk");
        write_script(&path, &ScriptText::new("Sleep(1)\n")).unwrap();

        let back = read_script(&path).unwrap();
        assert_eq!(back.text.to_string(), "Sleep(1)\n");
    }

    #[test]
    fn write_keeps_bom_and_crlf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("win.ahk");
        fs::write(&path, "\u{feff}#Requires AutoHotkey v2.0\r\nSleep(1)\r\n").unwrap();

        let script = read_script(&path).unwrap();
        assert_eq!(script.text.line(1), Some("#Requires AutoHotkey v2.0"));
        write_script(&path, &script.text.with_lines(vec!["Sleep(2)".into()])).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"\xef\xbb\xbfSleep(2)\r\n");
    }
}

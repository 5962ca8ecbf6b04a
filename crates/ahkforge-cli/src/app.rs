//! Command implementations.
//!
//! Every command writes to a caller-supplied writer and returns whether all
//! scripts it looked at are valid. File I/O errors are `Err`; invalid scripts
//! are not.

use std::io::Write;
use std::path::{Path, PathBuf};

use ahkforge_kernel::generation::{GenerationRequest, script_from_response};
use ahkforge_kernel::{Config, GenerationConfig, RuleError, Sanitizer, ValidationCache};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::files;
use crate::report::{
    CheckReport, ExtractReport, FixReport, Painter, RuleRow, Summary, render_check, render_fix,
    render_messages, render_rules, unified_diff,
};

/// How results are presented.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub json: bool,
    pub color: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FixOptions {
    pub write: bool,
    pub annotate: bool,
}

/// Shared state for one process: the configured sanitizer and the cache.
#[derive(Debug)]
pub struct App {
    sanitizer: Sanitizer,
    generation: GenerationConfig,
    cache: ValidationCache,
    output: Output,
}

impl App {
    pub fn new(config: Config, output: Output) -> Result<Self, RuleError> {
        Ok(Self {
            sanitizer: Sanitizer::from_config(config.sanitize)?,
            generation: config.generation,
            cache: ValidationCache::new(),
            output,
        })
    }

    pub fn sanitizer(&self) -> &Sanitizer {
        &self.sanitizer
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    pub fn painter(&self) -> Painter {
        Painter::new(self.output.color && !self.output.json)
    }

    /// Check one file, reusing the cached verdict if its mtime is unchanged.
    pub fn check_file(&self, path: &Path) -> Result<CheckReport> {
        let script = files::read_script(path)?;
        let (result, cached) = self
            .cache
            .get_or_insert_with(&script.path, script.modified, || {
                self.sanitizer.check(&script.text)
            });
        Ok(CheckReport {
            path: script.path,
            valid: result.is_valid,
            cached,
            result,
        })
    }

    pub fn check<W: Write>(&self, inputs: &[PathBuf], out: &mut W) -> Result<bool> {
        let mut reports = Vec::new();
        for path in files::expand_paths(inputs)? {
            let report = self.check_file(&path)?;
            if !self.output.json {
                out.write_all(render_check(self.painter(), &report).as_bytes())?;
            }
            reports.push(report);
        }
        self.finish(reports, |r| r.valid, out)
    }

    /// Sanitize one file. Returns the report and, when the file changed but
    /// was not written, a unified diff of the change.
    pub fn fix_file(&self, path: &Path, options: FixOptions) -> Result<(FixReport, Option<String>)> {
        let script = files::read_script(path)?;
        let sanitized = self.sanitizer.sanitize(&script.text);
        let fixed = if options.annotate {
            sanitized.annotated()
        } else {
            sanitized.text.clone()
        };
        let changed = fixed != script.text;

        let mut diff = None;
        let written = changed && options.write;
        if written {
            let modified = files::write_script(&script.path, &fixed)?;
            self.cache
                .put(&script.path, modified, self.sanitizer.check(&fixed));
            info!(
                path = %script.path.display(),
                conversions = sanitized.records.len(),
                "rewrote script"
            );
        } else if changed {
            diff = Some(unified_diff(
                &script.path.display().to_string(),
                &script.text.to_string(),
                &fixed.to_string(),
            ));
        }

        let report = FixReport {
            valid: sanitized.is_valid(),
            changed,
            written,
            text: (changed && !written).then(|| fixed.to_string()),
            records: sanitized.records,
            result: sanitized.result,
            path: script.path,
        };
        Ok((report, diff))
    }

    pub fn fix<W: Write>(&self, inputs: &[PathBuf], options: FixOptions, out: &mut W) -> Result<bool> {
        let mut reports = Vec::new();
        for path in files::expand_paths(inputs)? {
            let (report, diff) = self.fix_file(&path, options)?;
            if !self.output.json {
                let rendered = render_fix(self.painter(), &report, diff.as_deref());
                out.write_all(rendered.as_bytes())?;
            }
            reports.push(report);
        }
        self.finish(reports, |r| r.valid, out)
    }

    /// Pull a script out of a raw model response and sanitize it.
    ///
    /// The script goes to `out`; in text mode the messages go to `diag`.
    pub fn extract<W: Write, D: Write>(&self, raw: &str, out: &mut W, diag: &mut D) -> Result<bool> {
        let script =
            script_from_response(raw).context("Failed to extract a script from the response")?;
        let sanitized = self.sanitizer.sanitize(&script);

        if self.output.json {
            let report = ExtractReport {
                valid: sanitized.is_valid(),
                text: sanitized.text.to_string(),
                records: sanitized.records,
                result: sanitized.result,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
            return Ok(report.valid);
        }

        let text = sanitized.text.to_string();
        out.write_all(text.as_bytes())?;
        if !text.ends_with('\n') {
            writeln!(out)?;
        }
        diag.write_all(render_messages(self.painter(), &sanitized.result.messages).as_bytes())?;
        Ok(sanitized.is_valid())
    }

    /// Print the request body for `prompt` against the configured endpoint.
    pub fn payload<W: Write>(&self, prompt: &str, out: &mut W) -> Result<bool> {
        let request = GenerationRequest::new(prompt, &self.generation);
        if self.generation.endpoint.is_empty() {
            warn!("no generation endpoint configured, assuming a completion API");
        }
        info!(api = request.api_kind().as_str(), chat = request.is_chat(), "built payload");
        serde_json::to_writer_pretty(&mut *out, &request.payload())?;
        writeln!(out)?;
        Ok(true)
    }

    pub fn rules<W: Write>(&self, out: &mut W) -> Result<bool> {
        let rules = self.sanitizer.library().rules();
        if self.output.json {
            let rows: Vec<RuleRow> = rules.iter().map(RuleRow::from).collect();
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        } else {
            out.write_all(render_rules(self.painter(), rules).as_bytes())?;
        }
        Ok(true)
    }

    fn finish<T, W>(&self, reports: Vec<T>, valid: impl Fn(&T) -> bool, out: &mut W) -> Result<bool>
    where
        T: Serialize,
        W: Write,
    {
        let summary = Summary::new(reports, valid);
        if self.output.json {
            serde_json::to_writer_pretty(&mut *out, &summary)?;
            writeln!(out)?;
        }
        Ok(summary.valid)
    }
}

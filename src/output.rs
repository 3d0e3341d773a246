//! Output and Reporting
//!
//! Formats processing results for the terminal: a human-readable report
//! scaled by verbosity, a JSON document, or a single summary line.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::io::IsTerminal;
use std::time::Duration;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::error::{Result, SchemaError};
use crate::processor::{DocumentResult, DocumentStatus, ProcessingResults};

pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: std::io::stdout().is_terminal(),
        }
    }

    pub fn with_colors(mut self, show_colors: bool) -> Self {
        self.show_colors = show_colors;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_results(&self, results: &ProcessingResults) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(self.format_human(results)),
            OutputFormat::Json => serde_json::to_string_pretty(results)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|e| SchemaError::Output(format!("JSON serialization failed: {}", e))),
            OutputFormat::Summary => Ok(format!("{}\n", format_summary_line(results))),
        }
    }

    fn format_human(&self, results: &ProcessingResults) -> String {
        let mut out = String::new();

        let listed = results.file_results.iter().filter(|result| match self.verbosity {
            VerbosityLevel::Quiet => result.status.is_failed(),
            VerbosityLevel::Normal => !result.status.is_built(),
            VerbosityLevel::Verbose | VerbosityLevel::Debug => true,
        });
        for result in listed {
            let _ = writeln!(out, "{}", self.format_file_result(result));
        }

        if self.verbosity > VerbosityLevel::Quiet {
            if !results.file_results.is_empty() {
                out.push('\n');
            }
            self.write_summary(&mut out, results);
        }
        out
    }

    pub fn format_file_result(&self, result: &DocumentResult) -> String {
        let mut out = String::new();
        let path = result.path.display();
        let duration = format_duration(result.duration);

        let _ = match &result.status {
            DocumentStatus::Built => write!(
                out,
                "{}  {} ({}) - {} schema{}, {} component{}",
                self.colorize("✓ BUILT", "32"),
                path,
                duration,
                result.schema_count,
                plural(result.schema_count),
                result.component_count,
                plural(result.component_count)
            ),
            DocumentStatus::Failed { message } => write!(
                out,
                "{}  {} ({}) - {}",
                self.colorize("✗ FAILED", "31"),
                path,
                duration,
                message
            ),
            DocumentStatus::Skipped { reason } => write!(
                out,
                "{}  {} - {}",
                self.colorize("- SKIPPED", "36"),
                path,
                reason
            ),
        };

        if result.status.is_built() && self.verbosity >= VerbosityLevel::Verbose {
            if let Some(namespace) = &result.target_namespace {
                let _ = write!(out, "\n    namespace: {}", namespace);
            }
            if result.unresolved_externals > 0 {
                let _ = write!(out, "\n    unresolved externals: {}", result.unresolved_externals);
            }
            for name in &result.unresolved_types {
                let _ = write!(out, "\n    unresolved type: {}", name);
            }
        }
        if self.verbosity == VerbosityLevel::Debug {
            for written in &result.outputs {
                let _ = write!(out, "\n    wrote {}", written.display());
            }
        }
        out
    }

    fn write_summary(&self, out: &mut String, results: &ProcessingResults) {
        let _ = writeln!(out, "Build Summary:");
        let _ = writeln!(out, "  Total files: {}", results.total_files);

        let counts = [
            ("Built:", "32", results.built_files, true),
            ("Failed:", "31", results.failed_files, false),
            ("Skipped:", "36", results.skipped_files, false),
        ];
        for (label, color, count, always) in counts {
            if always || count > 0 {
                let _ = writeln!(out, "  {} {}", self.colorize(label, color), count);
            }
        }

        let _ = writeln!(out, "  Components: {}", results.component_count());
        let unresolved = unresolved_by_name(results);
        if !unresolved.is_empty() {
            let _ = writeln!(out, "  Unresolved types: {}", unresolved.len());
            if self.verbosity >= VerbosityLevel::Verbose {
                for (name, documents) in &unresolved {
                    let _ = writeln!(
                        out,
                        "    {} ({} document{})",
                        name,
                        documents,
                        plural(*documents)
                    );
                }
            }
        }
        let written = results.output_count();
        if written > 0 {
            let _ = writeln!(out, "  Documents written: {}", written);
        }
        let _ = writeln!(out, "  Success rate: {:.1}%", results.success_rate());
        let _ = writeln!(out, "  Duration: {}", format_duration(results.total_duration));

        if self.verbosity == VerbosityLevel::Debug {
            let _ = writeln!(out, "  Discovery: {}", format_duration(results.discovery_duration));
            let _ = writeln!(out, "  Worker threads: {}", results.threads);
        }
    }
}

/// Distinct unresolved type names, with how many documents reported each
fn unresolved_by_name(results: &ProcessingResults) -> BTreeMap<&str, usize> {
    let mut names = BTreeMap::new();
    for name in results.file_results.iter().flat_map(|r| &r.unresolved_types) {
        *names.entry(name.as_str()).or_insert(0) += 1;
    }
    names
}

/// `12 files: 11 built, 1 failed, 0 skipped (250ms)`
pub fn format_summary_line(results: &ProcessingResults) -> String {
    format!(
        "{} file{}: {} built, {} failed, {} skipped ({})",
        results.total_files,
        plural(results.total_files),
        results.built_files,
        results.failed_files,
        results.skipped_files,
        format_duration(results.total_duration)
    )
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}

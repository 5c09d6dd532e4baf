//! Output layer shared by every `rankshift` command.
//!
//! Each command handler receives an [`OutputMode`]: pretty sections for a
//! terminal, compact text for pipes, or stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--format`
//! 2. `RANKSHIFT_FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use clap::ValueEnum;
use rankshift_core::{ErrorCode, GraphError, LevelError, SolverError, solution::SolutionError};
use rankshift_sim::SelectionError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Shared width for human pretty separators.
pub const PRETTY_RULE_WIDTH: usize = 72;

/// Write a horizontal separator used by pretty human output.
pub fn pretty_rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = PRETTY_RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn pretty_section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    pretty_rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    /// Sections and aligned key/value lines.
    Pretty,
    /// Plain text, stable across releases, for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

fn resolve_output_mode_inner(
    format_flag: Option<OutputMode>,
    format_env: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if let Some(mode) = format_flag {
        return mode;
    }

    if let Some(val) = format_env {
        match val.to_lowercase().as_str() {
            "json" => return OutputMode::Json,
            "text" => return OutputMode::Text,
            "pretty" => return OutputMode::Pretty,
            _ => {}
        }
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from the `--format` flag, environment, and TTY.
pub fn resolve_output_mode(format_flag: Option<OutputMode>) -> OutputMode {
    let env_val = std::env::var("RANKSHIFT_FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(format_flag, env_val.as_deref(), is_tty)
}

/// Render a serializable value with explicit pretty/text renderers.
pub fn render_mode<T: Serialize>(
    mode: OutputMode,
    value: &T,
    text_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
    pretty_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Text => text_fn(value, &mut out)?,
        OutputMode::Pretty => pretty_fn(value, &mut out)?,
    }
    out.flush()?;
    Ok(())
}

/// Machine-readable code of the outermost typed error in `err`'s chain.
pub fn error_code(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<SolverError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<LevelError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<GraphError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<SolutionError>() {
            Some(e.code())
        } else if let Some(e) = cause.downcast_ref::<SelectionError>() {
            Some(e.code())
        } else if cause.downcast_ref::<toml::de::Error>().is_some() {
            Some(ErrorCode::ConfigParseError)
        } else {
            None
        }
    })
}

/// Write `error[E####]: <summary>` and the remediation hint, if any.
pub fn render_error_code(w: &mut dyn Write, code: ErrorCode) -> io::Result<()> {
    writeln!(w, "error[{code}]: {}", code.message())?;
    if let Some(hint) = code.hint() {
        writeln!(w, "  hint: {hint}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_flag_wins_over_env() {
        let mode = resolve_output_mode_inner(Some(OutputMode::Text), Some("json"), true);
        assert_eq!(mode, OutputMode::Text);
    }

    #[test]
    fn env_selects_mode_case_insensitively() {
        assert_eq!(
            resolve_output_mode_inner(None, Some("JSON"), true),
            OutputMode::Json
        );
        assert_eq!(
            resolve_output_mode_inner(None, Some("pretty"), false),
            OutputMode::Pretty
        );
    }

    #[test]
    fn unknown_env_falls_through_to_tty() {
        assert_eq!(
            resolve_output_mode_inner(None, Some("fancy"), true),
            OutputMode::Pretty
        );
        assert_eq!(
            resolve_output_mode_inner(None, Some("fancy"), false),
            OutputMode::Text
        );
    }

    #[test]
    fn pretty_kv_aligns_keys() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "Trials", "10").expect("write");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "Trials:        10\n");
    }

    #[test]
    fn pretty_section_underlines_heading() {
        let mut buf = Vec::new();
        pretty_section(&mut buf, "Report").expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Report");
        assert_eq!(lines[1].len(), PRETTY_RULE_WIDTH);
    }

    #[test]
    fn error_code_finds_typed_cause_under_context() {
        let err = anyhow::Error::new(LevelError::MissingNode {
            node: "x".to_string(),
        })
        .context("Failed to rank the mutated graph");
        assert_eq!(error_code(&err), Some(ErrorCode::MissingLevel));
        assert_eq!(error_code(&anyhow::anyhow!("plain")), None);
    }

    #[test]
    fn render_error_code_includes_hint() {
        let mut buf = Vec::new();
        render_error_code(&mut buf, ErrorCode::SelectionImpossible).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("error[E4001]: No edge can be selected"));
        assert!(text.contains("  hint: "));
    }
}

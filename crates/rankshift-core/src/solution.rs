//! Readers for the MIP script's solution and timing files.
//!
//! Solution file: the first line is a status header and is skipped; the
//! second line reads `objective value: <penalty>`, so the penalty is the
//! token at index 2. The value is integral in principle but may carry float
//! noise (`6.0000001`), hence the rounding.
//!
//! Timing file: a single decimal number of seconds. It is a scratch file
//! written as a side effect of every MIP run and is deleted once read.

use std::fs;
use std::path::Path;

use crate::error::ErrorCode;

/// Errors from reading solution or timing files.
#[derive(Debug, thiserror::Error)]
pub enum SolutionError {
    /// The file is absent or could not be read/removed.
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The solution file has no parseable penalty on line 2.
    #[error("{path}: no penalty at line 2, token 3")]
    MalformedSolution { path: String },

    /// The timing file does not start with a number of seconds.
    #[error("{path}: expected elapsed seconds, found {content:?}")]
    MalformedTiming { path: String, content: String },
}

impl SolutionError {
    /// Return the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::FileMissing,
            Self::MalformedSolution { .. } => ErrorCode::MalformedSolution,
            Self::MalformedTiming { .. } => ErrorCode::MalformedTiming,
        }
    }

    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Read the penalty from a solution file, rounded to the nearest integer.
///
/// # Errors
///
/// Returns [`SolutionError::Io`] if the file is missing and
/// [`SolutionError::MalformedSolution`] if line 2 has no numeric third token.
pub fn read_penalty(path: &Path) -> Result<i64, SolutionError> {
    let text = fs::read_to_string(path).map_err(|e| SolutionError::io(path, e))?;
    parse_penalty(&text).ok_or_else(|| SolutionError::MalformedSolution {
        path: path.display().to_string(),
    })
}

fn parse_penalty(text: &str) -> Option<i64> {
    let value: f64 = text.lines().nth(1)?.split_whitespace().nth(2)?.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(value.round() as i64)
}

/// Read elapsed seconds from the timing scratch file, then delete it.
///
/// # Errors
///
/// Returns [`SolutionError::Io`] if the file is missing or cannot be removed
/// and [`SolutionError::MalformedTiming`] if it does not hold a number.
pub fn take_elapsed_seconds(path: &Path) -> Result<f64, SolutionError> {
    let text = fs::read_to_string(path).map_err(|e| SolutionError::io(path, e))?;
    let first = text.lines().next().unwrap_or_default().trim();
    let seconds = first
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s >= 0.0)
        .ok_or_else(|| SolutionError::MalformedTiming {
            path: path.display().to_string(),
            content: first.to_string(),
        })?;
    fs::remove_file(path).map_err(|e| SolutionError::io(path, e))?;
    Ok(seconds)
}

//! Whitespace-separated edge-list loader.
//!
//! One edge per line, exactly two tokens: `source target`. Any other token
//! count, a blank line included, aborts the load; a disruption score is only
//! meaningful over the complete graph, so there is no line skipping.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::ErrorCode;

/// A directed `(source, target)` pair as read from input.
pub type Edge = (String, String);

/// Errors raised while loading an edge list.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading a line failed (I/O error or invalid UTF-8).
    #[error("failed to read line {line} of {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },

    /// A line did not hold exactly two tokens.
    #[error("{}:{line}: expected 2 whitespace-separated tokens, found {found}: {content:?}", .path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        found: usize,
        content: String,
    },
}

impl LoadError {
    /// Stable error code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Open { source, .. } if source.kind() == io::ErrorKind::NotFound => {
                ErrorCode::InputNotFound
            }
            Self::Open { .. } | Self::Read { .. } => ErrorCode::InputUnreadable,
            Self::MalformedLine { .. } => ErrorCode::MalformedEdgeLine,
        }
    }
}

/// Load every edge from the file at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Open`] if the file cannot be opened, and the errors
/// of [`read_edges`] otherwise.
#[instrument]
pub fn load_edge_file(path: &Path) -> Result<Vec<Edge>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let edges = read_edges(BufReader::new(file), path)?;
    debug!(edges = edges.len(), "loaded edge list");
    Ok(edges)
}

/// Parse edges from `reader`; `origin` names the source in error messages.
///
/// Line numbers in errors are 1-based.
///
/// # Errors
///
/// Returns [`LoadError::Read`] on an I/O failure and
/// [`LoadError::MalformedLine`] for the first line whose token count is not
/// exactly two.
pub fn read_edges<R: BufRead>(reader: R, origin: &Path) -> Result<Vec<Edge>, LoadError> {
    let mut edges = Vec::new();

    for (offset, line) in reader.lines().enumerate() {
        let line_no = offset + 1;
        let line = line.map_err(|source| LoadError::Read {
            path: origin.to_path_buf(),
            line: line_no,
            source,
        })?;

        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next()) {
            (Some(source), Some(target), None) => {
                edges.push((source.to_string(), target.to_string()));
            }
            _ => {
                return Err(LoadError::MalformedLine {
                    path: origin.to_path_buf(),
                    line: line_no,
                    found: line.split_whitespace().count(),
                    content: line,
                });
            }
        }
    }

    Ok(edges)
}

//! Ordered result table and its serializations.
//!
//! # Columns
//!
//! `node, ni, nj, nk, cd, in_degree, out_degree`, in this order, after a
//! header row. Rows keep the record order they were built from, which is the
//! index's first-seen node order.
//!
//! # Undefined Values
//!
//! `ni`, `nj`, `nk` and `cd` of unscored nodes, and `cd` of zero-denominator
//! nodes, render as the reserved token (default `NaN`) in delimited output
//! and as `null` in JSON. The token is validated so it can never be mistaken
//! for a rendered count or a finite `cd`.
//!
//! # Partial Runs
//!
//! A table built from a deadline-truncated report says so in the output:
//! delimited formats end with a `# partial: ...` trailer line, and skipped
//! rows carry `"skipped": true` in JSON.
//!
//! # Writing
//!
//! [`ResultTable::write_file`] renders into a sibling `*.tmp` file and
//! renames it over the target, so a failed write never leaves a truncated
//! table behind.

#![allow(clippy::module_name_repetitions)]

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::disruption::{DisruptionRecord, DisruptionReport, Outcome};
use crate::error::ErrorCode;

/// Header row, in column order.
pub const COLUMNS: [&str; 7] = ["node", "ni", "nj", "nk", "cd", "in_degree", "out_degree"];

/// Reserved token for undefined numeric fields.
pub const DEFAULT_NAN_TOKEN: &str = "NaN";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while configuring or writing a [`ResultTable`].
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The undefined-value token could be confused with a number or breaks
    /// the delimited layout.
    #[error("invalid not-a-number token {0:?}: it must not parse as a number or contain delimiters, quotes or line breaks")]
    InvalidNanToken(String),

    /// An output format name was not recognised.
    #[error("unknown table format {0:?} (expected csv, tsv or json)")]
    UnknownFormat(String),

    #[error("failed to serialize table as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to write table: {0}")]
    Io(#[from] io::Error),

    /// Writing or moving the output file failed.
    #[error("failed to write {}: {source}", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TableError {
    /// Stable error code for this failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidNanToken(_) | Self::UnknownFormat(_) => ErrorCode::ConfigParseError,
            Self::Json(_) => ErrorCode::InternalUnexpected,
            Self::Io(_) | Self::WriteFile { .. } => ErrorCode::OutputWriteFailed,
        }
    }
}

// ---------------------------------------------------------------------------
// TableFormat
// ---------------------------------------------------------------------------

/// Serialization format of a [`ResultTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Comma-separated, RFC 4180 quoting.
    #[default]
    Csv,
    /// Tab-separated.
    Tsv,
    /// Pretty-printed JSON array of row objects.
    Json,
}

impl TableFormat {
    /// Pick a format from a file extension: `.tsv`, `.json`, otherwise csv.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("tsv" | "tab") => Self::Tsv,
            Some("json") => Self::Json,
            _ => Self::Csv,
        }
    }

    /// Field delimiter for the delimited formats.
    #[must_use]
    pub const fn delimiter(self) -> Option<char> {
        match self {
            Self::Csv => Some(','),
            Self::Tsv => Some('\t'),
            Self::Json => None,
        }
    }
}

impl FromStr for TableFormat {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "json" => Ok(Self::Json),
            _ => Err(TableError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
        })
    }
}

// ---------------------------------------------------------------------------
// ResultTable
// ---------------------------------------------------------------------------

/// Ordered collection of disruption records ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    records: Vec<DisruptionRecord>,
    partial: bool,
    nan_token: String,
}

#[derive(Serialize)]
struct JsonRow<'a> {
    node: &'a str,
    ni: Option<usize>,
    nj: Option<usize>,
    nk: Option<usize>,
    cd: Option<f64>,
    in_degree: usize,
    out_degree: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    skipped: bool,
}

impl ResultTable {
    /// Wrap records, keeping their order exactly.
    #[must_use]
    pub fn from_records(records: Vec<DisruptionRecord>) -> Self {
        Self {
            records,
            partial: false,
            nan_token: DEFAULT_NAN_TOKEN.to_string(),
        }
    }

    /// Wrap a report, carrying its partial flag.
    #[must_use]
    pub fn from_report(report: DisruptionReport) -> Self {
        Self {
            partial: report.partial,
            ..Self::from_records(report.records)
        }
    }

    /// Replace the undefined-value token.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidNanToken`] if the token parses as a
    /// non-NaN number or contains a delimiter, quote or line break.
    pub fn with_nan_token(mut self, token: &str) -> Result<Self, TableError> {
        let numeric = token.parse::<f64>().is_ok_and(|v| !v.is_nan());
        let breaks_layout = token.contains([',', '\t', '"', '\n', '\r']);
        if numeric || breaks_layout {
            return Err(TableError::InvalidNanToken(token.to_string()));
        }
        self.nan_token = token.to_string();
        Ok(self)
    }

    #[must_use]
    pub fn records(&self) -> &[DisruptionRecord] {
        &self.records
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// `true` if the records come from a deadline-truncated run.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        self.partial
    }

    /// Number of rows the deadline left unscored.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Skipped))
            .count()
    }

    #[must_use]
    pub fn nan_token(&self) -> &str {
        &self.nan_token
    }

    /// Render as delimited lines: the header row, then one row per record.
    #[must_use]
    pub fn to_delimited_text(&self, delimiter: char) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.records.len() + 1);
        lines.push(COLUMNS.join(&delimiter.to_string()));
        for record in &self.records {
            lines.push(self.render_row(record, delimiter));
        }
        lines
    }

    /// Render the whole table in `format` as a single string.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Json`] if JSON serialization fails.
    pub fn render(&self, format: TableFormat) -> Result<String, TableError> {
        let mut buf = Vec::new();
        self.write_to(&mut buf, format)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the table to `writer` in `format`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Io`] or [`TableError::Json`] on failure.
    pub fn write_to<W: Write>(&self, mut writer: W, format: TableFormat) -> Result<(), TableError> {
        match format.delimiter() {
            Some(delimiter) => {
                for line in self.to_delimited_text(delimiter) {
                    writeln!(writer, "{line}")?;
                }
                if self.partial {
                    writeln!(writer, "{}", self.partial_trailer())?;
                }
            }
            None => {
                let rows: Vec<JsonRow<'_>> = self.records.iter().map(json_row).collect();
                serde_json::to_writer_pretty(&mut writer, &rows)?;
                writeln!(writer)?;
            }
        }
        writer.flush()?;
        Ok(())
    }

    /// Atomically write the table to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::WriteFile`] if the temporary file cannot be
    /// written or renamed; the target path is left untouched in that case.
    #[instrument(skip(self), fields(rows = self.records.len()))]
    pub fn write_file(&self, path: &Path, format: TableFormat) -> Result<(), TableError> {
        let tmp_path = tmp_sibling(path);
        let wrap = |source: io::Error| TableError::WriteFile {
            path: path.to_path_buf(),
            source,
        };

        let written = File::create(&tmp_path)
            .map_err(wrap)
            .and_then(|file| match self.write_to(BufWriter::new(file), format) {
                Ok(()) => Ok(()),
                Err(TableError::Io(source)) => Err(wrap(source)),
                Err(other) => Err(other),
            })
            .and_then(|()| fs::rename(&tmp_path, path).map_err(wrap));

        if written.is_err() {
            // Best effort; the tmp file may not exist.
            let _ = fs::remove_file(&tmp_path);
        } else {
            info!(path = %path.display(), %format, "wrote result table");
        }
        written
    }

    fn partial_trailer(&self) -> String {
        format!(
            "# partial: {} of {} nodes skipped (deadline reached)",
            self.skipped_count(),
            self.records.len()
        )
    }

    fn render_row(&self, record: &DisruptionRecord, delimiter: char) -> String {
        let count = |value: Option<usize>| value.map_or_else(|| self.nan_token.clone(), |v| v.to_string());
        let cd = record
            .cd()
            .map_or_else(|| self.nan_token.clone(), |v| format!("{v:?}"));

        let fields = [
            quote_field(&record.node, delimiter),
            count(record.ni()),
            count(record.nj()),
            count(record.nk()),
            cd,
            record.in_degree.to_string(),
            record.out_degree.to_string(),
        ];
        fields.join(&delimiter.to_string())
    }
}

fn json_row(record: &DisruptionRecord) -> JsonRow<'_> {
    JsonRow {
        node: &record.node,
        ni: record.ni(),
        nj: record.nj(),
        nk: record.nk(),
        cd: record.cd(),
        in_degree: record.in_degree,
        out_degree: record.out_degree,
        skipped: matches!(record.outcome, Outcome::Skipped),
    }
}

/// Quote a field when it contains the delimiter, a quote or a line break.
fn quote_field(value: &str, delimiter: char) -> String {
    if value.contains(delimiter) || value.contains(['"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

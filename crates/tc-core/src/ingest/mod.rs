//! Reference source readers.
//!
//! Turns CSV, JSON array and JSON Lines files into [`RawRecord`]s for the
//! normalizer. Readers only split cells; every interpretation of a cell is
//! left to the schema.

mod csv;
mod json;

pub use self::csv::{CsvReader, CsvRow};

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use tc_common::RawRecord;

/// Errors while reading a source.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed: {0}")]
    Read(#[from] io::Error),

    #[error("unsupported input format {extension:?}; expected .csv, .json or .jsonl")]
    UnsupportedFormat { extension: String },

    #[error("input has no header row")]
    MissingHeader,

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error("line {line}: {found} fields but the header has {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid JSON: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {row} is not a JSON object")]
    NotAnObject { row: usize },
}

impl From<IngestError> for tc_common::Error {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::UnsupportedFormat { .. } => {
                tc_common::Error::UnsupportedInput(err.to_string())
            }
            other => tc_common::Error::Ingest(other.to_string()),
        }
    }
}

/// Layout of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    /// A single JSON array of objects.
    Json,
    /// One JSON object per line.
    Jsonl,
}

impl SourceFormat {
    /// Pick the format from the file extension; `-` means JSON Lines on stdin.
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        if path == Path::new("-") {
            return Ok(SourceFormat::Jsonl);
        }
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "json" => Ok(SourceFormat::Json),
            "jsonl" | "ndjson" => Ok(SourceFormat::Jsonl),
            _ => Err(IngestError::UnsupportedFormat { extension }),
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "csv"),
            SourceFormat::Json => write!(f, "json"),
            SourceFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Read every record from `reader`.
pub fn read_records<R: BufRead>(
    reader: R,
    format: SourceFormat,
    delimiter: char,
) -> Result<Vec<RawRecord>, IngestError> {
    match format {
        SourceFormat::Csv => csv::read_csv(reader, delimiter),
        SourceFormat::Json => json::read_json_array(reader),
        SourceFormat::Jsonl => json::read_json_lines(reader),
    }
}

/// Read a source file (or stdin for `-`).
pub fn read_source(path: &Path, delimiter: char) -> Result<Vec<RawRecord>, IngestError> {
    let format = SourceFormat::from_path(path)?;
    if path == Path::new("-") {
        return read_records(io::stdin().lock(), format, delimiter);
    }
    let file = File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(BufReader::new(file), format, delimiter)
}

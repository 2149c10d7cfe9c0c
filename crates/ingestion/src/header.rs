//! CSV header discovery for loosely formatted feeds.
//!
//! Feed files may start with any number of informational lines ("No errors",
//! "4389 results", ...) before the line of column names. The first line with
//! more than one field is taken as the header. This is a best-effort
//! heuristic, not a general CSV dialect rule.

use csv::{ErrorKind, ReaderBuilder, StringRecord};
use std::io::Read;
use thiserror::Error;

use crate::error::RowError;

/// Header resolution failures. Each one aborts the ingestion cycle.
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("No field names specified")]
    NoFieldNames,

    #[error("No header line found before end of input")]
    NotFound,

    #[error("Fields {missing:?} not found in header")]
    MissingColumns {
        missing: Vec<String>,
        /// Index of every requested name, `None` for the missing ones
        indices: Vec<Option<usize>>,
    },

    #[error("{0}")]
    Read(#[from] csv::Error),
}

/// Outcome of reading one data row.
#[derive(Debug)]
pub enum NextRow {
    Record(StringRecord),
    Malformed { line: u64, error: RowError },
    End,
}

/// Row reader over a feed body.
pub struct FeedReader<R> {
    reader: csv::Reader<R>,
    width: Option<usize>,
}

impl<R: Read> FeedReader<R> {
    pub fn new(source: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(source);
        Self {
            reader,
            width: None,
        }
    }

    /// Skip to the header line and locate `names` in it.
    ///
    /// Returns one column index per requested name, in request order. The
    /// first occurrence wins when the header repeats a name. Afterwards every
    /// data row must be exactly as wide as the header, until
    /// [`relax_width`](Self::relax_width) is called.
    pub fn resolve_header(&mut self, names: &[&str]) -> Result<Vec<usize>, HeaderError> {
        if names.is_empty() {
            return Err(HeaderError::NoFieldNames);
        }

        let mut record = StringRecord::new();
        loop {
            if !self.reader.read_record(&mut record)? {
                return Err(HeaderError::NotFound);
            }
            if record.len() > 1 {
                break;
            }
        }
        self.width = Some(record.len());

        let indices: Vec<Option<usize>> = names
            .iter()
            .map(|name| record.iter().position(|field| field == *name))
            .collect();

        if indices.iter().any(Option::is_none) {
            let missing = names
                .iter()
                .zip(&indices)
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(HeaderError::MissingColumns { missing, indices });
        }

        Ok(indices.into_iter().flatten().collect())
    }

    /// Accept data rows of any width.
    pub fn relax_width(&mut self) {
        self.width = None;
    }

    /// Expected data row width, if enforced.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    /// Read the next data row.
    ///
    /// Rows of the wrong width and rows that are not UTF-8 are reported as
    /// [`NextRow::Malformed`]; any other read failure is returned as an error.
    pub fn next_row(&mut self) -> Result<NextRow, csv::Error> {
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Ok(false) => Ok(NextRow::End),
            Ok(true) => {
                if let Some(expected) = self.width {
                    if record.len() != expected {
                        return Ok(NextRow::Malformed {
                            line: line_of(&record),
                            error: RowError::Width {
                                expected,
                                actual: record.len(),
                            },
                        });
                    }
                }
                Ok(NextRow::Record(record))
            }
            Err(e) => match e.kind() {
                ErrorKind::Utf8 { pos, .. } => Ok(NextRow::Malformed {
                    line: pos.as_ref().map(|p| p.line()).unwrap_or_default(),
                    error: RowError::Encoding,
                }),
                _ => Err(e),
            },
        }
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

//! Loading source records from delimited tables.
//!
//! The pipeline reads its corpus from CSV files with a header row. Column
//! names are configurable because source tables differ (a book table keys
//! its rows by `str_idx` and stores text in `processed_content`, while a
//! passages table may use other names).

use std::path::Path;

use crate::error::{Error, Result};

/// Default column holding the record identifier.
pub const DEFAULT_ID_COLUMN: &str = "str_idx";

/// Default column holding the record text.
pub const DEFAULT_TEXT_COLUMN: &str = "processed_content";

/// A single row of source text. Immutable after load.
#[derive(Debug, Clone)]
pub struct Record {
    /// Source identifier (e.g. a chapter index).
    pub id: String,
    /// Raw text content.
    pub content: String,
}

/// Load records from a CSV file with a header row.
///
/// `id_column` and `text_column` name the columns to read; a missing
/// column is a configuration error. I/O and parse errors propagate.
pub fn load_records(
    path: &Path,
    id_column: &str,
    text_column: &str,
) -> Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?;
    let id_idx = column_index(headers, id_column, path)?;
    let text_idx = column_index(headers, text_column, path)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let id = row.get(id_idx).unwrap_or_default().to_string();
        let content = row.get(text_idx).unwrap_or_default().to_string();
        records.push(Record { id, content });
    }

    Ok(records)
}

fn column_index(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        Error::Config(format!(
            "column '{name}' not found in {} (available: {})",
            path.display(),
            headers.iter().collect::<Vec<_>>().join(", ")
        ))
    })
}

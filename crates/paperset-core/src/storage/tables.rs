use std::fs;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::models::{AUTHOR_COLUMNS, CITATION_COLUMNS, Dataset, PAPER_COLUMNS, TableCounts};

pub const PAPERS_FILE: &str = "papers.csv";
pub const CITATIONS_FILE: &str = "citations.csv";
pub const AUTHORS_FILE: &str = "authors.csv";

/// Every file a finished run leaves in the processed directory.
pub const TABLE_FILES: [&str; 3] = [PAPERS_FILE, CITATIONS_FILE, AUTHORS_FILE];

/// Write one table: header row first (even when `rows` is empty), then one
/// record per row. Fields are quoted only when they need it.
pub fn write_table<T: Serialize>(path: &Path, columns: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_path(path)?;

    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write all three tables into `dir`, creating it if needed.
pub fn write_dataset(dir: &Path, dataset: &Dataset) -> Result<TableCounts> {
    fs::create_dir_all(dir)?;
    write_table(&dir.join(PAPERS_FILE), &PAPER_COLUMNS, &dataset.papers)?;
    write_table(&dir.join(CITATIONS_FILE), &CITATION_COLUMNS, &dataset.citations)?;
    write_table(&dir.join(AUTHORS_FILE), &AUTHOR_COLUMNS, &dataset.authors)?;

    let counts = dataset.counts();
    tracing::info!(dir = %dir.display(), %counts, "tables written");
    Ok(counts)
}

/// Read a table back, skipping its header row.
pub fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

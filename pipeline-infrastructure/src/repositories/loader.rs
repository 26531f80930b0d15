// CSV loading for the static lookup tables

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tokio::fs;

pub async fn read_table_source(path: &str) -> Result<String> {
    if !Path::new(path).exists() {
        return Err(anyhow!("lookup table not found: {}", path));
    }
    fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read lookup table {}", path))
}

/// Parses CSV content into (headers, records). Headers are trimmed and
/// lower-cased.
pub fn parse_csv(content: &str) -> Result<(Vec<String>, Vec<csv::StringRecord>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .context("failed to read CSV headers")?
        .iter()
        .map(|header| header.to_ascii_lowercase())
        .collect::<Vec<_>>();

    let records = reader
        .records()
        .collect::<Result<Vec<_>, _>>()
        .context("failed to read CSV records")?;

    Ok((headers, records))
}

pub fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| anyhow!("column '{}' not found in CSV headers: {:?}", name, headers))
}

/// Empty cells read as missing.
pub fn cell<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|idx| record.get(idx))
        .filter(|value| !value.is_empty())
}

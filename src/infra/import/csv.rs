use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::params;

use crate::infra::sqlite::queries::{insert_header_names, insert_record};
use crate::infra::sqlite::schema::{init_db, open_connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportResult {
    pub dataset_id: i64,
    pub row_count: i64,
}

/// Loads a CSV file as a new dataset. Every data line becomes one record with
/// a store-assigned id; short lines are padded with empty cells.
pub fn import_csv_to_sqlite(db_path: &Path, csv_path: &Path) -> Result<ImportResult> {
    init_db(db_path)?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .iter()
        .map(|header| header.to_string())
        .collect();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let source_path = csv_path.to_string_lossy().into_owned();
    let dataset_name = csv_path
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("dataset")
        .to_string();

    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;

    tx.execute(
        "INSERT INTO dataset(name, source_path) VALUES (?1, ?2)",
        params![dataset_name, source_path],
    )
    .context("failed to insert dataset")?;
    let dataset_id = tx.last_insert_rowid();

    insert_header_names(&tx, dataset_id, &headers)?;

    let mut row_count = 0_i64;
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        let values: Vec<String> = (0..headers.len())
            .map(|col_idx| record.get(col_idx).unwrap_or("").to_string())
            .collect();
        insert_record(&tx, dataset_id, &values)?;
        row_count += 1;
    }

    tx.commit().context("failed to commit import transaction")?;

    tracing::info!(dataset_id, row_count, path = %csv_path.display(), "csv imported");
    Ok(ImportResult {
        dataset_id,
        row_count,
    })
}

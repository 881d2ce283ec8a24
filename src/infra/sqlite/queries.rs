use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Connection};

use crate::domain::entities::dataset::{DatasetId, DatasetMeta, PageSnapshot};
use crate::domain::entities::record::Record;
use crate::infra::sqlite::schema::{init_db, open_connection};

/// Store-side form of a decoded request key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    /// Empty means every column.
    pub columns: Vec<String>,
    pub page_index: i64,
    pub page_size: i64,
    pub filter: String,
    pub show_trash: bool,
}

/// Outcome of flipping the trash flag on one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashUpdate {
    Updated,
    Missing,
    AlreadyInState,
}

pub fn insert_header_names(
    tx: &rusqlite::Transaction<'_>,
    dataset_id: i64,
    headers: &[String],
) -> Result<()> {
    let mut insert_header = tx
        .prepare("INSERT INTO column_name(dataset_id, col_idx, name) VALUES (?1, ?2, ?3)")
        .context("failed to prepare header insert")?;

    for (col_idx, name) in headers.iter().enumerate() {
        insert_header
            .execute(params![dataset_id, col_idx as i64, name])
            .context("failed to insert header")?;
    }

    Ok(())
}

pub fn insert_record(
    tx: &rusqlite::Transaction<'_>,
    dataset_id: i64,
    values: &[String],
) -> Result<i64> {
    tx.execute(
        "INSERT INTO record(dataset_id) VALUES (?1)",
        params![dataset_id],
    )
    .context("failed to insert record")?;
    let record_id = tx.last_insert_rowid();

    let mut insert_cell = tx
        .prepare_cached("INSERT INTO cell(record_id, col_idx, value) VALUES (?1, ?2, ?3)")
        .context("failed to prepare cell insert")?;
    for (col_idx, value) in values.iter().enumerate() {
        insert_cell
            .execute(params![record_id, col_idx as i64, value])
            .context("failed to insert cell")?;
    }

    Ok(record_id)
}

#[cfg(test)]
pub fn create_dataset_from_rows(
    db_path: &Path,
    name: &str,
    source_path: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<i64> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start transaction")?;

    tx.execute(
        "INSERT INTO dataset(name, source_path) VALUES (?1, ?2)",
        params![name, source_path],
    )
    .context("failed to insert dataset")?;
    let dataset_id = tx.last_insert_rowid();

    insert_header_names(&tx, dataset_id, headers)?;
    for row in rows {
        insert_record(&tx, dataset_id, row)?;
    }

    tx.commit().context("failed to commit dataset transaction")?;
    Ok(dataset_id)
}

pub fn load_columns(conn: &Connection, dataset_id: i64) -> Result<Vec<String>> {
    let mut stmt = conn
        .prepare(
            "SELECT name
             FROM column_name
             WHERE dataset_id = ?1
             ORDER BY col_idx ASC",
        )
        .context("failed to prepare columns query")?;
    let columns = stmt
        .query_map([dataset_id], |row| row.get::<_, String>(0))
        .context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect columns")?;
    Ok(columns)
}

pub fn dataset_exists(conn: &Connection, dataset_id: i64) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM dataset WHERE id = ?1",
            [dataset_id],
            |row| row.get(0),
        )
        .context("failed to look up dataset")?;
    Ok(count > 0)
}

pub fn list_datasets(db_path: &Path) -> Result<Vec<DatasetMeta>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT d.id, d.name, d.source_path,
                    (SELECT COUNT(*) FROM record r
                     WHERE r.dataset_id = d.id AND r.deleted_at IS NULL)
             FROM dataset d
             ORDER BY d.id ASC",
        )
        .context("failed to prepare dataset list query")?;

    let summaries = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .context("failed to query datasets")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect datasets")?;
    drop(stmt);

    let mut datasets = Vec::with_capacity(summaries.len());
    for (id, name, source_path, record_count) in summaries {
        datasets.push(DatasetMeta {
            id: DatasetId(id),
            name,
            columns: load_columns(&conn, id)?,
            record_count,
            source_path,
        });
    }
    Ok(datasets)
}

fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// `WHERE` clause and parameters shared by page and universe queries.
fn filter_clause(dataset_id: i64, filter: &str, show_trash: bool) -> (String, Vec<Value>) {
    let mut clauses = vec!["r.dataset_id = ?".to_string()];
    let mut values = vec![Value::Integer(dataset_id)];

    clauses.push(if show_trash {
        "r.deleted_at IS NOT NULL".to_string()
    } else {
        "r.deleted_at IS NULL".to_string()
    });

    let term = filter.trim();
    if !term.is_empty() {
        clauses.push(
            "EXISTS (
                SELECT 1 FROM cell fc
                WHERE fc.record_id = r.id
                  AND fc.value LIKE ? ESCAPE '\\'
            )"
            .to_string(),
        );
        values.push(Value::Text(like_pattern(term)));
    }

    (clauses.join(" AND "), values)
}

pub fn query_page(db_path: &Path, dataset_id: i64, query: &PageQuery) -> Result<PageSnapshot> {
    if query.page_size <= 0 {
        anyhow::bail!("page_size must be greater than zero")
    }

    let conn = open_connection(db_path)?;
    let all_columns = load_columns(&conn, dataset_id)?;

    let projected: Vec<(i64, String)> = if query.columns.is_empty() {
        all_columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (idx as i64, name.clone()))
            .collect()
    } else {
        query
            .columns
            .iter()
            .map(|name| {
                all_columns
                    .iter()
                    .position(|column| column == name)
                    .map(|idx| (idx as i64, name.clone()))
                    .with_context(|| format!("unknown column in projection: {name}"))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let (where_sql, filter_params) = filter_clause(dataset_id, &query.filter, query.show_trash);

    let total_rows: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM record r WHERE {where_sql}"),
            rusqlite::params_from_iter(filter_params.iter().cloned()),
            |row| row.get(0),
        )
        .context("failed to query filtered row count")?;

    let offset = query.page_index.max(0) * query.page_size;
    let mut row_params = filter_params;
    row_params.push(Value::Integer(query.page_size));
    row_params.push(Value::Integer(offset));

    let mut row_stmt = conn
        .prepare(&format!(
            "SELECT r.id FROM record r WHERE {where_sql} ORDER BY r.id ASC LIMIT ? OFFSET ?"
        ))
        .context("failed to prepare page id query")?;
    let record_ids = row_stmt
        .query_map(rusqlite::params_from_iter(row_params), |row| {
            row.get::<_, i64>(0)
        })
        .context("failed to query page ids")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect page ids")?;
    drop(row_stmt);

    let columns: Vec<String> = projected.iter().map(|(_, name)| name.clone()).collect();
    let mut snapshot = PageSnapshot {
        columns,
        rows: Vec::with_capacity(record_ids.len()),
        total_row_count: total_rows.max(0) as u64,
    };
    if record_ids.is_empty() {
        return Ok(snapshot);
    }

    let placeholders = std::iter::repeat_n("?", record_ids.len())
        .collect::<Vec<_>>()
        .join(",");
    let hydrate_sql = format!(
        "SELECT record_id, col_idx, value
         FROM cell
         WHERE record_id IN ({placeholders})"
    );

    let row_pos: HashMap<i64, usize> = record_ids
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, record_id)| (record_id, idx))
        .collect();
    let col_pos: HashMap<i64, usize> = projected
        .iter()
        .enumerate()
        .map(|(pos, (col_idx, _))| (*col_idx, pos))
        .collect();
    snapshot.rows = record_ids
        .iter()
        .map(|record_id| Record::new(*record_id, vec![String::new(); projected.len()]))
        .collect();

    let mut hydrate_stmt = conn
        .prepare(&hydrate_sql)
        .context("failed to prepare row hydration query")?;
    let mut hydrate_rows = hydrate_stmt
        .query(rusqlite::params_from_iter(record_ids.iter().copied()))
        .context("failed to run row hydration query")?;

    while let Some(row) = hydrate_rows.next().context("failed to read hydrated row")? {
        let record_id: i64 = row.get(0).context("failed to read record_id")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let value: String = row.get(2).context("failed to read value")?;

        if let (Some(&dest_row), Some(&dest_col)) = (row_pos.get(&record_id), col_pos.get(&col_idx))
        {
            snapshot.rows[dest_row].values[dest_col] = value;
        }
    }

    Ok(snapshot)
}

pub fn fetch_all_ids(
    db_path: &Path,
    dataset_id: i64,
    filter: &str,
    show_trash: bool,
) -> Result<Vec<i64>> {
    let conn = open_connection(db_path)?;
    let (where_sql, params) = filter_clause(dataset_id, filter, show_trash);
    let mut stmt = conn
        .prepare(&format!(
            "SELECT r.id FROM record r WHERE {where_sql} ORDER BY r.id ASC"
        ))
        .context("failed to prepare universe query")?;
    let ids = stmt
        .query_map(rusqlite::params_from_iter(params), |row| row.get::<_, i64>(0))
        .context("failed to query universe")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect universe")?;
    Ok(ids)
}

/// Moves records into (`Some(timestamp)`) or out of (`None`) the trash, one
/// outcome per id, in one transaction.
pub fn set_deleted_at(
    db_path: &Path,
    record_ids: &[i64],
    deleted_at: Option<&str>,
) -> Result<Vec<(i64, TrashUpdate)>> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start trash transaction")?;

    let mut outcomes = Vec::with_capacity(record_ids.len());
    {
        let mut update = tx
            .prepare(if deleted_at.is_some() {
                "UPDATE record SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL"
            } else {
                "UPDATE record SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NOT NULL"
            })
            .context("failed to prepare trash update")?;
        let mut exists = tx
            .prepare("SELECT COUNT(*) FROM record WHERE id = ?1")
            .context("failed to prepare record lookup")?;

        for &record_id in record_ids {
            let changed = update
                .execute(params![deleted_at, record_id])
                .with_context(|| format!("failed to update record #{record_id}"))?;
            let outcome = if changed > 0 {
                TrashUpdate::Updated
            } else {
                let count: i64 = exists
                    .query_row([record_id], |row| row.get(0))
                    .with_context(|| format!("failed to look up record #{record_id}"))?;
                if count > 0 {
                    TrashUpdate::AlreadyInState
                } else {
                    TrashUpdate::Missing
                }
            };
            outcomes.push((record_id, outcome));
        }
    }

    tx.commit().context("failed to commit trash transaction")?;
    Ok(outcomes)
}

pub fn upsert_hidden_columns(
    db_path: &Path,
    dataset_id: i64,
    hidden: &BTreeSet<String>,
) -> Result<()> {
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start hidden column transaction")?;

    tx.execute(
        "DELETE FROM hidden_column WHERE dataset_id = ?1",
        [dataset_id],
    )
    .context("failed to clear existing hidden columns")?;

    let mut insert_stmt = tx
        .prepare("INSERT INTO hidden_column(dataset_id, name) VALUES (?1, ?2)")
        .context("failed to prepare hidden column insert")?;
    for name in hidden {
        insert_stmt
            .execute(params![dataset_id, name])
            .context("failed to insert hidden column")?;
    }

    drop(insert_stmt);
    tx.commit()
        .context("failed to commit hidden column updates")?;
    Ok(())
}

pub fn load_hidden_columns(db_path: &Path, dataset_id: i64) -> Result<BTreeSet<String>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT name
             FROM hidden_column
             WHERE dataset_id = ?1",
        )
        .context("failed to prepare hidden column query")?;

    let hidden = stmt
        .query_map([dataset_id], |row| row.get::<_, String>(0))
        .context("failed to query hidden columns")?
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .context("failed to read hidden column row")?;

    Ok(hidden)
}

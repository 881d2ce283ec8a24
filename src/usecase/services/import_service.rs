use std::path::PathBuf;

use anyhow::Result;

use crate::infra::import::csv::{import_csv_to_sqlite, ImportResult};
use crate::platform::desktop::blocking::run_blocking;

pub struct ImportService {
    db_path: PathBuf,
}

impl ImportService {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }

    pub async fn import_csv(&self, csv_path: PathBuf) -> Result<ImportResult> {
        let db_path = self.db_path.clone();
        run_blocking(move || import_csv_to_sqlite(&db_path, &csv_path)).await?
    }
}

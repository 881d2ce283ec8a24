use std::sync::Arc;

use crate::domain::entities::record::RecordId;
use crate::platform::desktop::blocking::run_blocking;
use crate::usecase::ports::repo::{BulkActions, BulkReport, FetchError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    MoveToTrash,
    Restore,
}

impl BulkAction {
    pub fn label(self) -> &'static str {
        match self {
            BulkAction::MoveToTrash => "move to trash",
            BulkAction::Restore => "restore",
        }
    }
}

/// Applies an action to every selected id. Per-item failures come back in
/// the report; only a store-level failure fails the call.
#[derive(Clone)]
pub struct BulkService {
    actions: Arc<dyn BulkActions>,
}

impl BulkService {
    pub fn new(actions: Arc<dyn BulkActions>) -> Self {
        Self { actions }
    }

    pub fn apply(&self, action: BulkAction, ids: &[RecordId]) -> Result<BulkReport, FetchError> {
        if ids.is_empty() {
            return Ok(BulkReport::default());
        }
        let report = match action {
            BulkAction::MoveToTrash => self.actions.move_to_trash(ids)?,
            BulkAction::Restore => self.actions.restore(ids)?,
        };
        tracing::info!(
            action = action.label(),
            requested = ids.len(),
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "bulk action finished"
        );
        for (id, failure) in &report.failed {
            tracing::debug!(%id, %failure, "bulk item failed");
        }
        Ok(report)
    }

    pub async fn apply_async(
        &self,
        action: BulkAction,
        ids: Vec<RecordId>,
    ) -> Result<BulkReport, FetchError> {
        let service = self.clone();
        run_blocking(move || service.apply(action, &ids))
            .await
            .map_err(FetchError::transient)?
    }
}

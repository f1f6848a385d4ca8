use std::sync::Arc;

use viewer_logging::{viewer_info, viewer_warn};

use crate::{MirrorStore, StoreError};

/// Acknowledgement of a successful reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub patched_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("Missing htmlContent")]
    MissingContent,
    #[error("Unreadable request body: {0}")]
    UnreadableBody(String),
    #[error("failed to fetch mirror records: {0}")]
    FetchFailed(StoreError),
    #[error("No records in Times table")]
    NoRecords,
    #[error("failed to update mirror record {id}: {source}")]
    UpdateFailed { id: i64, source: StoreError },
}

/// Overwrites the oldest mirror record with externally supplied content.
///
/// Holds no mutable state; every request is reconciled against the remote
/// store independently. The list-then-patch sequence is not atomic: a record
/// appended in between is not noticed, and the last writer wins.
pub struct RemoteSyncService {
    store: Arc<dyn MirrorStore>,
}

impl RemoteSyncService {
    pub fn new(store: Arc<dyn MirrorStore>) -> Self {
        Self { store }
    }

    pub async fn reconcile(&self, new_content: Option<&str>) -> Result<Ack, SyncError> {
        let content = new_content
            .filter(|content| !content.is_empty())
            .ok_or(SyncError::MissingContent)?;

        let records = self.store.list().await.map_err(|err| {
            viewer_warn!("Reconcile could not list mirror records: {}", err);
            SyncError::FetchFailed(err)
        })?;

        let oldest = records
            .iter()
            .min_by_key(|record| record.id)
            .ok_or(SyncError::NoRecords)?;

        self.store
            .patch(oldest.id, content)
            .await
            .map_err(|source| {
                viewer_warn!("Reconcile could not patch record {}: {}", oldest.id, source);
                SyncError::UpdateFailed {
                    id: oldest.id,
                    source,
                }
            })?;

        viewer_info!(
            "Reconciled mirror record {} content_len={}",
            oldest.id,
            content.len()
        );
        Ok(Ack {
            patched_id: oldest.id,
        })
    }
}

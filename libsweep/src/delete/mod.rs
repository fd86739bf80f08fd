//! Batched tag deletion.

use crate::client::RegistryClient;
use crate::error::SweepError;
use futures::future::join_all;
use tracing::{debug, warn};


/// Outcome of a bulk delete.
#[derive(Debug, Default)]
pub struct DeleteReport {
    /// Ids of the tags that were deleted, in request order.
    pub deleted: Vec<String>,
    /// Ids that could not be deleted, with the reason.
    pub failed: Vec<(String, SweepError)>,
}

impl DeleteReport {
    /// Returns true when every requested delete succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Deletes `tag_ids` in batches of `batch_size`.
///
/// Deletes within a batch run concurrently; a batch starts once the previous
/// one has fully completed. A failed delete is recorded in the report and
/// never stops the remaining deletes. Nothing is rolled back.
///
/// A `batch_size` of zero is treated as one.
pub async fn bulk_delete(
    client: &RegistryClient,
    tag_ids: &[String],
    batch_size: usize,
) -> DeleteReport {
    let batch_size = batch_size.max(1);
    let mut report = DeleteReport::default();

    for (index, batch) in tag_ids.chunks(batch_size).enumerate() {
        debug!(batch = index + 1, size = batch.len(), "deleting batch");

        let outcomes = join_all(batch.iter().map(|id| async move {
            (id, client.delete_tag(id).await)
        }))
        .await;

        for (id, outcome) in outcomes {
            match outcome {
                Ok(_) => report.deleted.push(id.clone()),
                Err(e) => {
                    warn!(tag_id = %id, error = %e, "Failed to delete tag");
                    report.failed.push((id.clone(), e));
                }
            }
        }
    }

    report
}

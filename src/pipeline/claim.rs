//! Batch claiming.
//!
//! A run owns the batch numbers it assigns; rows keep them forever, so no row
//! is produced by two runs. The claim assumes nothing else sets `PrintBatch`.

use std::sync::Arc;

use crate::config::QueueSpec;
use crate::db::{LetterStore, StoreError};
use crate::models::{BatchRange, QueueRow};

pub struct BatchClaimer {
    store: Arc<dyn LetterStore>,
    delivery_code: i32,
}

impl BatchClaimer {
    pub fn new(store: Arc<dyn LetterStore>, delivery_code: i32) -> Self {
        Self {
            store,
            delivery_code,
        }
    }

    /// Claim every pending email row of `queue` and return the claimed rows
    /// in batch order. Nothing pending yields an empty list.
    pub async fn claim(&self, queue: &QueueSpec) -> Result<(BatchRange, Vec<QueueRow>), StoreError> {
        let range = self.store.claim_batch(queue, self.delivery_code).await?;
        if range.is_empty() {
            log::debug!("{}: nothing pending", queue.table);
            return Ok((range, Vec::new()));
        }
        log::debug!(
            "{}: claimed batches {}..={}",
            queue.table,
            range.first + 1,
            range.last
        );

        let rows = self.store.claimed_rows(queue, range).await?;
        if rows.len() as u64 != range.len() {
            log::warn!(
                "{}: claimed {} batches but read back {} rows",
                queue.table,
                range.len(),
                rows.len()
            );
        }
        Ok((range, rows))
    }
}

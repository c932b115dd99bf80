//! Batch claiming over a print queue table.

use super::{checked_identifier, PgLetterStore, StoreError};
use crate::config::QueueSpec;
use crate::models::{BatchRange, QueueRow};

impl PgLetterStore {
    /// Number every pending email row `M+1, M+2, ...` where `M` is the current
    /// maximum batch.
    ///
    /// The table lock conflicts with itself and with row inserts, so a second
    /// run blocks until this claim commits and rows inserted meanwhile wait
    /// and stay at batch 0.
    pub(super) async fn claim_queue_batch(
        &self,
        queue: &QueueSpec,
        delivery_code: i32,
    ) -> Result<BatchRange, StoreError> {
        let table = checked_identifier(&queue.table)?;
        let order = match &queue.order_by {
            Some(column) => checked_identifier(column)?,
            None => "ctid",
        };
        let stamp = match &queue.printed_when {
            Some(column) => format!(", {} = now()", checked_identifier(column)?),
            None => String::new(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("LOCK TABLE {table} IN SHARE ROW EXCLUSIVE MODE"))
            .execute(&mut *tx)
            .await?;

        let first: i64 = sqlx::query_scalar(&format!(
            "SELECT COALESCE(MAX(PrintBatch), 0)::BIGINT FROM {table}"
        ))
        .fetch_one(&mut *tx)
        .await?;

        let claimed = sqlx::query(&format!(
            r#"
            UPDATE {table} AS q
            SET PrintBatch = $1 + pending.seq{stamp}
            FROM (
                SELECT ctid AS row_ref, row_number() OVER (ORDER BY {order}) AS seq
                FROM {table}
                WHERE PrintBatch = 0 AND DelMeth = $2
            ) AS pending
            WHERE q.ctid = pending.row_ref
            "#
        ))
        .bind(first)
        .bind(delivery_code)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(BatchRange::new(first, first + claimed as i64))
    }

    pub(super) async fn select_claimed_rows(
        &self,
        queue: &QueueSpec,
        range: BatchRange,
    ) -> Result<Vec<QueueRow>, StoreError> {
        if range.is_empty() {
            return Ok(Vec::new());
        }
        let table = checked_identifier(&queue.table)?;
        let sql = format!(
            r#"
            SELECT ({plan})::TEXT AS plan_no,
                   ({letter})::TEXT AS letter_id,
                   PrintBatch::BIGINT AS batch
            FROM {table}
            WHERE PrintBatch > $1 AND PrintBatch <= $2
            ORDER BY PrintBatch
            "#,
            plan = queue.plan_no,
            letter = queue.letter_id,
        );
        let rows = sqlx::query_as::<_, QueueRow>(&sql)
            .bind(range.first)
            .bind(range.last)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

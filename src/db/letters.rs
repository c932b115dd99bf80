//! Standard letters and direct-debit notices

use super::{PgLetterStore, StoreError};
use crate::models::PendingNotice;

impl PgLetterStore {
    pub(super) async fn get_letter_body(
        &self,
        letter_id: &str,
    ) -> Result<Option<String>, StoreError> {
        let body: Option<Option<String>> = sqlx::query_scalar(
            "SELECT LtrBody FROM tstdletters WHERE CAST(LtrID AS TEXT) = $1",
        )
        .bind(letter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(body.flatten())
    }

    pub(super) async fn get_pending_notices(&self) -> Result<Vec<PendingNotice>, StoreError> {
        let notices = sqlx::query_as::<_, PendingNotice>(
            r#"
            SELECT ID::BIGINT AS id, COALESCE(AccountRef::TEXT, '') AS account_ref
            FROM dd_notify
            WHERE COALESCE(edited::INT, 0) = 0
            ORDER BY ID
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(notices)
    }

    pub(super) async fn update_notice_body(
        &self,
        notice_id: i64,
        body: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE dd_notify SET ltr2Body = $1 WHERE ID = $2")
            .bind(body)
            .bind(notice_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

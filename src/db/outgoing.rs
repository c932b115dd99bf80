//! Outgoing email records. Another process sends them.

use super::{PgLetterStore, StoreError};
use crate::models::OutgoingEmail;

impl PgLetterStore {
    pub(super) async fn insert_outgoing_email(
        &self,
        email: &OutgoingEmail,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO toutgoingemails
                (SentAt, SentBy, PlanNo, ToAddress, BCAddress, Subject, MsgText, Attachments)
            VALUES (now(), $1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&email.sent_by)
        .bind(email.plan_no)
        .bind(&email.to_address)
        .bind(&email.bcc_address)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(&email.attachment)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

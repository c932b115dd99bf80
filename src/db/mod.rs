//! Database access.
//!
//! Everything the pipeline reads or writes goes through [`LetterStore`] so the
//! components can be driven by an in-memory store in tests. The PostgreSQL
//! implementation is split by concern:
//! - `queue` - batch claiming and claimed-row selection
//! - `fields` - letter field definitions and values
//! - `letters` - standard letters and direct-debit notices
//! - `customers` - customer lookup
//! - `outgoing` - outgoing email records

mod customers;
mod fields;
mod letters;
mod outgoing;
mod queue;

use async_trait::async_trait;
use log::LevelFilter;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use std::time::Duration;
use thiserror::Error;

use crate::config::{DatabaseConfig, QueueSpec};
use crate::models::{
    BatchRange, CustomerDefaults, CustomerRecord, FieldDefinition, OutgoingEmail, PendingNotice,
    QueueRow,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("invalid database url: {0}")]
    Url(#[source] sqlx::Error),
    #[error("'{0}' is not a valid table or column name")]
    Identifier(String),
}

/// The database capability shared by every pipeline component.
#[async_trait]
pub trait LetterStore: Send + Sync {
    /// Health probe: row count of the literals table.
    async fn probe(&self) -> Result<i64, StoreError>;

    /// Assign fresh batch numbers to every pending email row of `queue`.
    async fn claim_batch(
        &self,
        queue: &QueueSpec,
        delivery_code: i32,
    ) -> Result<BatchRange, StoreError>;

    /// Rows whose batch falls in `range`, in batch order.
    async fn claimed_rows(
        &self,
        queue: &QueueSpec,
        range: BatchRange,
    ) -> Result<Vec<QueueRow>, StoreError>;

    async fn field_definition(&self, field_id: &str)
        -> Result<Option<FieldDefinition>, StoreError>;

    /// Scalar value of `field` for `plan_no` as text; `None` for no row or NULL.
    async fn field_value(
        &self,
        field: &FieldDefinition,
        plan_no: &str,
    ) -> Result<Option<String>, StoreError>;

    async fn letter_body(&self, letter_id: &str) -> Result<Option<String>, StoreError>;

    /// Direct-debit notices not yet edited by hand.
    async fn pending_notices(&self) -> Result<Vec<PendingNotice>, StoreError>;

    async fn store_notice_body(&self, notice_id: i64, body: &str) -> Result<(), StoreError>;

    async fn customer(
        &self,
        plan_no: &str,
        defaults: &CustomerDefaults,
    ) -> Result<Option<CustomerRecord>, StoreError>;

    async fn enqueue_email(&self, email: &OutgoingEmail) -> Result<(), StoreError>;
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgLetterStore {
    pool: PgPool,
}

impl PgLetterStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect using `config`; statements are logged at debug level.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = match &config.url {
            Some(url) => url.parse::<PgConnectOptions>().map_err(StoreError::Url)?,
            None => PgConnectOptions::new()
                .host(&config.host)
                .port(config.port)
                .username(&config.user)
                .password(&config.password)
                .database(&config.name),
        }
        .log_statements(LevelFilter::Debug);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl LetterStore for PgLetterStore {
    async fn probe(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tliterals")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn claim_batch(
        &self,
        queue: &QueueSpec,
        delivery_code: i32,
    ) -> Result<BatchRange, StoreError> {
        self.claim_queue_batch(queue, delivery_code).await
    }

    async fn claimed_rows(
        &self,
        queue: &QueueSpec,
        range: BatchRange,
    ) -> Result<Vec<QueueRow>, StoreError> {
        self.select_claimed_rows(queue, range).await
    }

    async fn field_definition(
        &self,
        field_id: &str,
    ) -> Result<Option<FieldDefinition>, StoreError> {
        self.get_field_definition(field_id).await
    }

    async fn field_value(
        &self,
        field: &FieldDefinition,
        plan_no: &str,
    ) -> Result<Option<String>, StoreError> {
        self.get_field_value(field, plan_no).await
    }

    async fn letter_body(&self, letter_id: &str) -> Result<Option<String>, StoreError> {
        self.get_letter_body(letter_id).await
    }

    async fn pending_notices(&self) -> Result<Vec<PendingNotice>, StoreError> {
        self.get_pending_notices().await
    }

    async fn store_notice_body(&self, notice_id: i64, body: &str) -> Result<(), StoreError> {
        self.update_notice_body(notice_id, body).await
    }

    async fn customer(
        &self,
        plan_no: &str,
        defaults: &CustomerDefaults,
    ) -> Result<Option<CustomerRecord>, StoreError> {
        self.get_customer(plan_no, defaults).await
    }

    async fn enqueue_email(&self, email: &OutgoingEmail) -> Result<(), StoreError> {
        self.insert_outgoing_email(email).await
    }
}

/// Reject anything that is not a plain identifier before it is spliced into SQL.
fn checked_identifier(name: &str) -> Result<&str, StoreError> {
    if crate::config::validation::is_sql_identifier(name) {
        Ok(name)
    } else {
        Err(StoreError::Identifier(name.to_string()))
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use secure_letters::config::{Config, QueueSpec};
use secure_letters::db::{LetterStore, StoreError};
use secure_letters::models::{
    BatchRange, CustomerDefaults, CustomerRecord, FieldDefinition, FieldType, OutgoingEmail,
    PendingNotice, QueueRow,
};
use secure_letters::tools::{CommandRunner, ToolError};

pub const EMAIL: i32 = 1;
pub const PAPER: i32 = 2;

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub plan_no: String,
    pub letter_id: String,
    pub del_meth: i32,
    pub batch: i64,
    pub printed: bool,
}

#[derive(Debug, Clone)]
pub struct NoticeEntry {
    pub id: i64,
    pub account_ref: String,
    pub edited: bool,
    pub body: Option<String>,
}

#[derive(Default)]
struct StoreState {
    queues: HashMap<String, Vec<QueueEntry>>,
    fields: HashMap<String, FieldDefinition>,
    values: HashMap<(String, String), String>,
    definition_queries: usize,
    value_queries: usize,
    letters: HashMap<String, String>,
    notices: Vec<NoticeEntry>,
    customers: HashMap<String, CustomerRecord>,
    emails: Vec<OutgoingEmail>,
}

/// In-memory stand-in for the letters database.
#[derive(Clone, Default)]
pub struct MockLetterStore {
    state: Arc<Mutex<StoreState>>,
}

impl MockLetterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push_row(&self, table: &str, plan_no: &str, letter_id: &str, del_meth: i32) {
        self.push_claimed_row(table, plan_no, letter_id, del_meth, 0).await;
    }

    pub async fn push_claimed_row(
        &self,
        table: &str,
        plan_no: &str,
        letter_id: &str,
        del_meth: i32,
        batch: i64,
    ) {
        let mut state = self.state.lock().await;
        state.queues.entry(table.to_string()).or_default().push(QueueEntry {
            plan_no: plan_no.to_string(),
            letter_id: letter_id.to_string(),
            del_meth,
            batch,
            printed: batch > 0,
        });
    }

    pub async fn rows(&self, table: &str) -> Vec<QueueEntry> {
        let state = self.state.lock().await;
        state.queues.get(table).cloned().unwrap_or_default()
    }

    pub async fn define_field(&self, field_id: &str, sql: &str, field_type: FieldType) {
        let mut state = self.state.lock().await;
        state.fields.insert(
            field_id.to_string(),
            FieldDefinition {
                field_id: field_id.to_string(),
                sql: sql.to_string(),
                field_type,
            },
        );
    }

    pub async fn set_value(&self, field_id: &str, plan_no: &str, value: &str) {
        let mut state = self.state.lock().await;
        state
            .values
            .insert((field_id.to_string(), plan_no.to_string()), value.to_string());
    }

    pub async fn definition_queries(&self) -> usize {
        self.state.lock().await.definition_queries
    }

    pub async fn value_queries(&self) -> usize {
        self.state.lock().await.value_queries
    }

    pub async fn add_letter(&self, letter_id: &str, body: &str) {
        let mut state = self.state.lock().await;
        state.letters.insert(letter_id.to_string(), body.to_string());
    }

    pub async fn add_notice(&self, id: i64, account_ref: &str, edited: bool) {
        let mut state = self.state.lock().await;
        state.notices.push(NoticeEntry {
            id,
            account_ref: account_ref.to_string(),
            edited,
            body: None,
        });
    }

    pub async fn notice_body(&self, id: i64) -> Option<String> {
        let state = self.state.lock().await;
        state
            .notices
            .iter()
            .find(|notice| notice.id == id)
            .and_then(|notice| notice.body.clone())
    }

    pub async fn add_customer(&self, customer: CustomerRecord) {
        let mut state = self.state.lock().await;
        state.customers.insert(customer.plan_no.clone(), customer);
    }

    pub async fn emails(&self) -> Vec<OutgoingEmail> {
        self.state.lock().await.emails.clone()
    }
}

#[async_trait]
impl LetterStore for MockLetterStore {
    async fn probe(&self) -> Result<i64, StoreError> {
        Ok(0)
    }

    async fn claim_batch(
        &self,
        queue: &QueueSpec,
        delivery_code: i32,
    ) -> Result<BatchRange, StoreError> {
        let mut state = self.state.lock().await;
        let rows = state.queues.entry(queue.table.clone()).or_default();
        let first = rows.iter().map(|row| row.batch).max().unwrap_or(0);
        let mut last = first;
        for row in rows
            .iter_mut()
            .filter(|row| row.batch == 0 && row.del_meth == delivery_code)
        {
            last += 1;
            row.batch = last;
            if queue.printed_when.is_some() {
                row.printed = true;
            }
        }
        Ok(BatchRange::new(first, last))
    }

    async fn claimed_rows(
        &self,
        queue: &QueueSpec,
        range: BatchRange,
    ) -> Result<Vec<QueueRow>, StoreError> {
        let state = self.state.lock().await;
        let mut rows: Vec<QueueRow> = state
            .queues
            .get(&queue.table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| range.contains(row.batch))
                    .map(|row| QueueRow {
                        plan_no: row.plan_no.clone(),
                        letter_id: row.letter_id.clone(),
                        batch: row.batch,
                    })
                    .collect()
            })
            .unwrap_or_default();
        rows.sort_by_key(|row| row.batch);
        Ok(rows)
    }

    async fn field_definition(
        &self,
        field_id: &str,
    ) -> Result<Option<FieldDefinition>, StoreError> {
        let mut state = self.state.lock().await;
        state.definition_queries += 1;
        Ok(state.fields.get(field_id).cloned())
    }

    async fn field_value(
        &self,
        field: &FieldDefinition,
        plan_no: &str,
    ) -> Result<Option<String>, StoreError> {
        let mut state = self.state.lock().await;
        state.value_queries += 1;
        Ok(state
            .values
            .get(&(field.field_id.clone(), plan_no.to_string()))
            .cloned())
    }

    async fn letter_body(&self, letter_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().await.letters.get(letter_id).cloned())
    }

    async fn pending_notices(&self) -> Result<Vec<PendingNotice>, StoreError> {
        let state = self.state.lock().await;
        let mut notices: Vec<PendingNotice> = state
            .notices
            .iter()
            .filter(|notice| !notice.edited)
            .map(|notice| PendingNotice {
                id: notice.id,
                account_ref: notice.account_ref.clone(),
            })
            .collect();
        notices.sort_by_key(|notice| notice.id);
        Ok(notices)
    }

    async fn store_notice_body(&self, notice_id: i64, body: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if let Some(notice) = state.notices.iter_mut().find(|n| n.id == notice_id) {
            notice.body = Some(body.to_string());
        }
        Ok(())
    }

    async fn customer(
        &self,
        plan_no: &str,
        defaults: &CustomerDefaults,
    ) -> Result<Option<CustomerRecord>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.customers.get(plan_no).cloned().map(|mut customer| {
            if customer.product.is_empty() {
                customer.product = defaults.product.clone();
            }
            if customer.email.is_empty() {
                customer.email = defaults.email.clone();
            }
            customer
        }))
    }

    async fn enqueue_email(&self, email: &OutgoingEmail) -> Result<(), StoreError> {
        self.state.lock().await.emails.push(email.clone());
        Ok(())
    }
}

/// Stands in for the renderer and the PDF toolkit: records every call and
/// writes a placeholder file wherever the tool would write its output.
#[derive(Clone, Default)]
pub struct FakeRunner {
    calls: Arc<Mutex<Vec<(PathBuf, Vec<String>)>>>,
    fail_on: Arc<Mutex<Vec<String>>>,
    fail_after_output: Arc<Mutex<Vec<String>>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any invocation with an argument containing `needle`.
    pub async fn fail_on(&self, needle: &str) {
        self.fail_on.lock().await.push(needle.to_string());
    }

    /// Write the output, then fail, for any invocation containing `needle`.
    pub async fn fail_after_output(&self, needle: &str) {
        self.fail_after_output.lock().await.push(needle.to_string());
    }

    pub async fn calls(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.calls.lock().await.clone()
    }
}

fn output_arg(args: &[String]) -> Option<&String> {
    args.iter()
        .position(|arg| arg == "-O" || arg == "output")
        .and_then(|i| args.get(i + 1))
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<(), ToolError> {
        self.calls
            .lock()
            .await
            .push((program.to_path_buf(), args.to_vec()));

        let exit = |stderr: String| ToolError::Exit {
            program: program.to_path_buf(),
            code: 1,
            stderr,
        };

        let fail_on = self.fail_on.lock().await;
        if let Some(needle) = fail_on.iter().find(|n| args.iter().any(|a| a.contains(n.as_str()))) {
            return Err(exit(format!("refusing {needle}")));
        }

        if let Some(input) = args.first().filter(|arg| !arg.starts_with('-')) {
            if !Path::new(input).exists() {
                return Err(exit(format!("{input}: no such file")));
            }
        }

        if let Some(output) = output_arg(args) {
            std::fs::write(output, b"%PDF-1.4\n%fake\n").map_err(|e| exit(e.to_string()))?;
        }

        let fail_after = self.fail_after_output.lock().await;
        if let Some(needle) = fail_after
            .iter()
            .find(|n| args.iter().any(|a| a.contains(n.as_str())))
        {
            return Err(exit(format!("truncated output after {needle}")));
        }
        Ok(())
    }
}

/// Defaults pointed at `folder`.
pub fn test_config(folder: &Path) -> Config {
    let mut config = Config::from_toml_str("").expect("default config");
    config.pdf.folder = folder.to_path_buf();
    config.pdf.owner_password = "owner-secret".to_string();
    config.email.sender = "letters@test".to_string();
    config.email.bcc = "archive@test".to_string();
    config.email.bad_email_default = "nobody@test".to_string();
    config
}

pub fn customer(plan_no: &str, phone: &str) -> CustomerRecord {
    CustomerRecord {
        product: "UNKNOWN".to_string(),
        email: format!("{plan_no}@customers.test"),
        phone: phone.to_string(),
        postcode: "AB1 2CD".to_string(),
        title: "Mrs".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        password: String::new(),
        status: "A".to_string(),
        plan_no: plan_no.to_string(),
    }
}

/// Names of the files left in `folder`, sorted.
pub fn folder_listing(folder: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .expect("read folder")
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();
    names.sort();
    names
}

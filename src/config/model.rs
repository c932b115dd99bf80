//! Configuration model. Every section is deserialized from the embedded
//! defaults first, so override files only need the keys they change.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub renderer: RendererConfig,
    pub pdf: PdfConfig,
    pub email: EmailConfig,
    pub fields: FieldsConfig,
    pub notices: NoticesConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the discrete settings below.
    #[serde(default)]
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

/// External report renderer and the two queues it prints from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    pub exec: PathBuf,
    /// Database access arguments passed through to the renderer verbatim.
    #[serde(default)]
    pub db_access: Vec<String>,
    pub letters: QueueSpec,
    pub notices: QueueSpec,
}

/// One queue table and how to render its rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSpec {
    /// Report template handed to the renderer.
    pub report: PathBuf,
    pub table: String,
    /// SQL expression yielding the plan number.
    pub plan_no: String,
    /// SQL expression yielding the standard letter id.
    pub letter_id: String,
    /// Letterhead PDF, relative to `pdf.folder`, laid under every page.
    #[serde(default)]
    pub letterhead: Option<String>,
    /// Column stamped with the claim time, when the table has one.
    #[serde(default)]
    pub printed_when: Option<String>,
    /// Column giving FIFO order for batch numbering; physical order otherwise.
    #[serde(default)]
    pub order_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfConfig {
    pub exec: PathBuf,
    pub folder: PathBuf,
    /// Regex selecting the produced PDFs the secure pass picks up.
    pub mask: String,
    pub info_file: String,
    pub title: String,
    pub author: String,
    pub draft_prefix: String,
    pub intermediate_prefix: String,
    pub secured_prefix: String,
    pub owner_password: String,
    /// Appended to every PDF tool invocation.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl PdfConfig {
    pub fn info_path(&self) -> PathBuf {
        self.folder.join(&self.info_file)
    }

    pub fn in_folder(&self, name: impl AsRef<Path>) -> PathBuf {
        self.folder.join(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Recorded as `SentBy` on every outgoing row.
    pub sender: String,
    #[serde(default)]
    pub bcc: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub bad_email_default: String,
    pub bad_product_default: String,
    /// Placeholder names bound, in order, to the customer record fields.
    pub plan_fields: Vec<String>,
    /// Product -> PDF tool permission arguments.
    #[serde(default)]
    pub terms: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldsConfig {
    pub currency_symbol: String,
    /// Used when a date field has no value; `YYYY-MM-DD`.
    pub default_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoticesConfig {
    /// Standard letter printed as page two of every direct-debit notice.
    pub page2_letter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Abort on the first per-row failure instead of recording it.
    #[serde(default)]
    pub fail_fast: bool,
    /// `DelMeth` value marking a row for email delivery.
    pub email_delivery_code: i32,
}

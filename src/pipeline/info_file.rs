//! Document metadata in the PDF toolkit's `update_info` format.

use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct InfoFile {
    pub title: String,
    pub author: String,
    pub producer: String,
    pub created: DateTime<Local>,
}

impl InfoFile {
    pub fn new(title: &str, author: &str, producer: &str) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            producer: producer.to_string(),
            created: Local::now(),
        }
    }

    pub fn render(&self) -> String {
        let created = format!("D:{}", self.created.format("%Y%m%d%H%M%S"));
        let mut out = String::new();
        for (key, value) in [
            ("Title", self.title.as_str()),
            ("Author", self.author.as_str()),
            ("Producer", self.producer.as_str()),
            ("CreationDate", created.as_str()),
        ] {
            let _ = write!(out, "InfoBegin\nInfoKey: {key}\nInfoValue: {value}\n");
        }
        out
    }

    pub async fn write(&self, path: &Path) -> std::io::Result<()> {
        tokio::fs::write(path, self.render()).await
    }
}

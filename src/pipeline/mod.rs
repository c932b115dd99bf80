//! The batch run: letters queue, direct-debit queue, then the secure pass.
//!
//! - `claim` - batch claiming over a queue table
//! - `producer` - renders and letterheads each claimed row
//! - `secure` - encrypts produced PDFs and queues their emails
//! - `info_file` - PDF metadata written once per run
//! - `files` - file naming inside the output folder

pub mod claim;
pub mod files;
pub mod info_file;
pub mod producer;
pub mod secure;

pub use claim::BatchClaimer;
pub use producer::{DocumentProducer, ProduceReport};
pub use secure::{SecureOutcome, SecureOutputProcessor, SecureReport};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::db::{LetterStore, StoreError};
use crate::letters::{FieldFormat, FieldResolver, NoticeFormatter, NoticeReport, TemplateEngine};
use crate::tools::{CommandRunner, PdfTool, ReportRenderer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid pdf mask: {0}")]
    Mask(#[from] regex::Error),
    #[error("stopping at first failure: {0}")]
    FailFast(RowFailure),
}

/// Where a row or file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Render,
    Letterhead,
    Notice,
    Restrict,
    Finalize,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Render => "render",
            Stage::Letterhead => "letterhead",
            Stage::Notice => "notice",
            Stage::Restrict => "restrict",
            Stage::Finalize => "finalize",
            Stage::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// A row or file that could not be completed; the run carried on without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    pub stage: Stage,
    pub subject: String,
    pub reason: String,
}

impl RowFailure {
    pub fn new(stage: Stage, subject: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            stage,
            subject: subject.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.subject, self.reason)
    }
}

impl std::error::Error for RowFailure {}

#[derive(Debug, Default)]
pub struct RunReport {
    pub letters: ProduceReport,
    pub notices: NoticeReport,
    pub direct_debits: ProduceReport,
    pub secured: SecureReport,
}

impl RunReport {
    pub fn failures(&self) -> Vec<RowFailure> {
        let notice_failures = self.notices.failures.iter().map(|failure| {
            RowFailure::new(
                Stage::Notice,
                format!("notice {} ({})", failure.notice_id, failure.account_ref),
                &failure.reason,
            )
        });
        self.letters
            .failures
            .iter()
            .cloned()
            .chain(notice_failures)
            .chain(self.direct_debits.failures.iter().cloned())
            .chain(self.secured.failures.iter().cloned())
            .collect()
    }

    pub fn log_summary(&self) {
        let failures = self.failures();
        if failures.is_empty() {
            return;
        }
        log::warn!("{} item(s) need attention:", failures.len());
        for failure in &failures {
            log::warn!("  {}", failure);
        }
    }
}

pub struct Pipeline {
    config: Config,
    producer: DocumentProducer,
    notices: NoticeFormatter,
    secure: SecureOutputProcessor,
}

impl Pipeline {
    /// Wire every component to the one store and runner.
    pub fn new(
        config: Config,
        store: Arc<dyn LetterStore>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self, PipelineError> {
        let fail_fast = config.pipeline.fail_fast;
        let pdftk = Arc::new(PdfTool::new(
            config.pdf.exec.clone(),
            config.pdf.extra_args.clone(),
            runner.clone(),
        ));

        let producer = DocumentProducer::new(
            BatchClaimer::new(store.clone(), config.pipeline.email_delivery_code),
            ReportRenderer::new(
                config.renderer.exec.clone(),
                config.renderer.db_access.clone(),
                runner,
            ),
            pdftk.clone(),
            config.pdf.folder.clone(),
            config.pdf.draft_prefix.clone(),
            fail_fast,
        );

        let engine = TemplateEngine::new(FieldResolver::new(
            store.clone(),
            FieldFormat::from(&config.fields),
        ));
        let notices = NoticeFormatter::new(store.clone(), engine, config.notices.page2_letter.clone());

        let secure = SecureOutputProcessor::new(
            store,
            pdftk,
            config.pdf.clone(),
            config.email.clone(),
            config.customer_defaults(),
            fail_fast,
        )?;

        Ok(Self {
            config,
            producer,
            notices,
            secure,
        })
    }

    /// Run every phase in order; each finishes before the next starts.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let folder = &self.config.pdf.folder;
        tokio::fs::create_dir_all(folder)
            .await
            .map_err(|source| PipelineError::Io {
                path: folder.clone(),
                source,
            })?;

        log::info!("Processing letters ...");
        let letters = self.producer.produce(&self.config.renderer.letters).await?;

        log::info!("Processing DDs ...");
        let notices = self.notices.prepare_notice_bodies().await?;
        if self.config.pipeline.fail_fast {
            if let Some(failure) = notices.failures.first() {
                return Err(PipelineError::FailFast(RowFailure::new(
                    Stage::Notice,
                    format!("notice {}", failure.notice_id),
                    &failure.reason,
                )));
            }
        }
        let direct_debits = self.producer.produce(&self.config.renderer.notices).await?;

        log::info!("Making secure PDFs ...");
        let secured = self.secure.secure_all().await?;

        Ok(RunReport {
            letters,
            notices,
            direct_debits,
            secured,
        })
    }
}

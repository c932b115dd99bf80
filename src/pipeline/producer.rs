//! Document production: render each claimed row, lay the letterhead under
//! it, drop the draft.

use std::path::PathBuf;
use std::sync::Arc;

use super::claim::BatchClaimer;
use super::files::{discard, draft_name, produced_name};
use super::{PipelineError, RowFailure, Stage};
use crate::config::QueueSpec;
use crate::models::{BatchRange, QueueRow};
use crate::tools::{PdfTool, ReportRenderer};

#[derive(Debug, Default)]
pub struct ProduceReport {
    pub range: Option<BatchRange>,
    pub produced: Vec<PathBuf>,
    pub failures: Vec<RowFailure>,
}

pub struct DocumentProducer {
    claimer: BatchClaimer,
    renderer: ReportRenderer,
    pdftk: Arc<PdfTool>,
    folder: PathBuf,
    draft_prefix: String,
    fail_fast: bool,
}

impl DocumentProducer {
    pub fn new(
        claimer: BatchClaimer,
        renderer: ReportRenderer,
        pdftk: Arc<PdfTool>,
        folder: PathBuf,
        draft_prefix: String,
        fail_fast: bool,
    ) -> Self {
        Self {
            claimer,
            renderer,
            pdftk,
            folder,
            draft_prefix,
            fail_fast,
        }
    }

    /// Claim the pending rows of `queue` and produce one PDF per row.
    pub async fn produce(&self, queue: &QueueSpec) -> Result<ProduceReport, PipelineError> {
        let (range, rows) = self.claimer.claim(queue).await?;
        let mut report = ProduceReport {
            range: Some(range),
            ..Default::default()
        };

        for row in &rows {
            match self.produce_row(queue, row).await {
                Ok(path) => report.produced.push(path),
                Err(failure) if self.fail_fast => return Err(PipelineError::FailFast(failure)),
                Err(failure) => {
                    log::warn!("{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        log::info!("{} PDFs generated", report.produced.len());
        Ok(report)
    }

    async fn produce_row(&self, queue: &QueueSpec, row: &QueueRow) -> Result<PathBuf, RowFailure> {
        let draft_file = draft_name(&self.draft_prefix, &row.plan_no, &row.letter_id);
        let draft = self.folder.join(&draft_file);
        let output = self.folder.join(produced_name(&draft_file));
        let subject = format!("batch {} (plan {}, letter {})", row.batch, row.plan_no, row.letter_id);

        if let Err(err) = self.renderer.render(&queue.report, &draft, row.batch).await {
            discard(&draft).await;
            return Err(RowFailure::new(Stage::Render, subject, err));
        }

        let letterhead = queue.letterhead.as_ref().map(|name| self.folder.join(name));
        let overlaid = self
            .pdftk
            .overlay(&draft, letterhead.as_deref(), &output)
            .await;
        discard(&draft).await;
        if let Err(err) = overlaid {
            discard(&output).await;
            return Err(RowFailure::new(Stage::Letterhead, subject, err));
        }

        Ok(output)
    }
}

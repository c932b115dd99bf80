//! Page-two bodies for direct-debit notices.
//!
//! The notice report prints `ltr2Body` as already-rendered text, so the
//! standard letter is substituted here, once per pending notice, before the
//! notice queue is produced.

use std::sync::Arc;

use super::template::TemplateEngine;
use super::LetterError;
use crate::db::{LetterStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeFailure {
    pub notice_id: i64,
    pub account_ref: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct NoticeReport {
    pub formatted: usize,
    pub failures: Vec<NoticeFailure>,
    /// The configured page-two letter does not exist; nothing was written.
    pub template_missing: bool,
}

pub struct NoticeFormatter {
    store: Arc<dyn LetterStore>,
    engine: TemplateEngine,
    page2_letter: String,
}

impl NoticeFormatter {
    pub fn new(store: Arc<dyn LetterStore>, engine: TemplateEngine, page2_letter: String) -> Self {
        Self {
            store,
            engine,
            page2_letter,
        }
    }

    /// Write the substituted page-two body onto every unedited notice.
    pub async fn prepare_notice_bodies(&self) -> Result<NoticeReport, StoreError> {
        let mut report = NoticeReport::default();

        let Some(body) = self.store.letter_body(&self.page2_letter).await? else {
            log::warn!(
                "Standard letter {} not found; direct-debit page two left unchanged",
                self.page2_letter
            );
            report.template_missing = true;
            return Ok(report);
        };

        for notice in self.store.pending_notices().await? {
            match self.engine.substitute(&body, &notice.account_ref).await {
                Ok(text) => {
                    self.store.store_notice_body(notice.id, &text).await?;
                    report.formatted += 1;
                }
                Err(LetterError::Store(err)) => return Err(err),
                Err(err) => {
                    log::warn!("Notice {} ({}): {}", notice.id, notice.account_ref, err);
                    report.failures.push(NoticeFailure {
                        notice_id: notice.id,
                        account_ref: notice.account_ref.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        log::debug!("{} direct-debit notices formatted", report.formatted);
        Ok(report)
    }
}

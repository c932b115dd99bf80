//! Secure output: encrypt every produced PDF with a key derived from the
//! customer record, tag it with the run's metadata and queue it for email.
//!
//! The produced file is only deleted once the secured copy exists, so a file
//! whose tools fail stays in the folder and is picked up by the next run.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::files::{discard, remove_if_exists, swap_prefix};
use super::info_file::InfoFile;
use super::{PipelineError, RowFailure, Stage};
use crate::config::{EmailConfig, PdfConfig};
use crate::db::LetterStore;
use crate::letters::common::{greeting, password_from_phone, plan_no_from_filename};
use crate::letters::substitute_named;
use crate::models::{CustomerDefaults, CustomerRecord, OutgoingEmail};
use crate::tools::{path_arg, PdfTool};

#[derive(Debug)]
pub enum SecureOutcome {
    Secured(PathBuf),
    Skipped(String),
    Failed(RowFailure),
}

#[derive(Debug, Default)]
pub struct SecureReport {
    pub secured: Vec<PathBuf>,
    pub skipped: Vec<String>,
    pub failures: Vec<RowFailure>,
}

pub struct SecureOutputProcessor {
    store: Arc<dyn LetterStore>,
    pdftk: Arc<PdfTool>,
    pdf: PdfConfig,
    email: EmailConfig,
    defaults: CustomerDefaults,
    mask: Regex,
    fail_fast: bool,
}

impl SecureOutputProcessor {
    pub fn new(
        store: Arc<dyn LetterStore>,
        pdftk: Arc<PdfTool>,
        pdf: PdfConfig,
        email: EmailConfig,
        defaults: CustomerDefaults,
        fail_fast: bool,
    ) -> Result<Self, PipelineError> {
        let mask = Regex::new(&pdf.mask)?;
        Ok(Self {
            store,
            pdftk,
            pdf,
            email,
            defaults,
            mask,
            fail_fast,
        })
    }

    /// Secure every file in the output folder that matches the mask.
    pub async fn secure_all(&self) -> Result<SecureReport, PipelineError> {
        let info_path = self.pdf.info_path();
        InfoFile::new(&self.pdf.title, &self.pdf.author, crate::PRODUCER)
            .write(&info_path)
            .await
            .map_err(|source| PipelineError::Io {
                path: info_path.clone(),
                source,
            })?;

        let candidates = self.candidates().await?;
        log::debug!(
            "Scanning {} for '{}': {} file(s)",
            self.pdf.folder.display(),
            self.pdf.mask,
            candidates.len()
        );

        let mut report = SecureReport::default();
        for filename in candidates {
            log::debug!("Securing {}", filename);
            match self.secure(&filename).await? {
                SecureOutcome::Secured(path) => report.secured.push(path),
                SecureOutcome::Skipped(reason) => {
                    log::warn!("{}", reason);
                    report.skipped.push(reason);
                }
                SecureOutcome::Failed(failure) if self.fail_fast => {
                    return Err(PipelineError::FailFast(failure))
                }
                SecureOutcome::Failed(failure) => {
                    log::warn!("{}", failure);
                    report.failures.push(failure);
                }
            }
        }

        log::info!("{} PDFs secured", report.secured.len());
        Ok(report)
    }

    /// Secure one file of the output folder.
    ///
    /// Only database errors are returned as `Err`; everything else is an outcome.
    pub async fn secure(&self, filename: &str) -> Result<SecureOutcome, PipelineError> {
        let Some(plan_no) = plan_no_from_filename(filename) else {
            return Ok(SecureOutcome::Skipped(format!(
                "Cannot process file {filename}. No plan number"
            )));
        };
        let Ok(plan_id) = plan_no.parse::<i64>() else {
            return Ok(SecureOutcome::Skipped(format!(
                "Cannot process file {filename}. Plan number {plan_no} out of range"
            )));
        };
        if !filename.contains(&self.pdf.draft_prefix) {
            return Ok(SecureOutcome::Skipped(format!(
                "Cannot process file {filename}. Name lacks prefix '{}'",
                self.pdf.draft_prefix
            )));
        }

        let Some(customer) = self.store.customer(plan_no, &self.defaults).await? else {
            return Ok(SecureOutcome::Skipped(format!(
                "Cannot process file {filename}. No customer for plan {plan_no}"
            )));
        };

        let user_password = password_from_phone(&customer.phone);
        if user_password.is_empty() {
            log::warn!(
                "{}: plan {} has no phone number, securing without a user password",
                filename,
                plan_no
            );
        }
        let policy = match self.email.terms.get(&customer.product) {
            Some(policy) => policy.as_str(),
            None => {
                log::warn!(
                    "{}: no terms for product '{}', applying none",
                    filename,
                    customer.product
                );
                ""
            }
        };

        let source = self.pdf.in_folder(filename);
        let intermediate = self.pdf.in_folder(swap_prefix(
            filename,
            &self.pdf.draft_prefix,
            &self.pdf.intermediate_prefix,
        ));
        let secured = self.pdf.in_folder(swap_prefix(
            filename,
            &self.pdf.draft_prefix,
            &self.pdf.secured_prefix,
        ));

        if let Err(err) = self.pdftk.restrict(&source, policy, &intermediate).await {
            discard(&intermediate).await;
            return Ok(SecureOutcome::Failed(RowFailure::new(
                Stage::Restrict,
                filename,
                err,
            )));
        }

        let finalized = self
            .pdftk
            .finalize(
                &intermediate,
                &self.pdf.info_path(),
                &secured,
                &self.pdf.owner_password,
                &user_password,
            )
            .await;
        discard(&intermediate).await;
        if let Err(err) = finalized {
            discard(&secured).await;
            return Ok(SecureOutcome::Failed(RowFailure::new(
                Stage::Finalize,
                filename,
                err,
            )));
        }

        if let Err(err) = remove_if_exists(&source).await {
            return Ok(SecureOutcome::Failed(RowFailure::new(
                Stage::Cleanup,
                filename,
                err,
            )));
        }

        let email = self.outgoing_email(plan_id, &customer, &secured);
        self.store.enqueue_email(&email).await?;

        Ok(SecureOutcome::Secured(secured))
    }

    /// The email record announcing `attachment` to the customer.
    pub fn outgoing_email(
        &self,
        plan_no: i64,
        customer: &CustomerRecord,
        attachment: &Path,
    ) -> OutgoingEmail {
        let dear = greeting(&customer.title, &customer.first_name, &customer.last_name);
        let mut values: Vec<(&str, &str)> = vec![("DearSir", dear.as_str())];
        values.extend(
            self.email
                .plan_fields
                .iter()
                .map(String::as_str)
                .zip(customer.positional_values()),
        );

        let to_address = if customer.email.trim().is_empty() {
            self.defaults.email.clone()
        } else {
            customer.email.clone()
        };

        OutgoingEmail {
            sent_by: self.email.sender.clone(),
            plan_no,
            to_address,
            bcc_address: self.email.bcc.clone(),
            subject: substitute_named(&self.email.subject, &values),
            body: substitute_named(&self.email.body, &values),
            attachment: path_arg(attachment),
        }
    }

    async fn candidates(&self) -> Result<Vec<String>, PipelineError> {
        let folder = &self.pdf.folder;
        let io_err = |source| PipelineError::Io {
            path: folder.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(folder).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                _ => continue,
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name != self.pdf.info_file && self.mask.is_match(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

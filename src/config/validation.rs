//! Startup validation of the merged configuration.
//!
//! Problems are collected rather than returned one at a time so a broken
//! override file can be fixed in a single pass.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use super::model::{Config, QueueSpec};

lazy_static! {
    static ref SQL_IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").expect("valid regex");
}

/// A single configuration problem.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Dotted key, e.g. `pdf.mask`.
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn empty_field(field: &str) -> Self {
        Self::new(field, "must not be empty")
    }

    pub fn invalid_identifier(field: &str, value: &str) -> Self {
        Self::new(field, format!("'{}' is not a plain SQL identifier", value))
            .with_suggestion("use letters, digits and underscores, optionally schema-qualified")
    }

    pub fn invalid_regex(field: &str, err: &regex::Error) -> Self {
        Self::new(field, format!("invalid regular expression: {}", err))
    }

    pub fn invalid_date(field: &str, value: &str) -> Self {
        Self::new(field, format!("'{}' is not a date", value)).with_suggestion("use YYYY-MM-DD")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration problem(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_sql_identifier(value: &str) -> bool {
    SQL_IDENTIFIER.is_match(value)
}

fn validate_required(value: &str, field: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field));
    }
}

fn validate_identifier(value: &str, field: &str, errors: &mut ValidationErrors) {
    if !is_sql_identifier(value) {
        errors.add(ValidationError::invalid_identifier(field, value));
    }
}

fn validate_queue(queue: &QueueSpec, section: &str, errors: &mut ValidationErrors) {
    validate_identifier(&queue.table, &format!("{section}.table"), errors);
    validate_required(&queue.plan_no, &format!("{section}.plan_no"), errors);
    validate_required(&queue.letter_id, &format!("{section}.letter_id"), errors);
    if queue.report.as_os_str().is_empty() {
        errors.add(ValidationError::empty_field(&format!("{section}.report")));
    }
    if let Some(column) = &queue.printed_when {
        validate_identifier(column, &format!("{section}.printed_when"), errors);
    }
    if let Some(column) = &queue.order_by {
        validate_identifier(column, &format!("{section}.order_by"), errors);
    }
}

/// Check everything the pipeline relies on before it touches the database.
pub fn validate(config: &Config) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    validate_queue(&config.renderer.letters, "renderer.letters", &mut errors);
    validate_queue(&config.renderer.notices, "renderer.notices", &mut errors);

    let pdf = &config.pdf;
    for (path, field) in [
        (&config.renderer.exec, "renderer.exec"),
        (&pdf.exec, "pdf.exec"),
        (&pdf.folder, "pdf.folder"),
    ] {
        if path.as_os_str().is_empty() {
            errors.add(ValidationError::empty_field(field));
        }
    }
    if let Err(err) = Regex::new(&pdf.mask) {
        errors.add(ValidationError::invalid_regex("pdf.mask", &err));
    }
    validate_required(&pdf.info_file, "pdf.info_file", &mut errors);
    validate_required(&pdf.draft_prefix, "pdf.draft_prefix", &mut errors);
    validate_required(&pdf.intermediate_prefix, "pdf.intermediate_prefix", &mut errors);
    validate_required(&pdf.secured_prefix, "pdf.secured_prefix", &mut errors);
    if pdf.draft_prefix == pdf.intermediate_prefix
        || pdf.draft_prefix == pdf.secured_prefix
        || pdf.intermediate_prefix == pdf.secured_prefix
    {
        errors.add(
            ValidationError::new("pdf.*_prefix", "draft, intermediate and secured prefixes collide")
                .with_suggestion("give each stage its own file name prefix"),
        );
    }
    if let Ok(mask) = Regex::new(&pdf.mask) {
        let secured_sample = format!("{}1-1.pdf", pdf.secured_prefix);
        if mask.is_match(&secured_sample) {
            errors.add(
                ValidationError::new("pdf.mask", "matches secured file names")
                    .with_suggestion("anchor the mask on the draft prefix"),
            );
        }
    }

    if config.email.plan_fields.len() != 10 {
        errors.add(
            ValidationError::new(
                "email.plan_fields",
                format!("expected 10 names, found {}", config.email.plan_fields.len()),
            )
            .with_suggestion(
                "Product, Email, Phone, Postcode, Title, Firstname, Lastname, Password, Status, PlanNo",
            ),
        );
    }
    validate_required(&config.email.sender, "email.sender", &mut errors);
    validate_required(
        &config.email.bad_product_default,
        "email.bad_product_default",
        &mut errors,
    );

    if NaiveDate::parse_from_str(&config.fields.default_date, "%Y-%m-%d").is_err() {
        errors.add(ValidationError::invalid_date(
            "fields.default_date",
            &config.fields.default_date,
        ));
    }
    validate_required(&config.notices.page2_letter, "notices.page2_letter", &mut errors);

    errors.into_result()
}

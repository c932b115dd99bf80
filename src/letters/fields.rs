//! Typed letter field resolution.

use moka::future::Cache;
use std::sync::Arc;

use super::common::{format_currency, format_date, format_integer, parse_currency};
use super::LetterError;
use crate::config::FieldsConfig;
use crate::db::LetterStore;
use crate::models::{FieldDefinition, FieldType};

const DEFINITION_CACHE_CAPACITY: u64 = 512;

/// Per-run formatting settings.
#[derive(Debug, Clone)]
pub struct FieldFormat {
    pub currency_symbol: String,
    /// `YYYY-MM-DD`, rendered when a date field has no value.
    pub default_date: String,
}

impl From<&FieldsConfig> for FieldFormat {
    fn from(config: &FieldsConfig) -> Self {
        Self {
            currency_symbol: config.currency_symbol.clone(),
            default_date: config.default_date.clone(),
        }
    }
}

/// Resolves `[[FIELD]]` placeholders to display text for one plan.
pub struct FieldResolver {
    store: Arc<dyn LetterStore>,
    format: FieldFormat,
    /// Definitions do not change during a run; unknown ids are cached as `None`.
    definitions: Cache<String, Option<FieldDefinition>>,
}

impl FieldResolver {
    pub fn new(store: Arc<dyn LetterStore>, format: FieldFormat) -> Self {
        Self {
            store,
            format,
            definitions: Cache::builder()
                .max_capacity(DEFINITION_CACHE_CAPACITY)
                .build(),
        }
    }

    /// Formatted value of `field_id` for `plan_no`.
    ///
    /// Unknown field ids resolve to an empty string.
    pub async fn resolve(&self, field_id: &str, plan_no: &str) -> Result<String, LetterError> {
        let Some(field) = self.definition(field_id).await? else {
            log::debug!("No definition for letter field {}", field_id);
            return Ok(String::new());
        };
        let value = self.store.field_value(&field, plan_no).await?;
        self.format_value(&field, value.as_deref())
    }

    /// Apply the field's type formatting; `None` means no row or NULL.
    pub fn format_value(
        &self,
        field: &FieldDefinition,
        value: Option<&str>,
    ) -> Result<String, LetterError> {
        match field.field_type {
            FieldType::Text => Ok(value.unwrap_or_default().to_string()),
            FieldType::Integer => Ok(value.map(format_integer).unwrap_or_else(|| "0".to_string())),
            FieldType::Currency => Ok(format_currency(
                &self.format.currency_symbol,
                value.map(parse_currency).unwrap_or(0.0),
            )),
            FieldType::Date => {
                let raw = value.unwrap_or(&self.format.default_date);
                format_date(raw).ok_or_else(|| LetterError::MalformedDate {
                    field: field.field_id.clone(),
                    value: raw.to_string(),
                })
            }
        }
    }

    async fn definition(&self, field_id: &str) -> Result<Option<FieldDefinition>, LetterError> {
        if let Some(cached) = self.definitions.get(field_id).await {
            return Ok(cached);
        }
        let definition = self.store.field_definition(field_id).await?;
        self.definitions
            .insert(field_id.to_string(), definition.clone())
            .await;
        Ok(definition)
    }
}

//! Letter field definitions and their values

use super::{PgLetterStore, StoreError};
use crate::models::{FieldDefinition, FieldType};

impl PgLetterStore {
    pub(super) async fn get_field_definition(
        &self,
        field_id: &str,
    ) -> Result<Option<FieldDefinition>, StoreError> {
        let row: Option<(String, i32)> = sqlx::query_as(
            "SELECT COALESCE(FieldSQL, ''), COALESCE(FieldValueType, 0)::INT FROM tstdletterfields WHERE FieldID = $1",
        )
        .bind(field_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row
            .filter(|(sql, _)| !sql.trim().is_empty())
            .map(|(sql, code)| FieldDefinition {
                field_id: field_id.to_string(),
                sql,
                field_type: FieldType::from_code(code),
            }))
    }

    /// `FieldSQL` holds a select list plus FROM clause, e.g.
    /// `Balance FROM tcustomers`; it is wrapped so the value comes back as text
    /// whatever its column type.
    pub(super) async fn get_field_value(
        &self,
        field: &FieldDefinition,
        plan_no: &str,
    ) -> Result<Option<String>, StoreError> {
        let sql = format!(
            "SELECT field_value.v::TEXT FROM (SELECT {} WHERE CAST(PlanNo AS TEXT) = $1 LIMIT 1) AS field_value(v)",
            field.sql
        );
        let value: Option<Option<String>> = sqlx::query_scalar(&sql)
            .bind(plan_no)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value.flatten())
    }
}

use super::{PgLetterStore, StoreError};
use crate::models::{CustomerDefaults, CustomerRecord};

impl PgLetterStore {
    /// Customer fields for `plan_no` with NULLs replaced; product and email
    /// fall back to the configured defaults.
    pub(super) async fn get_customer(
        &self,
        plan_no: &str,
        defaults: &CustomerDefaults,
    ) -> Result<Option<CustomerRecord>, StoreError> {
        let customer = sqlx::query_as::<_, CustomerRecord>(
            r#"
            SELECT COALESCE(Product::TEXT, $2) AS product,
                   COALESCE(cEmail, $3) AS email,
                   COALESCE(cPhone, '') AS phone,
                   COALESCE(cPostcode, '') AS postcode,
                   COALESCE(cTitle, '') AS title,
                   COALESCE(cFirstname, '') AS first_name,
                   COALESCE(cLastname, '') AS last_name,
                   COALESCE(CustomerPassword, '') AS password,
                   COALESCE(RecordStatus::TEXT, '') AS status,
                   PlanNo::TEXT AS plan_no
            FROM tcustomers
            WHERE CAST(PlanNo AS TEXT) = $1
            LIMIT 1
            "#,
        )
        .bind(plan_no)
        .bind(&defaults.product)
        .bind(&defaults.email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(customer)
    }
}

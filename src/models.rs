use sqlx::FromRow;

/// A claimed queue row, read back after the batch range is assigned.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct QueueRow {
    pub plan_no: String,
    pub letter_id: String,
    pub batch: i64,
}

/// Batch numbers `(first, last]` owned by the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    /// Highest batch number that existed before the claim.
    pub first: i64,
    /// Highest batch number assigned by the claim.
    pub last: i64,
}

impl BatchRange {
    pub fn new(first: i64, last: i64) -> Self {
        Self { first, last }
    }

    pub fn is_empty(&self) -> bool {
        self.last <= self.first
    }

    pub fn len(&self) -> u64 {
        (self.last - self.first).max(0) as u64
    }

    pub fn contains(&self, batch: i64) -> bool {
        batch > self.first && batch <= self.last
    }
}

/// How a letter field is rendered. Stored as an integer in `tstdletterfields`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Currency,
    Date,
}

impl FieldType {
    /// Map the `FieldValueType` column; unknown codes render as text.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Integer,
            2 => Self::Currency,
            3 => Self::Date,
            _ => Self::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub field_id: String,
    /// Select-list and FROM clause; the plan filter is appended at query time.
    pub sql: String,
    pub field_type: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PendingNotice {
    pub id: i64,
    pub account_ref: String,
}

/// Customer fields used to key and address a secured letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
pub struct CustomerRecord {
    pub product: String,
    pub email: String,
    pub phone: String,
    pub postcode: String,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub status: String,
    pub plan_no: String,
}

impl CustomerRecord {
    /// Field values in the positional order `email.plan_fields` names them.
    pub fn positional_values(&self) -> [&str; 10] {
        [
            &self.product,
            &self.email,
            &self.phone,
            &self.postcode,
            &self.title,
            &self.first_name,
            &self.last_name,
            &self.password,
            &self.status,
            &self.plan_no,
        ]
    }
}

/// Substitutes for NULL customer columns.
#[derive(Debug, Clone, Default)]
pub struct CustomerDefaults {
    pub product: String,
    pub email: String,
}

/// A row for `toutgoingemails`; delivery is handled elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub sent_by: String,
    pub plan_no: i64,
    pub to_address: String,
    pub bcc_address: String,
    pub subject: String,
    pub body: String,
    pub attachment: String,
}

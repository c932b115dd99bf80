//! Letter content: typed field resolution, placeholder substitution and the
//! direct-debit page-two bodies.
//!
//! - `fields` - resolves one `[[FIELD]]` against the database
//! - `template` - substitutes every placeholder in a body
//! - `notices` - writes page-two bodies onto pending direct-debit notices
//! - `common` - formatting helpers shared with the secure pass

pub mod common;
pub mod fields;
pub mod notices;
pub mod template;

pub use fields::{FieldFormat, FieldResolver};
pub use notices::{NoticeFormatter, NoticeReport};
pub use template::{substitute_named, TemplateEngine};

use thiserror::Error;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum LetterError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("field {field} holds '{value}', which is not a YYYY-MM-DD date")]
    MalformedDate { field: String, value: String },
}

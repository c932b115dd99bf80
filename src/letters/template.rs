//! Placeholder substitution.
//!
//! Letter bodies use `[[FIELD]]` tokens resolved through the database; email
//! bodies use `#Name#` tokens filled from values the caller already holds.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

use super::fields::FieldResolver;
use super::LetterError;

lazy_static! {
    static ref LETTER_FIELD: Regex = Regex::new(r"\[\[(\w+)\]\]").expect("valid regex");
}

pub struct TemplateEngine {
    resolver: FieldResolver,
}

impl TemplateEngine {
    pub fn new(resolver: FieldResolver) -> Self {
        Self { resolver }
    }

    /// Replace every `[[FIELD]]` in `template` with its value for `plan_no`.
    ///
    /// Each distinct field is resolved once. Substituted values are not
    /// scanned again.
    pub async fn substitute(&self, template: &str, plan_no: &str) -> Result<String, LetterError> {
        let names: Vec<&str> = field_names(template).collect();
        let mut values: HashMap<&str, String> = HashMap::new();
        for name in names {
            if values.contains_key(name) {
                continue;
            }
            let value = self.resolver.resolve(name, plan_no).await?;
            values.insert(name, value);
        }

        Ok(LETTER_FIELD
            .replace_all(template, |caps: &Captures| {
                values.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned())
    }
}

/// Field names referenced by `[[...]]` tokens, in order of appearance.
pub fn field_names(template: &str) -> impl Iterator<Item = &str> {
    LETTER_FIELD
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

/// Replace `#name#` for each supplied pair, scanning the template once.
///
/// Names are matched literally, earlier pairs first; a `#` that starts no
/// supplied name is kept and the scan moves on by one character.
pub fn substitute_named(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find('#') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let hit = values.iter().find(|(name, _)| {
            !name.is_empty()
                && tail
                    .strip_prefix(*name)
                    .is_some_and(|after| after.starts_with('#'))
        });
        match hit {
            Some((name, value)) => {
                out.push_str(value);
                rest = &tail[name.len() + 1..];
            }
            None => {
                out.push('#');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

//! Formatting helpers for letter fields and email addressing.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PLAN_IN_FILENAME: Regex = Regex::new(r"-(\d+)-").expect("valid regex");
}

/// `1234.5` with `£` -> `£1234.50`.
pub fn format_currency(symbol: &str, value: f64) -> String {
    format!("{symbol}{value:.2}")
}

/// Reformat the leading `YYYY-MM-DD` of `value` as `DD/MM/YYYY`.
///
/// Returns `None` when the first ten characters are not a calendar date.
pub fn format_date(value: &str) -> Option<String> {
    let head = value.get(..10)?;
    let date = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
    Some(date.format("%d/%m/%Y").to_string())
}

/// Integer rendering of a database value; fractional values truncate.
pub fn format_integer(value: &str) -> String {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n.to_string();
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => (f.trunc() as i64).to_string(),
        _ => "0".to_string(),
    }
}

pub fn parse_currency(value: &str) -> f64 {
    value.trim().parse::<f64>().ok().filter(|f| f.is_finite()).unwrap_or(0.0)
}

/// The PDF user password: the customer's phone number without spaces.
pub fn password_from_phone(phone: &str) -> String {
    phone.chars().filter(|c| *c != ' ').collect()
}

/// Salutation: title if present, else first initial, then the last name.
pub fn greeting(title: &str, first_name: &str, last_name: &str) -> String {
    let lead = if !title.trim().is_empty() {
        title.trim().to_string()
    } else {
        first_name
            .trim()
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default()
    };
    format!("{} {}", lead, last_name.trim()).trim().to_string()
}

/// Plan number embedded in a produced file name as `-<digits>-`.
pub fn plan_no_from_filename(filename: &str) -> Option<&str> {
    PLAN_IN_FILENAME
        .captures(filename)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

//! Cell-level parsers for the meter-reading CSV dialects.
//!
//! Everything here is total except [`extract_identifier`]: malformed input
//! yields `None` (or the input unchanged) instead of an error.

use readings_client::Gender;
use time::{macros::format_description, Date};
use uuid::Uuid;

#[derive(thiserror::Error, Debug)]
#[error("invalid identifier '{value}': {source}")]
pub struct InvalidIdentifier {
    pub value: String,
    #[source]
    pub source: uuid::Error,
}

/// Parse a strict `dd.MM.yyyy` date.
pub fn parse_date(text: &str) -> Option<Date> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Date::parse(text, format_description!("[day].[month].[year]")).ok()
}

/// Parse a decimal that uses either `,` or `.` as the decimal separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Remove one leading and one trailing double quote when both are present.
pub fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(text)
}

/// Parse a possibly quoted UUID.
pub fn extract_identifier(text: &str) -> Result<Uuid, InvalidIdentifier> {
    let value = strip_quotes(text.trim()).trim();
    Uuid::parse_str(value).map_err(|source| InvalidIdentifier {
        value: value.to_string(),
        source,
    })
}

/// Map a German salutation (`Anrede`) to a gender code.
pub fn map_gender(salutation: &str) -> Gender {
    match salutation.trim().to_lowercase().as_str() {
        "herr" => Gender::Male,
        "frau" => Gender::Female,
        "divers" => Gender::Diverse,
        _ => Gender::Unknown,
    }
}

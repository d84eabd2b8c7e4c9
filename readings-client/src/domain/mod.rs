mod customer;
mod reading;

pub use customer::{Customer, Gender};
pub use reading::{MeterKind, Reading};

/// Error returned when a stored or submitted enum code is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} code '{value}'")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(feature = "serde")]
use time::Date;

// Dates travel as ISO `yyyy-MM-dd` strings over JSON.
#[cfg(feature = "serde")]
time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

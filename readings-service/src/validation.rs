//! Required-field checks for records arriving over HTTP.
//!
//! Deserialization already enforces presence of non-optional fields
//! (`customer`, `kindOfMeter`, `substitute`, `gender`); these checks cover
//! the optional ones the API still insists on, and blank strings.

use readings_client::{Customer, Reading};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// Whether the record is being created or replaces an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    Update,
}

fn blank(text: &str) -> bool {
    text.trim().is_empty()
}

fn check(missing: Vec<&'static str>) -> Result<(), MissingFields> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(MissingFields(missing))
    }
}

pub fn validate_customer(customer: &Customer, intent: Intent) -> Result<(), MissingFields> {
    let mut missing = Vec::new();
    if intent == Intent::Update && customer.id.is_none() {
        missing.push("id");
    }
    if blank(&customer.first_name) {
        missing.push("firstName");
    }
    if blank(&customer.last_name) {
        missing.push("lastName");
    }
    check(missing)
}

pub fn validate_reading(reading: &Reading, intent: Intent) -> Result<(), MissingFields> {
    let mut missing = Vec::new();
    if intent == Intent::Update && reading.id.is_none() {
        missing.push("id");
    }
    if reading.customer.id.is_none() {
        missing.push("customer.id");
    }
    if reading.date_of_reading.is_none() {
        missing.push("dateOfReading");
    }
    if blank(&reading.meter_id) {
        missing.push("meterId");
    }
    if reading.meter_count.is_none() {
        missing.push("meterCount");
    }
    check(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use readings_client::{Gender, MeterKind};
    use time::macros::date;
    use uuid::Uuid;

    fn customer() -> Customer {
        Customer {
            id: Some(Uuid::new_v4()),
            first_name: "Ute".to_string(),
            last_name: "Jäger".to_string(),
            birth_date: None,
            gender: Gender::Female,
        }
    }

    fn reading() -> Reading {
        Reading {
            id: None,
            customer: customer(),
            comment: None,
            date_of_reading: Some(date!(2024-03-01)),
            kind_of_meter: MeterKind::Water,
            meter_count: Some(12.0),
            meter_id: "W-1".to_string(),
            substitute: false,
        }
    }

    #[test]
    fn complete_records_pass() {
        assert_eq!(validate_customer(&customer(), Intent::Update), Ok(()));
        assert_eq!(validate_reading(&reading(), Intent::Create), Ok(()));
    }

    #[test]
    fn update_requires_an_id() {
        let mut c = customer();
        c.id = None;
        assert_eq!(validate_customer(&c, Intent::Create), Ok(()));
        assert_eq!(validate_customer(&c, Intent::Update), Err(MissingFields(vec!["id"])));

        assert_eq!(validate_reading(&reading(), Intent::Update), Err(MissingFields(vec!["id"])));
    }

    #[test]
    fn blank_names_count_as_missing() {
        let mut c = customer();
        c.first_name = "  ".to_string();
        c.last_name.clear();
        let err = validate_customer(&c, Intent::Create).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: firstName, lastName");
    }

    #[test]
    fn reading_lists_every_missing_field() {
        let mut r = reading();
        r.date_of_reading = None;
        r.meter_count = None;
        r.meter_id = String::new();
        r.customer.id = None;
        assert_eq!(
            validate_reading(&r, Intent::Create),
            Err(MissingFields(vec!["customer.id", "dateOfReading", "meterId", "meterCount"]))
        );
    }
}

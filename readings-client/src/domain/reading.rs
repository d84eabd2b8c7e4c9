use std::{fmt, str::FromStr};

use time::Date;
use uuid::Uuid;

use super::{Customer, UnknownCode};

/// Kind of utility a meter measures. The serialized names are the codes
/// stored in `readings.kind_of_meter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MeterKind {
    #[cfg_attr(feature = "serde", serde(rename = "HEIZUNG"))]
    Heating,
    #[cfg_attr(feature = "serde", serde(rename = "STROM"))]
    Electricity,
    #[cfg_attr(feature = "serde", serde(rename = "WASSER"))]
    Water,
    #[cfg_attr(feature = "serde", serde(rename = "UNBEKANNT"))]
    Unknown,
}

impl MeterKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::Heating => "HEIZUNG",
            Self::Electricity => "STROM",
            Self::Water => "WASSER",
            Self::Unknown => "UNBEKANNT",
        }
    }
}

impl fmt::Display for MeterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for MeterKind {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HEIZUNG" => Ok(Self::Heating),
            "STROM" => Ok(Self::Electricity),
            "WASSER" => Ok(Self::Water),
            "UNBEKANNT" => Ok(Self::Unknown),
            _ => Err(UnknownCode {
                kind: "meter kind",
                value: s.to_string(),
            }),
        }
    }
}

/// A single meter reading.
///
/// `customer` is always a resolved record, never a bare id. `meter_count`
/// is `None` when the source value could not be parsed; it is never
/// replaced by zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Reading {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<Uuid>,
    pub customer: Customer,
    #[cfg_attr(feature = "serde", serde(default))]
    pub comment: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, with = "super::iso_date::option"))]
    pub date_of_reading: Option<Date>,
    pub kind_of_meter: MeterKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub meter_count: Option<f64>,
    pub meter_id: String,
    pub substitute: bool,
}

use std::{fmt, str::FromStr};

use time::Date;
use uuid::Uuid;

use super::UnknownCode;

/// Gender codes as stored in the `customers.gender` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Gender {
    #[cfg_attr(feature = "serde", serde(rename = "M"))]
    Male,
    #[cfg_attr(feature = "serde", serde(rename = "W"))]
    Female,
    #[cfg_attr(feature = "serde", serde(rename = "D"))]
    Diverse,
    #[cfg_attr(feature = "serde", serde(rename = "U"))]
    Unknown,
}

impl Gender {
    pub fn code(self) -> &'static str {
        match self {
            Self::Male => "M",
            Self::Female => "W",
            Self::Diverse => "D",
            Self::Unknown => "U",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Gender {
    type Err = UnknownCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M" => Ok(Self::Male),
            "W" => Ok(Self::Female),
            "D" => Ok(Self::Diverse),
            "U" => Ok(Self::Unknown),
            _ => Err(UnknownCode {
                kind: "gender",
                value: s.to_string(),
            }),
        }
    }
}

/// A utility customer.
///
/// `id` is `None` only before the first store write; the store assigns a
/// random id in that case and it never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Customer {
    #[cfg_attr(feature = "serde", serde(default))]
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    #[cfg_attr(feature = "serde", serde(default, with = "super::iso_date::option"))]
    pub birth_date: Option<Date>,
    pub gender: Gender,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gender_codes_round_trip_through_from_str() {
        for g in [Gender::Male, Gender::Female, Gender::Diverse, Gender::Unknown] {
            assert_eq!(g.code().parse::<Gender>(), Ok(g));
        }
        assert_eq!("w".parse::<Gender>(), Ok(Gender::Female));
    }

    #[test]
    fn gender_rejects_unknown_code() {
        let err = "X".parse::<Gender>().unwrap_err();
        assert_eq!(err.kind, "gender");
        assert_eq!(err.value, "X");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn customer_json_uses_camel_case_and_iso_dates() {
        let c = Customer {
            id: None,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            birth_date: Some(time::macros::date!(1990-01-01)),
            gender: Gender::Male,
        };
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["birthDate"], "1990-01-01");
        assert_eq!(json["gender"], "M");

        let back: Customer = serde_json::from_value(serde_json::json!({
            "firstName": "Jane",
            "lastName": "Smith",
            "gender": "W"
        }))
        .unwrap();
        assert_eq!(back.id, None);
        assert_eq!(back.birth_date, None);
        assert_eq!(back.gender, Gender::Female);
    }
}

//! Meter kind detection for series files.

use readings_client::MeterKind;

const NAME_KEYWORDS: &[(MeterKind, &[&str])] = &[
    (MeterKind::Heating, &["heizung"]),
    (MeterKind::Electricity, &["strom"]),
    (MeterKind::Water, &["wasser"]),
];

// Checked in order; the first kind with a matching keyword wins.
const CONTENT_KEYWORDS: &[(MeterKind, &[&str])] = &[
    (MeterKind::Heating, &["heizung", "heating", "xr", "mwh"]),
    (MeterKind::Electricity, &["strom", "kwh", "mst"]),
    (MeterKind::Water, &["wasser", "water", "m³"]),
];

fn first_match(haystack: &str, table: &[(MeterKind, &[&str])]) -> MeterKind {
    let haystack = haystack.to_lowercase();
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k)))
        .map(|(kind, _)| *kind)
        .unwrap_or(MeterKind::Unknown)
}

/// Classify by file name, e.g. `data/strom.csv`.
pub fn from_file_name(name: &str) -> MeterKind {
    first_match(name, NAME_KEYWORDS)
}

/// Classify by preamble and header text (meter ids, units).
pub fn from_content(content: &str) -> MeterKind {
    first_match(content, CONTENT_KEYWORDS)
}

/// File name first; preamble content when the name is missing or says nothing.
pub fn meter_kind(file_name: Option<&str>, content: &str) -> MeterKind {
    match file_name.map(from_file_name) {
        Some(kind) if kind != MeterKind::Unknown => kind,
        _ => from_content(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_keywords_are_case_insensitive() {
        assert_eq!(from_file_name("heizung.csv"), MeterKind::Heating);
        assert_eq!(from_file_name("data/STROM.csv"), MeterKind::Electricity);
        assert_eq!(from_file_name("Wasser_2024.CSV"), MeterKind::Water);
        assert_eq!(from_file_name("gas.csv"), MeterKind::Unknown);
    }

    #[test]
    fn content_detects_electricity() {
        assert_eq!(from_content("MST-123456 kWh data"), MeterKind::Electricity);
        assert_eq!(from_content("Stromzähler mit kWh"), MeterKind::Electricity);
        assert_eq!(from_content("STROM consumption data"), MeterKind::Electricity);
    }

    #[test]
    fn content_detects_water() {
        assert_eq!(from_content("Water meter m³ reading"), MeterKind::Water);
        assert_eq!(from_content("WASSER consumption"), MeterKind::Water);
        assert_eq!(from_content("123,45 m³"), MeterKind::Water);
    }

    #[test]
    fn content_detects_heating() {
        assert_eq!(from_content("Xr-2018-2312456ab heating data"), MeterKind::Heating);
        assert_eq!(from_content("HEIZUNG consumption MWh"), MeterKind::Heating);
        assert_eq!(from_content("Heating meter xr data"), MeterKind::Heating);
    }

    #[test]
    fn content_without_keywords_is_unknown() {
        assert_eq!(from_content("Unknown meter type"), MeterKind::Unknown);
        assert_eq!(from_content(""), MeterKind::Unknown);
        assert_eq!(from_content("some random text"), MeterKind::Unknown);
    }

    #[test]
    fn file_name_wins_over_content() {
        assert_eq!(meter_kind(Some("strom.csv"), "Zählerstand m³"), MeterKind::Electricity);
        assert_eq!(meter_kind(Some("export.csv"), "Zählerstand m³"), MeterKind::Water);
        assert_eq!(meter_kind(None, "MST-1"), MeterKind::Electricity);
        assert_eq!(meter_kind(None, ""), MeterKind::Unknown);
    }
}

//! Structural checks run before a space is stored.

use std::collections::HashSet;

use zonekit_model::{ErrorCode, PairColumn, SpaceData, ValidationError};

/// Returns every structural problem in `data`, in a stable order:
/// self references, duplicates, then length mismatches, zone by zone.
///
/// A neighbor may also appear as a far neighbor; that is allowed.
pub fn validate_space(data: &SpaceData) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (key, zone) in &data.zones {
        if key.trim().is_empty() {
            continue;
        }
        let pairs = zone.pairs();

        for (column, index) in zone.self_references(key) {
            let text = match column {
                PairColumn::FarNeighbors => "Zone sensor (key) cannot be in far neighbors",
                _ => "Zone sensor (key) cannot be in neighbors",
            };
            errors.push(
                ValidationError::new(key.as_str(), column, ErrorCode::SelfReference)
                    .at(index)
                    .with_text(text),
            );
        }

        for (column, text) in [
            (PairColumn::Neighbors, "Duplicate value in neighbors"),
            (PairColumn::FarNeighbors, "Duplicate value in far neighbors"),
        ] {
            let mut seen = HashSet::new();
            for (index, value) in pairs.column(column).iter().enumerate() {
                if value.trim().is_empty() {
                    continue;
                }
                if !seen.insert(value.as_str()) {
                    errors.push(
                        ValidationError::new(key.as_str(), column, ErrorCode::Duplicate)
                            .at(index)
                            .with_text(text),
                    );
                }
            }
        }

        let expected = pairs.len();
        for (column, text) in [
            (PairColumn::FarNeighbors, "far_neighbors length must match neighbors length"),
            (PairColumn::NeighborGroups, "neighbor_groups length must match neighbors length"),
        ] {
            let actual = pairs.column(column).len();
            if actual != expected {
                errors.push(
                    ValidationError::new(key.as_str(), column, ErrorCode::LengthMismatch)
                        .with_text(text)
                        .with_lengths(expected, actual),
                );
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonekit_model::{FieldTag, PairedList, ZoneDraft, ZoneField};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn space(neighbors: &[&str], far: &[&str], groups: &[&str]) -> SpaceData {
        let mut data = SpaceData::default();
        data.zones.insert(
            "sensor.a".to_string(),
            ZoneDraft::from_parts(
                PairedList::from_columns(strings(neighbors), strings(far), strings(groups)),
                vec![],
            ),
        );
        data
    }

    #[test]
    fn test_valid_space() {
        let data = space(&["sensor.b", "sensor.c"], &["sensor.b", "sensor.d"], &["light.a", ""]);
        assert!(validate_space(&data).is_empty());
    }

    #[test]
    fn test_self_reference_per_row() {
        let data = space(&["sensor.b", "sensor.a"], &["sensor.a", ""], &["", ""]);
        let errors = validate_space(&data);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].code, ErrorCode::SelfReference);
        assert_eq!(errors[0].field, FieldTag::Zone(ZoneField::Neighbors));
        assert_eq!(errors[0].index, Some(1));
        assert_eq!(errors[1].field, FieldTag::Zone(ZoneField::FarNeighbors));
        assert_eq!(errors[1].index, Some(0));
    }

    #[test]
    fn test_duplicates_report_later_rows() {
        let data = space(&["sensor.b", "", "", "sensor.b"], &["", "", "", ""], &["", "", "", ""]);
        let errors = validate_space(&data);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::Duplicate);
        assert_eq!(errors[0].index, Some(3));
    }

    #[test]
    fn test_length_mismatch() {
        let data = space(
            &["sensor.b", "sensor.c"],
            &["sensor.d"],
            &["light.a", "light.b", "light.c"],
        );
        let errors = validate_space(&data);

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.code == ErrorCode::LengthMismatch && e.index.is_none()));
        assert_eq!((errors[0].expected, errors[0].actual), (Some(2), Some(1)));
        assert_eq!((errors[1].expected, errors[1].actual), (Some(2), Some(3)));
    }
}

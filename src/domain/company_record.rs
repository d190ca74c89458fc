use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::company_field::CompanyField;

/// Marker stored in place of any value the extractor could not find.
pub const UNKNOWN: &str = "unknown";

/// Older sheets and localized prompts use this spelling of the marker.
const UNKNOWN_ALIASES: [&str; 2] = [UNKNOWN, "未知"];

pub fn is_unknown(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || UNKNOWN_ALIASES.iter().any(|u| value.eq_ignore_ascii_case(u))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyRecord {
    values: HashMap<CompanyField, String>,
    extras: BTreeMap<String, String>,
}

impl CompanyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: CompanyField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    pub fn get_or_unknown(&self, field: CompanyField) -> &str {
        self.get(field).unwrap_or(UNKNOWN)
    }

    pub fn set(&mut self, field: CompanyField, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn with(mut self, field: CompanyField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn remove(&mut self, field: CompanyField) -> Option<String> {
        self.values.remove(&field)
    }

    pub fn extras(&self) -> &BTreeMap<String, String> {
        &self.extras
    }

    pub fn set_extra(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.extras.insert(column.into(), value.into());
    }

    pub fn company_name(&self) -> Option<&str> {
        self.get(CompanyField::CompanyName).filter(|v| !is_unknown(v))
    }

    pub fn revenue(&self) -> Option<&str> {
        self.get(CompanyField::Revenue3Years)
            .filter(|v| !is_unknown(v))
    }

    pub fn row(&self) -> Vec<&str> {
        CompanyField::ALL
            .iter()
            .map(|f| self.get_or_unknown(*f))
            .collect()
    }

    pub fn fill_unknown(&mut self) {
        for field in CompanyField::ALL {
            let empty = self.get(field).map_or(true, |v| v.trim().is_empty());
            if empty {
                self.set(field, UNKNOWN);
            }
        }
    }
}

/// Builds a complete record from whatever the extractor produced for `source_url`.
///
/// Keys may be either field labels or storage columns. Null, false, zero and
/// blank values count as missing. Provenance is always overwritten.
pub fn normalize(raw: &Map<String, Value>, source_url: &str, retrieved_on: NaiveDate) -> CompanyRecord {
    let mut record = CompanyRecord::new();

    for (key, value) in raw {
        match CompanyField::from_key(key) {
            Some(field) => {
                if let Some(text) = value_text(value) {
                    record.set(field, text);
                }
            }
            None => log::debug!("Ignoring extracted key outside the schema: {}", key),
        }
    }

    record.fill_unknown();
    record.set(CompanyField::DataSource, source_url);
    record.set(
        CompanyField::DataTime,
        retrieved_on.format("%Y-%m-%d").to_string(),
    );

    record
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => None,
            _ => Some(n.to_string()),
        },
        Value::String(s) => match s.trim() {
            "" => None,
            trimmed => Some(trimmed.to_string()),
        },
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_text).collect();
            match parts.is_empty() {
                true => None,
                false => Some(parts.join("; ")),
            }
        }
        Value::Object(map) if map.is_empty() => None,
        Value::Object(map) => Some(Value::Object(map.clone()).to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_input_yields_every_field() {
        let record = normalize(&Map::new(), "https://acme.test", date());

        for field in CompanyField::ALL {
            assert!(record.get(field).is_some(), "missing {:?}", field);
        }
        assert_eq!(record.get(CompanyField::CompanyName), Some(UNKNOWN));
        assert_eq!(record.get(CompanyField::DataSource), Some("https://acme.test"));
        assert_eq!(record.get(CompanyField::DataTime), Some("2024-03-09"));
    }

    #[test]
    fn falsy_values_become_unknown() {
        let raw = as_map(json!({
            "Company Name": "Acme Robotics",
            "Company Email": "",
            "Company Phone": null,
            "Employee Count": 0,
            "Contact Twitter": false,
            "Contact LinkedIn": [],
            "Remarks": "   ",
        }));
        let record = normalize(&raw, "u", date());

        assert_eq!(record.get(CompanyField::CompanyName), Some("Acme Robotics"));
        for field in [
            CompanyField::CompanyEmail,
            CompanyField::CompanyPhone,
            CompanyField::EmployeeCount,
            CompanyField::ContactTwitter,
            CompanyField::ContactLinkedin,
            CompanyField::Remarks,
        ] {
            assert_eq!(record.get(field), Some(UNKNOWN), "{:?}", field);
        }
    }

    #[test]
    fn provenance_is_always_overwritten() {
        let raw = as_map(json!({
            "Data Source": "https://elsewhere.test",
            "data_time": "1999-01-01",
        }));
        let record = normalize(&raw, "https://acme.test/about", date());

        assert_eq!(
            record.get(CompanyField::DataSource),
            Some("https://acme.test/about")
        );
        assert_eq!(record.get(CompanyField::DataTime), Some("2024-03-09"));
    }

    #[test]
    fn storage_column_keys_and_non_string_values_are_accepted() {
        let raw = as_map(json!({
            "employee_count": 120,
            "company_email": ["info@acme.test", "sales@acme.test"],
            "unrelated": "dropped",
        }));
        let record = normalize(&raw, "u", date());

        assert_eq!(record.get(CompanyField::EmployeeCount), Some("120"));
        assert_eq!(
            record.get(CompanyField::CompanyEmail),
            Some("info@acme.test; sales@acme.test")
        );
        assert!(record.extras().is_empty());
    }

    #[test]
    fn unknown_marker_matches_aliases() {
        assert!(is_unknown("unknown"));
        assert!(is_unknown("Unknown"));
        assert!(is_unknown("未知"));
        assert!(is_unknown(""));
        assert!(!is_unknown("2023: 1000000"));
    }

    #[test]
    fn revenue_and_name_hide_the_marker() {
        let record = CompanyRecord::new()
            .with(CompanyField::CompanyName, UNKNOWN)
            .with(CompanyField::Revenue3Years, "2023: 5000000");

        assert_eq!(record.company_name(), None);
        assert_eq!(record.revenue(), Some("2023: 5000000"));
    }
}

use chrono::NaiveDate;

use super::{company_field::CompanyField, company_record::is_unknown};

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y年%m月%d日", "%Y.%m.%d"];

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Text(Option<String>),
    Date(Option<NaiveDate>),
    Integer(Option<i64>),
}

pub fn coerce(field: CompanyField, value: Option<&str>) -> ColumnValue {
    let value = value.filter(|v| !is_unknown(v));

    match field {
        CompanyField::EstablishTime => ColumnValue::Date(value.and_then(parse_establish_date)),
        CompanyField::EmployeeCount => ColumnValue::Integer(value.and_then(parse_employee_count)),
        _ => ColumnValue::Text(value.map(str::to_string)),
    }
}

/// Tries each known layout in turn. A bare year maps to January 1st.
pub fn parse_establish_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    match value.len() == 4 && value.chars().all(|c| c.is_ascii_digit()) {
        true => value
            .parse::<i32>()
            .ok()
            .and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1)),
        false => None,
    }
}

pub fn parse_employee_count(value: &str) -> Option<i64> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_date_layout_starts_with_the_year() {
        for input in ["2023-05-01", "2023/05/01", "2023年05月01日", "2023.05.01", "2023"] {
            let date = parse_establish_date(input).expect(input);
            assert!(date.format("%Y-%m-%d").to_string().starts_with("2023"));
        }
        assert_eq!(
            parse_establish_date("2023/05/01"),
            NaiveDate::from_ymd_opt(2023, 5, 1)
        );
        assert_eq!(
            parse_establish_date("2023"),
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );
    }

    #[test]
    fn unparseable_dates_are_null() {
        assert_eq!(parse_establish_date("early nineties"), None);
        assert_eq!(coerce(CompanyField::EstablishTime, Some("未知")), ColumnValue::Date(None));
        assert_eq!(coerce(CompanyField::EstablishTime, Some("")), ColumnValue::Date(None));
        assert_eq!(coerce(CompanyField::EstablishTime, None), ColumnValue::Date(None));
    }

    #[test]
    fn employee_count_keeps_digits() {
        assert_eq!(
            coerce(CompanyField::EmployeeCount, Some("about 120 staff")),
            ColumnValue::Integer(Some(120))
        );
        assert_eq!(coerce(CompanyField::EmployeeCount, Some("未知")), ColumnValue::Integer(None));
        assert_eq!(coerce(CompanyField::EmployeeCount, Some("")), ColumnValue::Integer(None));
        assert_eq!(coerce(CompanyField::EmployeeCount, Some("a few")), ColumnValue::Integer(None));
    }

    #[test]
    fn text_fields_pass_through_except_marker() {
        assert_eq!(
            coerce(CompanyField::CompanyName, Some("Acme")),
            ColumnValue::Text(Some("Acme".to_string()))
        );
        assert_eq!(coerce(CompanyField::Remarks, Some("unknown")), ColumnValue::Text(None));
    }
}

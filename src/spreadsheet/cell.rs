use chrono::Datelike;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::Timelike;
use std::fmt::Display;

/// Raw cell kinds as stored in the worksheet XML, before values are resolved.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    /// Maps the `t` attribute of a `<c>` element to a cell kind.
    pub(crate) fn from_type_attribute(value: Option<&str>) -> Self {
        match value {
            Some("inlineStr") | Some("str") => Self::InlineString,
            Some("s") => Self::SharedString,
            Some("d") => Self::IsoDateTime,
            Some("b") => Self::Boolean,
            Some("e") => Self::Error,
            _ => Self::Number,
        }
    }

    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, true) => Self::NumberDateTime1904,
            (true, true, false) => Self::NumberDateTime1900,
            (true, false, true) => Self::NumberDate1904,
            (true, false, false) => Self::NumberDate1900,
            (false, true, true) => Self::NumberTime1904,
            (false, true, false) => Self::NumberTime1900,
            (false, false, _) => Self::Number,
        }
    }
}

/// Resolved value of a single cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Error(String),
}

/// Text layouts accepted when a date arrives as a string.
const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d", "%d-%b-%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Largest serial Excel can display (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("NaiveDate literal")
}

/// Converts an Excel serial day number to a date.
/// Handles the Lotus 1-2-3 leap year bug for the 1900 epoch.
pub fn serial_to_date(serial: f64, is_1904: bool) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > MAX_SERIAL {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1_462
    } else if days < 60 {
        1
    } else {
        0
    };
    epoch().checked_add_signed(Duration::days(days + offset))
}

/// Converts a date to its Excel serial day number.
pub fn date_to_serial(date: NaiveDate, is_1904: bool) -> f64 {
    let days = (date - epoch()).num_days();
    let serial = if is_1904 {
        days - 1_462
    } else if days < 61 {
        days - 1
    } else {
        days
    };
    serial as f64
}

/// Converts a datetime to its Excel serial number, time of day as the fraction.
pub fn datetime_to_serial(datetime: NaiveDateTime, is_1904: bool) -> f64 {
    let seconds = datetime.time().num_seconds_from_midnight() as f64;
    date_to_serial(datetime.date(), is_1904) + seconds / 86_400.0
}

impl CellValue {
    /// Resolves a raw worksheet value according to its kind.
    /// Shared strings must already be substituted (use `Text` for them).
    pub(crate) fn decode(kind: CellType, raw: String) -> CellValue {
        match kind {
            CellType::Empty => CellValue::Empty,
            CellType::InlineString | CellType::SharedString => CellValue::Text(raw),
            CellType::Boolean => CellValue::Bool(raw.trim() == "1" || raw.trim().eq_ignore_ascii_case("true")),
            CellType::Error => CellValue::Error(raw),
            CellType::IsoDateTime => Self::parse_date_text(&raw)
                .map(CellValue::Date)
                .or_else(|| Self::parse_datetime_text(&raw).map(CellValue::DateTime))
                .unwrap_or(CellValue::Text(raw)),
            CellType::Number | CellType::NumberTime1900 | CellType::NumberTime1904 => match raw.trim().parse::<f64>() {
                Ok(number) => CellValue::Number(number),
                Err(_) => CellValue::Text(raw),
            },
            CellType::NumberDate1900 | CellType::NumberDate1904 | CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                let is_1904 = matches!(kind, CellType::NumberDate1904 | CellType::NumberDateTime1904);
                let Ok(serial) = raw.trim().parse::<f64>() else {
                    return CellValue::Text(raw);
                };
                match serial_to_date(serial, is_1904) {
                    Some(date) if serial.fract() == 0.0 => CellValue::Date(date),
                    Some(date) => {
                        let seconds = (serial.fract() * 86_400.0).round() as i64;
                        CellValue::DateTime(date.and_hms_opt(0, 0, 0).expect("midnight") + Duration::seconds(seconds))
                    }
                    None => CellValue::Number(serial),
                }
            }
        }
    }

    /// Interprets extracted text: blank is empty, numerals become numbers, anything else stays text.
    pub fn parse_text(text: &str) -> CellValue {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return CellValue::Empty;
        }
        let numeral = trimmed.strip_prefix('+').unwrap_or(trimmed).replace(',', "");
        match numeral.parse::<f64>() {
            Ok(number) if number.is_finite() => CellValue::Number(number),
            _ => CellValue::Text(trimmed.to_owned()),
        }
    }

    /// Returns true for empty cells and whitespace-only text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Coerces any date-like representation to a calendar date.
    /// Numbers are read as serials in the 1900 date system.
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(date) => Some(*date),
            CellValue::DateTime(datetime) => Some(datetime.date()),
            CellValue::Number(serial) if *serial >= 1.0 => serial_to_date(*serial, false),
            CellValue::Text(text) => Self::parse_date_text(text)
                .or_else(|| Self::parse_datetime_text(text).map(|datetime| datetime.date())),
            _ => None,
        }
    }

    fn parse_date_text(text: &str) -> Option<NaiveDate> {
        let text = text.trim();
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
    }

    fn parse_datetime_text(text: &str) -> Option<NaiveDateTime> {
        let text = text.trim();
        DATETIME_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{text}"),
            CellValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => write!(f, "{}", *number as i64),
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Bool(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            CellValue::Date(date) => write!(f, "{:04}-{:02}-{:02}", date.year(), date.month(), date.day()),
            CellValue::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(code) => write!(f, "{code}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn custom_number_formats() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd h:mm", true), CellType::NumberDateTime1904);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("\"days\" 0", false), CellType::Number);
    }

    #[test]
    fn serial_dates() {
        assert_eq!(serial_to_date(45_931.0, false), Some(date(2025, 10, 1)));
        assert_eq!(date_to_serial(date(2025, 10, 1), false), 45_931.0);
        assert_eq!(serial_to_date(1.0, false), Some(date(1900, 1, 1)));
        assert_eq!(date_to_serial(date(1900, 1, 1), false), 1.0);
        assert_eq!(serial_to_date(44_469.0, true), Some(date(2025, 10, 1)));
        assert_eq!(date_to_serial(date(2025, 10, 1), true), 44_469.0);
        assert_eq!(serial_to_date(-1.0, false), None);
    }

    #[test]
    fn decode_styled_numbers() {
        assert_eq!(CellValue::decode(CellType::NumberDate1900, "45931".into()), CellValue::Date(date(2025, 10, 1)));
        assert_eq!(
            CellValue::decode(CellType::NumberDateTime1900, "45931.5".into()),
            CellValue::DateTime(date(2025, 10, 1).and_hms_opt(12, 0, 0).unwrap())
        );
        assert_eq!(CellValue::decode(CellType::Number, "12.5".into()), CellValue::Number(12.5));
        assert_eq!(CellValue::decode(CellType::IsoDateTime, "2025-10-01".into()), CellValue::Date(date(2025, 10, 1)));
        assert_eq!(CellValue::decode(CellType::Boolean, "1".into()), CellValue::Bool(true));
    }

    #[test]
    fn coerce_to_date() {
        assert_eq!(CellValue::from("2025-10-02").to_date(), Some(date(2025, 10, 2)));
        assert_eq!(CellValue::from("2025-10-02 00:00:00").to_date(), Some(date(2025, 10, 2)));
        assert_eq!(CellValue::from("10/02/2025").to_date(), Some(date(2025, 10, 2)));
        assert_eq!(CellValue::Number(45_932.0).to_date(), Some(date(2025, 10, 2)));
        assert_eq!(CellValue::from("Dec").to_date(), None);
        assert_eq!(CellValue::Empty.to_date(), None);
    }

    #[test]
    fn parse_extracted_text() {
        assert_eq!(CellValue::parse_text("  "), CellValue::Empty);
        assert_eq!(CellValue::parse_text("+12"), CellValue::Number(12.0));
        assert_eq!(CellValue::parse_text("1,234.5"), CellValue::Number(1234.5));
        assert_eq!(CellValue::parse_text(" UNCH "), CellValue::Text("UNCH".into()));
        assert_eq!(CellValue::parse_text("-3.25").to_string(), "-3.25");
        assert_eq!(CellValue::Number(245.0).to_string(), "245");
    }
}

//! Export-time formatting of ambiguous date and amount cells.
//!
//! Both functions are total: any shape they do not recognize passes through
//! untouched. Stored records are never modified; normalization happens on
//! the way into the output workbook only, so repeating an export repeats the
//! same formatting.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;

use crate::cell::CellValue;

/// Base of the 1900 date system; serial 1.0 is 1900-01-01.
static SERIAL_EPOCH: Lazy<NaiveDateTime> = Lazy::new(|| {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap()
});

/// Format a raw `Fecha` cell as `dd/mm/yyyy hh:mm:ss`.
///
/// Numeric cells are spreadsheet date serials (whole days plus a fractional
/// time of day); textual cells are assumed preformatted and pass through.
/// A numeric cell that does not denote a representable date-time (huge,
/// infinite, NaN) falls back to its plain text form, keeping the function
/// total.
pub fn normalize_date(raw: &CellValue) -> String {
    match raw {
        CellValue::Number(serial) => format_serial(*serial).unwrap_or_else(|| raw.as_text()),
        CellValue::Text(text) => text.clone(),
    }
}

/// `None` when the serial lies outside the representable date-time range.
fn format_serial(serial: f64) -> Option<String> {
    let seconds = serial * 86_400.0;
    if !seconds.is_finite() || seconds.abs() >= i64::MAX as f64 {
        return None;
    }
    let delta = Duration::try_seconds(seconds.round() as i64)?;
    let datetime = SERIAL_EPOCH.checked_add_signed(delta)?;
    Some(datetime.format("%d/%m/%Y %H:%M:%S").to_string())
}

/// Format a raw `Monto` cell with two decimal places.
///
/// Numeric cells carry integer currency subunits (cents), so `12345`
/// becomes `"123.45"`. Textual cells — including the comma-decimal form the
/// sources emit, like `"1,50"` — are already display-ready and pass through
/// unchanged.
pub fn normalize_amount(raw: &CellValue) -> String {
    match raw {
        CellValue::Number(subunits) => format!("{:.2}", subunits / 100.0),
        CellValue::Text(text) => text.clone(),
    }
}

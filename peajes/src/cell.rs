//! Raw cell values as they arrive from the source spreadsheets.
//!
//! The source files encode the same column inconsistently: a `Fecha` cell may
//! hold a date serial or a preformatted string, a `Monto` cell an integer
//! subunit count or text. The tag is captured at the reader boundary and only
//! resolved at export time (see [`crate::normalize`]).

use calamine::Data;

/// A raw cell value whose interpretation is deferred until export.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Text form of the value, collapsing integral floats to integer form.
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Number(f) if f.fract() == 0.0 => (*f as i64).to_string(),
            CellValue::Number(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Text(String::new())
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Text(String::new()),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

//! Parses one uploaded spreadsheet file into a batch of toll records.
//!
//! Input sheets carry a two-row title block (the date-range text lives in
//! row 1), the column headers in row 3, and movement rows from row 4 on.

use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto_from_rs};

use crate::cell::CellValue;

/// Column headers of the movements table, in output order.
pub const FIELD_HEADERS: [&str; 10] = [
    "Operación",
    "Fecha",
    "Estación",
    "Matrícula",
    "Categoría",
    "Tipo lectura",
    "Monto",
    "Saldo",
    "Cuenta",
    "Observación",
];

/// Slots into [`FIELD_HEADERS`] and [`Record`] fields.
mod col {
    pub const OPERATION: usize = 0;
    pub const DATE: usize = 1;
    pub const STATION: usize = 2;
    pub const PLATE: usize = 3;
    pub const CATEGORY: usize = 4;
    pub const READING_TYPE: usize = 5;
    pub const AMOUNT: usize = 6;
    pub const BALANCE: usize = 7;
    pub const ACCOUNT: usize = 8;
    pub const REMARK: usize = 9;
}

/// Leading columns scanned for the title/date-range text.
const TITLE_COLS: u32 = 10;
/// Absolute row holding the field-name headers (rows 1-2 are the title block).
const FIELD_HEADER_ROW: u32 = 2;
/// First absolute row that can hold a movement.
const DATA_START_ROW: u32 = 3;

/// One toll-transaction row. `date` and `amount` stay raw until export; the
/// remaining fields are plain text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub operation: String,
    pub date: CellValue,
    pub station: String,
    pub plate: String,
    pub category: String,
    pub reading_type: String,
    pub amount: CellValue,
    pub balance: String,
    pub account: String,
    pub remark: String,
}

/// The parsed contents of one input file.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    /// Human-readable date-range/title text from the first sheet row.
    pub header_label: String,
    pub records: Vec<Record>,
}

/// Parse the first sheet of an `.xlsx`/`.xls` file into a [`SourceBatch`].
///
/// Missing cells default to empty, blank rows are skipped, and a sheet with
/// no movement rows still yields a batch (with zero records). Bytes that are
/// not a readable spreadsheet fail with context naming the problem.
pub fn read_source_batch(bytes: &[u8]) -> Result<SourceBatch> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .context("file is not a readable spreadsheet")?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .context("spreadsheet has no sheets")?
        .clone();

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let header_label = title_row_label(&range);
    let columns = ColumnMap::resolve(&range);

    let mut records = Vec::new();
    if let Some((_, last_row)) = range.end() {
        for row in DATA_START_ROW..=last_row {
            if let Some(record) = columns.record(&range, row) {
                records.push(record);
            }
        }
    }

    log::debug!(
        "parsed {} records under header {:?}",
        records.len(),
        header_label
    );
    Ok(SourceBatch {
        header_label,
        records,
    })
}

/// Join the text of the first ten title-row cells with single spaces.
/// Filtering empty cells first keeps the label free of leading, trailing,
/// and interior whitespace runs.
fn title_row_label(range: &Range<Data>) -> String {
    let parts: Vec<String> = (0..TITLE_COLS)
        .filter_map(|col| range.get_value((0, col)))
        .map(|data| CellValue::from(data).as_text())
        .filter(|text| !text.is_empty())
        .collect();
    parts.join(" ")
}

/// Positions of the known field columns within the sheet, resolved from the
/// field-name header row. Columns whose header is absent stay unmapped and
/// read as empty.
#[derive(Debug, Default)]
struct ColumnMap {
    indices: [Option<u32>; FIELD_HEADERS.len()],
}

impl ColumnMap {
    fn resolve(range: &Range<Data>) -> Self {
        let mut indices = [None; FIELD_HEADERS.len()];
        let last_col = range.end().map(|(_, col)| col).unwrap_or(0);
        for col in 0..=last_col {
            let Some(data) = range.get_value((FIELD_HEADER_ROW, col)) else {
                continue;
            };
            let header = CellValue::from(data).as_text();
            let header = header.trim();
            if let Some(slot) = FIELD_HEADERS.iter().position(|name| *name == header) {
                if indices[slot].is_none() {
                    indices[slot] = Some(col);
                }
            }
        }
        ColumnMap { indices }
    }

    /// Extract one movement row; `None` when every mapped cell is empty.
    fn record(&self, range: &Range<Data>, row: u32) -> Option<Record> {
        let record = Record {
            operation: self.text(range, row, col::OPERATION),
            date: self.raw(range, row, col::DATE),
            station: self.text(range, row, col::STATION),
            plate: self.text(range, row, col::PLATE),
            category: self.text(range, row, col::CATEGORY),
            reading_type: self.text(range, row, col::READING_TYPE),
            amount: self.raw(range, row, col::AMOUNT),
            balance: self.text(range, row, col::BALANCE),
            account: self.text(range, row, col::ACCOUNT),
            remark: self.text(range, row, col::REMARK),
        };
        if record == Record::default() {
            None
        } else {
            Some(record)
        }
    }

    fn text(&self, range: &Range<Data>, row: u32, slot: usize) -> String {
        self.raw(range, row, slot).as_text()
    }

    fn raw(&self, range: &Range<Data>, row: u32, slot: usize) -> CellValue {
        self.indices[slot]
            .and_then(|col| range.get_value((row, col)))
            .map(CellValue::from)
            .unwrap_or_default()
    }
}

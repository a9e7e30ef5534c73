//! Builds the output workbook from accumulated summary state.

use anyhow::{Context, Result};
use chrono::Local;
use rust_xlsxwriter::Workbook;

use crate::aggregate::SummaryState;
use crate::normalize::{normalize_amount, normalize_date};
use crate::reader::FIELD_HEADERS;
use crate::sheet_name::SheetNamer;

/// Name of the first sheet of every export.
pub const SUMMARY_SHEET: &str = "Resumen";

/// Column headers of the summary sheet.
pub const SUMMARY_HEADERS: [&str; 3] = ["Matrícula", "Peajes", "Fuente"];

/// A serialized export: the workbook bytes plus the file name to deliver
/// them under.
#[derive(Debug, Clone)]
pub struct ExportedWorkbook {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Materialize the current summary state as a workbook.
///
/// Pure read: state is untouched, and repeated calls re-export whatever has
/// been ingested by then. The summary sheet comes first (one row per plate
/// in first-appearance order), followed by one sheet per partition in
/// ingestion order with `Fecha` and `Monto` normalized. An empty state
/// yields a workbook holding only the summary header row.
pub fn export(state: &SummaryState) -> Result<ExportedWorkbook> {
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name(SUMMARY_SHEET)?;
    for (col, header) in SUMMARY_HEADERS.iter().enumerate() {
        summary.write_string(0, col as u16, *header)?;
    }
    for (idx, plate) in state.plates().enumerate() {
        let row = (idx + 1) as u32;
        summary.write_string(row, 0, plate)?;
        summary.write_number(row, 1, state.count(plate) as f64)?;
        summary.write_string(row, 2, state.sources(plate).join(" | "))?;
    }

    let mut namer = SheetNamer::new();
    namer.reserve(SUMMARY_SHEET);

    for partition in state.partitions() {
        let name = namer.assign(&partition.plate, &partition.range_label);
        let sheet = workbook.add_worksheet();
        sheet.set_name(&name)?;

        for (col, header) in FIELD_HEADERS.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (idx, record) in partition.records.iter().enumerate() {
            let row = (idx + 1) as u32;
            sheet.write_string(row, 0, &record.operation)?;
            sheet.write_string(row, 1, normalize_date(&record.date))?;
            sheet.write_string(row, 2, &record.station)?;
            sheet.write_string(row, 3, &record.plate)?;
            sheet.write_string(row, 4, &record.category)?;
            sheet.write_string(row, 5, &record.reading_type)?;
            sheet.write_string(row, 6, normalize_amount(&record.amount))?;
            sheet.write_string(row, 7, &record.balance)?;
            sheet.write_string(row, 8, &record.account)?;
            sheet.write_string(row, 9, &record.remark)?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .context("failed to serialize workbook")?;
    let filename = Local::now().format("Resumen_%Y-%m-%d_%H-%M.xlsx").to_string();

    log::info!(
        "exported {} plates across {} partition sheets as {}",
        state.plates().count(),
        state.partitions().len(),
        filename
    );
    Ok(ExportedWorkbook { filename, bytes })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use calamine::{Data, Reader, open_workbook_auto_from_rs};
    use regex::Regex;

    use super::*;
    use crate::cell::CellValue;
    use crate::reader::{Record, SourceBatch};

    fn record(plate: &str, date: CellValue, amount: CellValue) -> Record {
        Record {
            operation: "Pago".to_string(),
            date,
            station: "Norte".to_string(),
            plate: plate.to_string(),
            amount,
            ..Record::default()
        }
    }

    fn reread(bytes: &[u8]) -> calamine::Sheets<Cursor<Vec<u8>>> {
        open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).unwrap()
    }

    #[test]
    fn empty_state_exports_summary_sheet_only() {
        let exported = export(&SummaryState::new()).unwrap();

        let mut workbook = reread(&exported.bytes);
        assert_eq!(workbook.sheet_names(), vec![SUMMARY_SHEET.to_string()]);

        let range = workbook.worksheet_range(SUMMARY_SHEET).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], Data::String("Matrícula".to_string()));
        assert_eq!(rows[0][1], Data::String("Peajes".to_string()));
        assert_eq!(rows[0][2], Data::String("Fuente".to_string()));
    }

    #[test]
    fn filename_embeds_a_local_timestamp() {
        let exported = export(&SummaryState::new()).unwrap();
        let pattern = Regex::new(r"^Resumen_\d{4}-\d{2}-\d{2}_\d{2}-\d{2}\.xlsx$").unwrap();
        assert!(pattern.is_match(&exported.filename), "{}", exported.filename);
    }

    #[test]
    fn summary_rows_and_partition_sheets_reflect_state() {
        let mut state = SummaryState::new();
        state.ingest(SourceBatch {
            header_label: "Movimientos - 01/01/2024 al 31/01/2024".to_string(),
            records: vec![
                record(
                    "ABC123",
                    CellValue::Number(45292.5),
                    CellValue::Number(12345.0),
                ),
                record(
                    "ABC123",
                    CellValue::Text("02/01/2024 09:00:00".to_string()),
                    CellValue::Text("1,50".to_string()),
                ),
                record("XYZ999", CellValue::Number(45293.0), CellValue::Number(500.0)),
            ],
        });

        let exported = export(&state).unwrap();
        let mut workbook = reread(&exported.bytes);

        let names = workbook.sheet_names();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], SUMMARY_SHEET);
        assert_eq!(names[1], "ABC123 - 010124 al 310124");
        assert_eq!(names[2], "XYZ999 - 010124 al 310124");

        let summary = workbook.worksheet_range(SUMMARY_SHEET).unwrap();
        let rows: Vec<&[Data]> = summary.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][0], Data::String("ABC123".to_string()));
        assert_eq!(rows[1][1], Data::Float(2.0));
        assert_eq!(
            rows[1][2],
            Data::String("Movimientos - 01/01/2024 al 31/01/2024".to_string())
        );
        assert_eq!(rows[2][0], Data::String("XYZ999".to_string()));
        assert_eq!(rows[2][1], Data::Float(1.0));

        let partition = workbook.worksheet_range(&names[1]).unwrap();
        let rows: Vec<&[Data]> = partition.rows().collect();
        assert_eq!(rows[0][1], Data::String("Fecha".to_string()));
        assert_eq!(rows[1][1], Data::String("01/01/2024 12:00:00".to_string()));
        assert_eq!(rows[1][6], Data::String("123.45".to_string()));
        assert_eq!(rows[2][1], Data::String("02/01/2024 09:00:00".to_string()));
        assert_eq!(rows[2][6], Data::String("1,50".to_string()));
    }

    #[test]
    fn colliding_partition_names_stay_distinct_per_export() {
        let mut state = SummaryState::new();
        for _ in 0..2 {
            state.ingest(SourceBatch {
                header_label: "enero".to_string(),
                records: vec![record(
                    "ABC123",
                    CellValue::Number(45292.0),
                    CellValue::Number(100.0),
                )],
            });
        }

        let exported = export(&state).unwrap();
        let names = reread(&exported.bytes).sheet_names();
        assert_eq!(
            names,
            vec![
                SUMMARY_SHEET.to_string(),
                "ABC123 - enero".to_string(),
                "ABC123 - enero (1)".to_string(),
            ]
        );
    }

    #[test]
    fn export_does_not_mutate_state() {
        let mut state = SummaryState::new();
        state.ingest(SourceBatch {
            header_label: "enero".to_string(),
            records: vec![record(
                "ABC123",
                CellValue::Number(45292.0),
                CellValue::Number(100.0),
            )],
        });

        let first = export(&state).unwrap();
        let second = export(&state).unwrap();
        assert_eq!(
            reread(&first.bytes).sheet_names(),
            reread(&second.bytes).sheet_names()
        );
        assert_eq!(state.count("ABC123"), 1);
        assert_eq!(state.partitions().len(), 1);
    }
}

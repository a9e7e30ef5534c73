//! Toll-transaction spreadsheet aggregator.
//!
//! Ingests movement spreadsheets exported by a toll operator, groups the
//! rows by vehicle plate while tracking which source file each group came
//! from, and re-exports everything as a single workbook: a per-plate summary
//! sheet followed by one sheet per (plate, source range) group.
//!
//! The pipeline: [`reader::read_source_batch`] parses one uploaded file,
//! [`aggregate::SummaryState::ingest`] folds batches into session state, and
//! [`export::export`] materializes that state as a downloadable workbook.
//! [`session`] wires the three together for a whole upload session, reading
//! files strictly one at a time and skipping unparseable ones.

pub mod aggregate;
pub mod cell;
pub mod export;
pub mod normalize;
pub mod reader;
pub mod session;
pub mod sheet_name;

pub use aggregate::{Partition, SummaryState};
pub use cell::CellValue;
pub use export::{ExportedWorkbook, SUMMARY_SHEET, export};
pub use normalize::{normalize_amount, normalize_date};
pub use reader::{FIELD_HEADERS, Record, SourceBatch, read_source_batch};
pub use session::{
    DiskFile, DiskSink, FileOutcome, SourceFile, WorkbookSink, export_to, ingest_files,
};
pub use sheet_name::{MAX_SHEET_NAME_LEN, SheetNamer};

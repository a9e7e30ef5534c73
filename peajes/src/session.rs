//! Drives one upload session: sequential file ingestion plus export delivery.
//!
//! Mirrors the interactive flow of the original tool: the user picks any
//! number of files, each is read and parsed in selection order, and a bad
//! file is skipped without disturbing what the previous files contributed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::aggregate::SummaryState;
use crate::export::{ExportedWorkbook, export};
use crate::reader::read_source_batch;

/// A selected input file whose contents are read on demand.
#[async_trait]
pub trait SourceFile: Send + Sync {
    /// Display name used in logs and outcomes.
    fn name(&self) -> &str;
    /// Read the complete binary contents.
    async fn contents(&self) -> Result<Vec<u8>>;
}

/// A destination for the exported workbook (a save dialog, a directory, ...).
#[async_trait]
pub trait WorkbookSink: Send + Sync {
    async fn deliver(&self, workbook: &ExportedWorkbook) -> Result<()>;
}

/// Result of attempting to ingest one file.
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    /// Records parsed from the file; zero for an empty sheet.
    pub records: usize,
    /// Present when the file was skipped.
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Ingest files strictly one at a time, in the order given.
///
/// Each file is fully read and fully parsed before it touches `state`, so a
/// failure leaves the summary exactly as the previous files left it and
/// never blocks the files after it.
pub async fn ingest_files<F: SourceFile>(
    state: &mut SummaryState,
    files: &[F],
) -> Vec<FileOutcome> {
    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        let outcome = match ingest_one(state, file).await {
            Ok(records) => {
                log::info!("ingested {} records from {}", records, file.name());
                FileOutcome {
                    name: file.name().to_string(),
                    records,
                    error: None,
                }
            }
            Err(err) => {
                log::warn!("skipping {}: {:#}", file.name(), err);
                FileOutcome {
                    name: file.name().to_string(),
                    records: 0,
                    error: Some(format!("{err:#}")),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

async fn ingest_one<F: SourceFile>(state: &mut SummaryState, file: &F) -> Result<usize> {
    let bytes = file
        .contents()
        .await
        .with_context(|| format!("failed to read {}", file.name()))?;
    let batch = read_source_batch(&bytes)
        .with_context(|| format!("failed to parse {}", file.name()))?;
    let records = batch.records.len();
    state.ingest(batch);
    Ok(records)
}

/// Export the current state and hand it to `sink`, returning the file name
/// the workbook was delivered under.
pub async fn export_to<S: WorkbookSink>(state: &SummaryState, sink: &S) -> Result<String> {
    let workbook = export(state)?;
    sink.deliver(&workbook).await?;
    Ok(workbook.filename)
}

/// [`SourceFile`] backed by a path on disk.
pub struct DiskFile {
    path: PathBuf,
    name: String,
}

impl DiskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        DiskFile { path, name }
    }
}

#[async_trait]
impl SourceFile for DiskFile {
    fn name(&self) -> &str {
        &self.name
    }

    async fn contents(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("failed to read {}", self.path.display()))
    }
}

/// [`WorkbookSink`] that writes the export into a directory.
pub struct DiskSink {
    dir: PathBuf,
}

impl DiskSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DiskSink { dir: dir.into() }
    }
}

#[async_trait]
impl WorkbookSink for DiskSink {
    async fn deliver(&self, workbook: &ExportedWorkbook) -> Result<()> {
        let path = self.dir.join(&workbook.filename);
        tokio::fs::write(&path, &workbook.bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("saved export to {}", path.display());
        Ok(())
    }
}

//! Accumulates the per-plate summary across upload batches.

use std::collections::HashMap;

use crate::reader::{Record, SourceBatch};

/// Rows of one source batch belonging to a single plate. Batches with the
/// same plate but different header labels stay separate partitions, one
/// output sheet each.
#[derive(Debug, Clone)]
pub struct Partition {
    pub plate: String,
    /// Header label of the batch these rows came from.
    pub range_label: String,
    pub records: Vec<Record>,
}

/// Session-lifetime aggregation state.
///
/// Created empty, mutated only by [`SummaryState::ingest`], read by the
/// exporter, and discarded with the session. Records with an empty plate
/// identifier contribute to neither counts nor partitions.
#[derive(Debug, Default)]
pub struct SummaryState {
    counts: HashMap<String, u64>,
    /// Plates in first-appearance order; drives summary row order.
    plate_order: Vec<String>,
    sources: HashMap<String, Vec<String>>,
    partitions: Vec<Partition>,
}

impl SummaryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one parsed batch into the running summary.
    ///
    /// Strictly additive: nothing ingested earlier is revisited, and a batch
    /// with no records is a no-op. Re-ingesting a header label already seen
    /// for a plate does not duplicate the provenance entry but still appends
    /// a partition and advances the counts.
    pub fn ingest(&mut self, batch: SourceBatch) {
        if batch.records.is_empty() {
            return;
        }

        let mut batch_plates: Vec<&str> = Vec::new();
        for record in &batch.records {
            if record.plate.is_empty() || batch_plates.contains(&record.plate.as_str()) {
                continue;
            }
            batch_plates.push(&record.plate);
        }

        for plate in &batch_plates {
            let labels = self.sources.entry((*plate).to_string()).or_default();
            if !labels.iter().any(|label| label == &batch.header_label) {
                labels.push(batch.header_label.clone());
            }

            let records: Vec<Record> = batch
                .records
                .iter()
                .filter(|record| record.plate == *plate)
                .cloned()
                .collect();
            self.partitions.push(Partition {
                plate: (*plate).to_string(),
                range_label: batch.header_label.clone(),
                records,
            });
        }

        for record in &batch.records {
            if record.plate.is_empty() {
                continue;
            }
            if !self.counts.contains_key(&record.plate) {
                self.plate_order.push(record.plate.clone());
            }
            *self.counts.entry(record.plate.clone()).or_insert(0) += 1;
        }

        log::debug!(
            "ingested batch {:?}: {} records, {} plates",
            batch.header_label,
            batch.records.len(),
            batch_plates.len()
        );
    }

    /// Plates in first-appearance order across all batches.
    pub fn plates(&self) -> impl Iterator<Item = &str> {
        self.plate_order.iter().map(String::as_str)
    }

    /// Running transaction count for one plate.
    pub fn count(&self, plate: &str) -> u64 {
        self.counts.get(plate).copied().unwrap_or(0)
    }

    /// Distinct header labels seen for a plate, in first-occurrence order.
    pub fn sources(&self, plate: &str) -> &[String] {
        self.sources.get(plate).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    pub fn is_empty(&self) -> bool {
        self.plate_order.is_empty()
    }

    pub fn total_records(&self) -> u64 {
        self.counts.values().sum()
    }
}

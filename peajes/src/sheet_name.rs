//! Worksheet naming for exported partitions.
//!
//! Output sheet names combine the plate with the source date range, squeezed
//! under the format's 31-character sheet-name limit with its forbidden
//! characters removed, and deduplicated within one export.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Hard limit imposed by the xlsx format.
pub const MAX_SHEET_NAME_LEN: usize = 31;

static MOVEMENTS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Movimientos\s*[-–]\s*").unwrap());
static DATE_FULL_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{2}/\d{2}/)\d{2}(\d{2})").unwrap());

/// Assigns unique sheet names within one export. The used-name set lives and
/// dies with a single export call.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name as taken without assigning it (e.g. the summary sheet).
    pub fn reserve(&mut self, name: &str) {
        self.used.insert(name.to_lowercase());
    }

    /// Produce a unique, format-valid sheet name for one partition.
    ///
    /// The range label loses its leading `Movimientos` marker and its
    /// four-digit years; the composed `"{plate} - {label}"` loses the
    /// characters the format forbids and is cut to 31 characters. On
    /// collision a `" (n)"` suffix is appended, shortening the stem so the
    /// suffix always survives the length limit.
    pub fn assign(&mut self, plate: &str, range_label: &str) -> String {
        let label = shorten_years(&strip_movements_marker(range_label));
        let stem = strip_forbidden(&format!("{plate} - {label}"));

        let mut name = truncate_chars(&stem, MAX_SHEET_NAME_LEN);
        let mut attempt = 1u32;
        // Sheet names are case-insensitively unique in the output format.
        while self.used.contains(&name.to_lowercase()) {
            let suffix = format!(" ({attempt})");
            let room = MAX_SHEET_NAME_LEN.saturating_sub(suffix.chars().count());
            name = format!("{}{}", truncate_chars(&stem, room), suffix);
            attempt += 1;
        }
        self.used.insert(name.to_lowercase());
        name
    }
}

fn strip_movements_marker(label: &str) -> String {
    MOVEMENTS_MARKER.replace(label, "").trim().to_string()
}

/// `dd/mm/2024` -> `dd/mm/24`, for every date in the label.
fn shorten_years(label: &str) -> String {
    DATE_FULL_YEAR.replace_all(label, "${1}${2}").to_string()
}

fn strip_forbidden(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '[' | ']'))
        .collect()
}

fn truncate_chars(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}

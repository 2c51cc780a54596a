use std::io::{self, Write};

use crate::classify::{Classification, Classifier};
use crate::store::Record;

/// Where report lines go. One line per call, no trailing newline.
pub trait ReportSink {
    fn report(&mut self, line: &str);
}

pub struct StdoutSink {
    out: io::Stdout,
}

impl StdoutSink {
    pub fn new() -> Self {
        StdoutSink { out: io::stdout() }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportSink for StdoutSink {
    fn report(&mut self, line: &str) {
        let mut lock = self.out.lock();
        if let Err(e) = writeln!(lock, "{}", line) {
            tracing::warn!("stdout write failed: {}", e);
        }
    }
}

/// Collects lines in memory.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

#[cfg(test)]
impl ReportSink for MemorySink {
    fn report(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Per-classification tally of one scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub total: usize,
    pub missing: usize,
    pub needs_migration: usize,
    pub correct: usize,
    pub external: usize,
}

impl ScanSummary {
    pub(crate) fn add(&mut self, class: Classification) {
        self.total += 1;
        match class {
            Classification::Missing => self.missing += 1,
            Classification::NeedsMigration => self.needs_migration += 1,
            Classification::Correct => self.correct += 1,
            Classification::External => self.external += 1,
        }
    }
}

// ── Line formatting ──

pub fn header_line(collection: &str) -> String {
    format!("Checking image URLs in collection '{}'...", collection)
}

pub fn count_line(total: usize) -> String {
    format!("Found {} records", total)
}

pub fn record_line(record: &Record) -> String {
    format!("{} ({})", record.display_title(), record.id)
}

pub fn url_line(url: &str) -> String {
    format!("   URL: {}", url)
}

pub fn verdict_line(classifier: &Classifier, class: Classification) -> String {
    format!("   {}", classifier.describe(class))
}

pub fn completion_line(summary: &ScanSummary) -> String {
    format!(
        "Check completed: {} records ({} needs migration, {} correct, {} external, {} missing)",
        summary.total,
        summary.needs_migration,
        summary.correct,
        summary.external,
        summary.missing
    )
}

pub fn failure_line(message: &str) -> String {
    format!("Error: {}", message)
}

//! Human-readable record numbers (`PRJ-2610-001`, `TSK-2610-014`,
//! `INV-261016-0003`).
//!
//! A number is `<scope>-<seq>` where the scope is the kind's prefix plus the
//! creation period. Sequences restart at 1 in every new period. The database
//! layer owns the counter; this module only formats, parses, and seeds.

use crate::types::Timestamp;

/// Kinds of record that carry a generated number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    Project,
    Task,
    Invoice,
}

impl SequenceKind {
    pub fn prefix(self) -> &'static str {
        match self {
            SequenceKind::Project => "PRJ",
            SequenceKind::Task => "TSK",
            SequenceKind::Invoice => "INV",
        }
    }

    /// Zero-padding width of the trailing sequence segment.
    pub fn width(self) -> usize {
        match self {
            SequenceKind::Project | SequenceKind::Task => 3,
            SequenceKind::Invoice => 4,
        }
    }

    /// `YYMM` for projects and tasks, `YYMMDD` for invoices.
    pub fn period(self, at: Timestamp) -> String {
        match self {
            SequenceKind::Project | SequenceKind::Task => at.format("%y%m").to_string(),
            SequenceKind::Invoice => at.format("%y%m%d").to_string(),
        }
    }

    /// Counter scope, e.g. `TSK-2610`.
    pub fn scope(self, at: Timestamp) -> String {
        format!("{}-{}", self.prefix(), self.period(at))
    }
}

/// Render a full number for `seq` within the scope of `at`.
///
/// Sequences that outgrow the padding width keep all of their digits.
pub fn format_number(kind: SequenceKind, at: Timestamp, seq: i64) -> String {
    format!("{}-{:0width$}", kind.scope(at), seq, width = kind.width())
}

/// Parse the trailing numeric segment of a number.
///
/// Returns `None` when the last `-`-separated segment is empty or contains
/// anything other than ASCII digits.
pub fn parse_trailing_seq(number: &str) -> Option<i64> {
    let tail = number.rsplit('-').next()?;
    if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// The sequence value that follows `last`, or 1 when there is no usable
/// previous number.
pub fn next_seq_after(last: Option<&str>) -> i64 {
    last.and_then(parse_trailing_seq)
        .map(|n| n + 1)
        .unwrap_or(1)
}

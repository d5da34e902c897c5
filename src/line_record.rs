use std::cmp::Ordering;

use crate::comparison_mode::ComparisonMode;
use crate::line_comparator::LineComparator;

/// A data line with its sort key located once, so sorting and merging do not split it again.
#[derive(Debug)]
pub(crate) struct LineRecord {
    line: String,
    key_start: usize,
    key_end: usize,
    mode: ComparisonMode,
}

impl LineRecord {
    pub(crate) fn new(line: String, comparator: &LineComparator) -> LineRecord {
        let (key_start, key_end) = comparator.key_span(&line);
        LineRecord {
            line,
            key_start,
            key_end,
            mode: comparator.comparison_mode(),
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.line[self.key_start..self.key_end]
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.line
    }

    pub fn line(self) -> String {
        self.line
    }
}

impl Eq for LineRecord {}

impl PartialEq<Self> for LineRecord {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl PartialOrd<Self> for LineRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LineRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.mode.compare(self.key(), other.key())
    }
}

use std::cmp::Ordering;

use crate::comparison_mode::ComparisonMode;

/// Compares raw lines by one delimiter separated column.
///
/// The key of a line is the text between the `column`-th and the `column + 1`-th occurrence of
/// the delimiter, or the end of the line for the last column. Columns are counted from zero.
/// A line with fewer columns has an empty key and therefore sorts first. Equal keys compare as
/// [Ordering::Equal], the full line is never used as a tie breaker.
///
/// Quotes are not interpreted. A delimiter inside a quoted field still splits the line, so the
/// ordering is only meaningful when the sort column is never quoted or never holds the delimiter.
///
/// # Examples
/// ```
/// use std::cmp::Ordering;
/// use tabular_file_sort::line_comparator::LineComparator;
///
/// let comparator = LineComparator::new(1, ";");
/// assert_eq!(comparator.key("x;980-sp10;y"), "980-sp10");
/// assert_eq!(comparator.key("x"), "");
/// assert_eq!(comparator.compare("x;980-sp100", "x;980-sp10"), Ordering::Greater);
/// ```
#[derive(Clone, Debug)]
pub struct LineComparator {
    column: usize,
    delimiter: String,
    mode: ComparisonMode,
}

impl LineComparator {
    /// Create a comparator for the zero based `column` using code point order
    pub fn new(column: usize, delimiter: &str) -> LineComparator {
        LineComparator {
            column,
            delimiter: delimiter.to_string(),
            mode: ComparisonMode::CodePoint,
        }
    }

    /// Set the [ComparisonMode]
    pub fn with_comparison_mode(mut self, mode: ComparisonMode) -> LineComparator {
        self.mode = mode;
        self
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    pub fn comparison_mode(&self) -> ComparisonMode {
        self.mode
    }

    /// Extract the sort key of `line`
    pub fn key<'a>(&self, line: &'a str) -> &'a str {
        let (start, end) = self.key_span(line);
        &line[start..end]
    }

    /// Byte range of the sort key within `line`. An empty delimiter makes the whole line the key.
    pub(crate) fn key_span(&self, line: &str) -> (usize, usize) {
        if self.delimiter.is_empty() {
            return (0, line.len());
        }

        let mut start = 0;
        let mut seen = 0;
        for (index, _) in line.match_indices(self.delimiter.as_str()) {
            if seen == self.column {
                return (start, index);
            }
            seen += 1;
            start = index + self.delimiter.len();
        }

        if seen == self.column {
            (start, line.len())
        } else {
            (0, 0)
        }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.mode.compare(self.key(a), self.key(b))
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use crate::comparison_mode::ComparisonMode;
    use crate::line_comparator::LineComparator;

    #[test]
    fn test_key_extraction() {
        let comparator = LineComparator::new(0, "\t");
        assert_eq!(comparator.key("a\tb\tc"), "a");
        assert_eq!(comparator.key(""), "");
        assert_eq!(comparator.key("abc"), "abc");

        let comparator = LineComparator::new(2, "\t");
        assert_eq!(comparator.key("a\tb\tc"), "c");
        assert_eq!(comparator.key("a\tb\t"), "");
        assert_eq!(comparator.key("a\tb"), "");
    }

    #[test]
    fn test_multi_character_delimiter() {
        let comparator = LineComparator::new(1, "×");
        assert_eq!(comparator.key("1×2×3"), "2");

        let comparator = LineComparator::new(1, "::");
        assert_eq!(comparator.key("a::b:c::d"), "b:c");
    }

    #[test]
    fn test_uneven_lengths_are_lexicographic() {
        let comparator = LineComparator::new(0, ";");
        assert_eq!(comparator.compare("980-sp10;x", "980-sp100;x"), Ordering::Less);
        assert_eq!(comparator.compare("980-sp101;x", "980-sp100;x"), Ordering::Greater);

        let comparator = LineComparator::new(1, ";");
        assert_eq!(comparator.compare("x;980-sp10", "x;980-sp100"), Ordering::Less);
    }

    #[test]
    fn test_missing_column_sorts_first() {
        let comparator = LineComparator::new(3, ",");
        assert_eq!(comparator.compare("a,b", "a,b,c,d"), Ordering::Less);
        assert_eq!(comparator.compare("a,b", "z"), Ordering::Equal);
    }

    #[test]
    fn test_equal_keys_ignore_rest_of_line() {
        let comparator = LineComparator::new(0, ",");
        assert_eq!(comparator.compare("1,zzz", "1,aaa"), Ordering::Equal);
    }

    #[test]
    fn test_quotes_are_not_interpreted() {
        let comparator = LineComparator::new(1, ",");
        assert_eq!(comparator.key("1,\"a,b\",c"), "\"a");
    }

    #[test]
    fn test_comparison_mode() {
        let comparator = LineComparator::new(0, "\t")
            .with_comparison_mode(ComparisonMode::Utf16CodeUnit);
        assert_eq!(comparator.comparison_mode(), ComparisonMode::Utf16CodeUnit);
        assert_eq!(comparator.compare("\u{100CD}\tx", "\u{FB02}\tx"), Ordering::Less);
    }
}

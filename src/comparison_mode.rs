use std::cmp::Ordering;

/// How two sort keys are compared.
///
/// Both modes are deterministic and locale independent. They agree on every key made only of
/// characters from the Basic Multilingual Plane and disagree once a supplementary character
/// (above U+FFFF) meets a character in the U+E000..=U+FFFF range.
///
/// # Examples
/// ```
/// use std::cmp::Ordering;
/// use tabular_file_sort::comparison_mode::ComparisonMode;
///
/// // U+FB02 LATIN SMALL LIGATURE FL and U+100CD LINEAR B IDEOGRAM B241 CHARIOT
/// assert_eq!(ComparisonMode::CodePoint.compare("\u{FB02}", "\u{100CD}"), Ordering::Less);
/// assert_eq!(ComparisonMode::Utf16CodeUnit.compare("\u{FB02}", "\u{100CD}"), Ordering::Greater);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ComparisonMode {
    /// Order by Unicode scalar value. Identical to byte order of UTF-8 text and to the `C`
    /// collation of the native sort utility.
    #[default]
    CodePoint,
    /// Order by UTF-16 code units, where a supplementary character compares as its surrogate
    /// pair. Never delegated to the native sort utility.
    Utf16CodeUnit,
}

impl ComparisonMode {
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            ComparisonMode::CodePoint => a.cmp(b),
            ComparisonMode::Utf16CodeUnit => a.encode_utf16().cmp(b.encode_utf16()),
        }
    }
}

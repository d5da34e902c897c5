use encoding_rs::Encoding;

use crate::error::TabularError;
use crate::text_source::resolve_encoding;

/// Describes how a delimited text stream is laid out.
///
/// The default is comma separated values, quoted with `"`, records separated by `\n`, encoded as
/// UTF-8.
///
/// # Examples
/// ```
/// use tabular_file_sort::tabular_format::TabularFormat;
///
/// let tsv = TabularFormat::new('\t')
///     .with_quote(None)
///     .with_record_separator("\r\n")
///     .with_encoding("ISO-8859-1");
/// assert_eq!(tsv.delimiter(), '\t');
/// ```
#[derive(Clone, Debug)]
pub struct TabularFormat {
    delimiter: char,
    quote: Option<char>,
    record_separator: String,
    encoding: String,
}

impl Default for TabularFormat {
    fn default() -> Self {
        TabularFormat::new(',')
    }
}

impl TabularFormat {
    pub fn new(delimiter: char) -> TabularFormat {
        TabularFormat {
            delimiter,
            quote: Some('"'),
            record_separator: "\n".to_string(),
            encoding: "UTF-8".to_string(),
        }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn record_separator(&self) -> &str {
        &self.record_separator
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    pub fn with_delimiter(mut self, delimiter: char) -> TabularFormat {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character, `None` disables quoting
    pub fn with_quote(mut self, quote: Option<char>) -> TabularFormat {
        self.quote = quote;
        self
    }

    /// Set the record separator. It may be several characters long, e.g. `\r\n`
    pub fn with_record_separator(mut self, record_separator: &str) -> TabularFormat {
        self.record_separator = record_separator.to_string();
        self
    }

    /// Set the encoding label, e.g. `UTF-8` or `windows-1252`
    pub fn with_encoding(mut self, encoding: &str) -> TabularFormat {
        self.encoding = encoding.to_string();
        self
    }

    /// Check the format and resolve its encoding
    pub(crate) fn validate(&self) -> Result<&'static Encoding, TabularError> {
        if self.record_separator.is_empty() {
            return Err(TabularError::InvalidConfiguration("record separator must not be empty".to_string()));
        }
        if self.record_separator.starts_with(self.delimiter) {
            return Err(
                TabularError::InvalidConfiguration(
                    format!("delimiter {:?} clashes with record separator {:?}", self.delimiter, self.record_separator)
                )
            );
        }
        if let Some(quote) = self.quote {
            if quote == self.delimiter || self.record_separator.contains(quote) {
                return Err(
                    TabularError::InvalidConfiguration(
                        format!("quote {:?} clashes with delimiter or record separator", quote)
                    )
                );
            }
        }
        resolve_encoding(&self.encoding)
    }
}

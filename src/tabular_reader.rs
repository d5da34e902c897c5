use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::error::TabularError;
use crate::tabular_format::TabularFormat;
use crate::text_source::TextSource;

/// Reads a delimited text stream record by record.
///
/// Each record is returned as the list of its field values, however many there are. Rows may
/// hold more or fewer fields than the header, they are returned as they are.
///
/// * fields are separated by the delimiter character
/// * a field starting with the quote character runs to the matching closing quote, delimiters and
///   record separators inside it are literal and a doubled quote stands for one quote
/// * a record ends at the record separator outside of quotes
/// * empty lines between records are skipped
///
/// # Examples
/// ```
/// use tabular_file_sort::tabular_format::TabularFormat;
/// use tabular_file_sort::tabular_reader::TabularReader;
///
/// fn read(data: &[u8]) -> Result<(), anyhow::Error> {
///     let mut reader = TabularReader::new(data, TabularFormat::new(','), true)?;
///     assert_eq!(reader.header()?, Some(vec!["id".to_string(), "name".to_string()]));
///     assert_eq!(reader.read_row()?, Some(vec!["1".to_string(), "a,\"b\"".to_string()]));
///     assert_eq!(reader.read_row()?, None);
///     reader.close();
///     Ok(())
/// }
/// read(b"id,name\n1,\"a,\"\"b\"\"\"\n").unwrap();
/// ```
pub struct TabularReader<R: Read> {
    source: TextSource<R>,
    delimiter: char,
    quote: Option<char>,
    record_separator: String,
    has_header: bool,
    header: Option<Vec<String>>,
    header_read: bool,
    records: usize,
}

impl TabularReader<File> {
    /// Open a file for reading
    pub fn open(path: &Path, format: TabularFormat, has_header: bool) -> Result<TabularReader<File>, anyhow::Error> {
        if !path.exists() {
            return Err(TabularError::InputNotFound(path.to_path_buf()).into());
        }
        let file = File::open(path)
            .with_context(|| format!("path: {}", path.display()))?;
        TabularReader::new(file, format, has_header)
    }
}

impl<R: Read> TabularReader<R> {
    pub fn new(reader: R, format: TabularFormat, has_header: bool) -> Result<TabularReader<R>, anyhow::Error> {
        let encoding = format.validate()?;
        Ok(
            TabularReader {
                source: TextSource::new(reader, encoding),
                delimiter: format.delimiter(),
                quote: format.quote(),
                record_separator: format.record_separator().to_string(),
                has_header,
                header: None,
                header_read: !has_header,
                records: 0,
            }
        )
    }

    /// The header record, read from the stream on first use. `None` for a stream created
    /// without a header or an empty stream.
    pub fn header(&mut self) -> Result<Option<Vec<String>>, anyhow::Error> {
        if !self.header_read {
            self.header = self.read_record()?;
            self.header_read = true;
        }
        Ok(self.header.clone())
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// The next data record or `None` at the end of the stream
    pub fn read_row(&mut self) -> Result<Option<Vec<String>>, anyhow::Error> {
        if !self.header_read {
            self.header = self.read_record()?;
            self.header_read = true;
        }
        self.read_record()
    }

    /// Release the underlying stream
    pub fn close(self) -> R {
        self.source.into_inner()
    }

    fn read_record(&mut self) -> Result<Option<Vec<String>>, anyhow::Error> {
        let separator_start = self.record_separator.chars().next();
        loop {
            match self.source.peek_char()? {
                None => return Ok(None),
                Some(c) if Some(c) == separator_start => {
                    if !self.source.skip_if_starts_with(&self.record_separator)? {
                        break;
                    }
                }
                Some(_) => break,
            }
        }

        self.records += 1;
        let mut fields = Vec::new();
        let mut field = String::new();
        let mut at_field_start = true;
        loop {
            let c = match self.source.peek_char()? {
                None => break,
                Some(c) => c,
            };
            if Some(c) == separator_start && self.source.skip_if_starts_with(&self.record_separator)? {
                break;
            }
            self.source.next_char()?;

            if c == self.delimiter {
                fields.push(std::mem::take(&mut field));
                at_field_start = true;
            } else if at_field_start && Some(c) == self.quote {
                self.read_quoted(&mut field, c)?;
                at_field_start = false;
            } else {
                field.push(c);
                at_field_start = false;
            }
        }
        fields.push(field);
        Ok(Some(fields))
    }

    fn read_quoted(&mut self, field: &mut String, quote: char) -> Result<(), anyhow::Error> {
        loop {
            match self.source.next_char()? {
                None => return Err(TabularError::MalformedQuoting { record: self.records }.into()),
                Some(c) if c == quote => {
                    if self.source.peek_char()? == Some(quote) {
                        self.source.next_char()?;
                        field.push(quote);
                    } else {
                        return Ok(());
                    }
                }
                Some(c) => field.push(c),
            }
        }
    }
}

impl<R: Read> Iterator for TabularReader<R> {
    type Item = Result<Vec<String>, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row().transpose()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::TabularError;
    use crate::tabular_format::TabularFormat;
    use crate::tabular_reader::TabularReader;

    fn rows(data: &str, format: TabularFormat) -> Result<Vec<Vec<String>>, anyhow::Error> {
        TabularReader::new(data.as_bytes(), format, false)?.collect()
    }

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_quoted_delimiter_and_embedded_newline() -> Result<(), anyhow::Error> {
        let result = rows("1,\"a,b\",c\n2,\"d\ne\"\n", TabularFormat::new(','))?;
        assert_eq!(result, vec![row(&["1", "a,b", "c"]), row(&["2", "d\ne"])]);
        Ok(())
    }

    #[test]
    fn test_doubled_quote() -> Result<(), anyhow::Error> {
        let result = rows("\"say \"\"hi\"\"\",x", TabularFormat::new(','))?;
        assert_eq!(result, vec![row(&["say \"hi\"", "x"])]);
        Ok(())
    }

    #[test]
    fn test_quote_inside_field_is_literal() -> Result<(), anyhow::Error> {
        let result = rows("ab\"c,d\n", TabularFormat::new(','))?;
        assert_eq!(result, vec![row(&["ab\"c", "d"])]);
        Ok(())
    }

    #[test]
    fn test_empty_lines_are_skipped() -> Result<(), anyhow::Error> {
        let result = rows("\n\na\n\n\nb\n\n", TabularFormat::new(','))?;
        assert_eq!(result, vec![row(&["a"]), row(&["b"])]);

        let result = rows(",\n", TabularFormat::new(','))?;
        assert_eq!(result, vec![row(&["", ""])]);
        Ok(())
    }

    #[test]
    fn test_multi_character_record_separator() -> Result<(), anyhow::Error> {
        let format = TabularFormat::new('\t').with_record_separator("\r\n");
        let result = rows("a\tb\r\n\"c\r\nd\"\te\r\nf\rg\r\n", format)?;
        assert_eq!(result, vec![row(&["a", "b"]), row(&["c\r\nd", "e"]), row(&["f\rg"])]);
        Ok(())
    }

    #[test]
    fn test_variable_field_counts() -> Result<(), anyhow::Error> {
        let mut reader = TabularReader::new("a,b,c\n1\n1,2,3,4\n".as_bytes(), TabularFormat::new(','), true)?;
        assert_eq!(reader.read_row()?, Some(row(&["1"])));
        assert_eq!(reader.header()?, Some(row(&["a", "b", "c"])));
        assert_eq!(reader.read_row()?, Some(row(&["1", "2", "3", "4"])));
        assert_eq!(reader.read_row()?, None);
        Ok(())
    }

    #[test]
    fn test_headerless_stream() -> Result<(), anyhow::Error> {
        let mut reader = TabularReader::new("a,b\n".as_bytes(), TabularFormat::new(','), false)?;
        assert_eq!(reader.header()?, None);
        assert_eq!(reader.read_row()?, Some(row(&["a", "b"])));
        Ok(())
    }

    #[test]
    fn test_unquoted_format() -> Result<(), anyhow::Error> {
        let result = rows("\"a\";b\n", TabularFormat::new(';').with_quote(None))?;
        assert_eq!(result, vec![row(&["\"a\"", "b"])]);
        Ok(())
    }

    #[test]
    fn test_unterminated_quote() {
        let error = rows("1,2\n3,\"open\n", TabularFormat::new(',')).unwrap_err();
        match error.downcast_ref::<TabularError>() {
            Some(TabularError::MalformedQuoting { record }) => assert_eq!(*record, 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_format() {
        let format = TabularFormat::new(',').with_quote(Some(','));
        assert!(TabularReader::new("".as_bytes(), format, false).is_err());
    }
}

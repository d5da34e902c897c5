use std::borrow::Cow;
use std::path::{Path, PathBuf};

use anyhow::Context;
use regex::Regex;
use tempfile::Builder;

use crate::error::TabularError;
use crate::tabular_format::TabularFormat;
use crate::tabular_reader::TabularReader;
use crate::text_sink::TextSink;

/// Rewrite a delimited text file with exactly one physical line per record.
///
/// Records whose quoted fields span several lines are joined, control characters such as NUL or
/// embedded line breaks are removed from field values, every record is terminated by the record
/// separator and fields are quoted only when they contain the delimiter, the quote character or
/// the record separator. Running the normalizer on its own output changes nothing.
///
/// The output is written to a temporary file next to the destination and moved into place once
/// complete, a failed run leaves the destination untouched.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use tabular_file_sort::normalize::Normalize;
///
/// fn normalize_csv(input: PathBuf, output: PathBuf) -> Result<usize, anyhow::Error> {
///     let mut normalize = Normalize::new(input, output);
///     normalize.with_delimiter(',');
///     normalize.with_quote('"');
///     normalize.with_record_separator("\n");
///     normalize.normalize()
/// }
/// ```
pub struct Normalize {
    input: PathBuf,
    output: PathBuf,
    format: TabularFormat,
    header: bool,
}

impl Normalize {
    /// Create a default Normalize definition: comma delimiter, `"` quote, `\n` record separator,
    /// UTF-8 and no header record.
    pub fn new(input: PathBuf, output: PathBuf) -> Normalize {
        Normalize {
            input,
            output,
            format: TabularFormat::new(','),
            header: false,
        }
    }

    pub fn with_delimiter(&mut self, delimiter: char) {
        self.format = self.format.clone().with_delimiter(delimiter);
    }

    pub fn with_quote(&mut self, quote: char) {
        self.format = self.format.clone().with_quote(Some(quote));
    }

    pub fn with_record_separator(&mut self, record_separator: &str) {
        self.format = self.format.clone().with_record_separator(record_separator);
    }

    /// Set the encoding label used for both input and output
    pub fn with_encoding(&mut self, encoding: &str) {
        self.format = self.format.clone().with_encoding(encoding);
    }

    /// Treat the first record as a header. It is written with the same quoting rule and is not
    /// counted.
    pub fn with_header(&mut self, header: bool) {
        self.header = header;
    }

    /// Normalize the input and return the number of data records written
    pub fn normalize(&self) -> Result<usize, anyhow::Error> {
        log::info!("Start normalizing {} into {}", self.input.display(), self.output.display());
        let quote = self.format.quote()
            .ok_or_else(|| TabularError::InvalidConfiguration("normalizing requires a quote character".to_string()))?;
        let encoding = self.format.validate()?;
        let control = control_characters(self.format.delimiter())?;

        let mut reader = TabularReader::open(&self.input, self.format.clone(), self.header)?;
        let output_dir = parent_dir(&self.output);
        let tmp_file = Builder::new()
            .prefix(".normalize-")
            .tempfile_in(output_dir)
            .with_context(|| format!("path: {}", output_dir.display()))?;
        let mut sink = TextSink::new(tmp_file, encoding);

        let writer = RecordWriter {
            delimiter: self.format.delimiter(),
            quote,
            record_separator: self.format.record_separator(),
            control: &control,
        };

        if let Some(header) = reader.header()? {
            writer.write(&mut sink, &header)?;
        }
        let mut count = 0;
        while let Some(row) = reader.read_row()
            .with_context(|| format!("path: {}, record: {}", self.input.display(), count + 1))? {
            writer.write(&mut sink, &row)?;
            count += 1;
        }
        reader.close();

        let tmp_file = sink.into_inner()?;
        tmp_file.persist(&self.output)
            .with_context(|| format!("path: {}", self.output.display()))?;
        log::info!("Finish normalizing {}, records: {}", self.input.display(), count);
        Ok(count)
    }
}

pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Matches control characters except the delimiter, which may legitimately be a TAB
fn control_characters(delimiter: char) -> Result<Regex, anyhow::Error> {
    let pattern = if delimiter.is_control() {
        format!(r"[\p{{Cc}}&&[^{}]]", regex::escape(&delimiter.to_string()))
    } else {
        r"\p{Cc}".to_string()
    };
    Ok(Regex::new(&pattern)?)
}

struct RecordWriter<'a> {
    delimiter: char,
    quote: char,
    record_separator: &'a str,
    control: &'a Regex,
}

impl<'a> RecordWriter<'a> {
    fn write<W: std::io::Write>(&self, sink: &mut TextSink<W>, fields: &[String]) -> Result<(), anyhow::Error> {
        // a lone empty field would come out as an empty line, which readers skip
        if fields.len() == 1 && self.clean(&fields[0]).is_empty() {
            let empty = format!("{0}{0}", self.quote);
            return sink.write_record(&empty, self.record_separator);
        }

        let mut line = String::new();
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                line.push(self.delimiter);
            }
            let value = self.clean(field);
            if self.needs_quotes(&value) {
                line.push(self.quote);
                for c in value.chars() {
                    if c == self.quote {
                        line.push(self.quote);
                    }
                    line.push(c);
                }
                line.push(self.quote);
            } else {
                line.push_str(&value);
            }
        }
        sink.write_record(&line, self.record_separator)
    }

    fn clean<'f>(&self, field: &'f str) -> Cow<'f, str> {
        self.control.replace_all(field, "")
    }

    fn needs_quotes(&self, value: &str) -> bool {
        value.contains(self.delimiter) || value.contains(self.quote) || value.contains(self.record_separator)
    }
}

#[cfg(test)]
mod tests {
    use crate::normalize::control_characters;

    #[test]
    fn test_control_characters() -> Result<(), anyhow::Error> {
        let control = control_characters(',')?;
        assert_eq!(control.replace_all("a\0b\r\nc\td", ""), "abcd");

        let control = control_characters('\t')?;
        assert_eq!(control.replace_all("a\0b\r\nc\td", ""), "abc\td");
        Ok(())
    }
}

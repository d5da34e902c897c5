use std::io::{BufWriter, Write};

use encoding_rs::{Encoding, UTF_8};

use crate::error::TabularError;

/// Buffered writer that encodes text in the job encoding.
pub(crate) struct TextSink<W: Write> {
    writer: BufWriter<W>,
    encoding: &'static Encoding,
}

impl<W: Write> TextSink<W> {
    pub(crate) fn new(writer: W, encoding: &'static Encoding) -> TextSink<W> {
        TextSink {
            writer: BufWriter::new(writer),
            encoding,
        }
    }

    pub(crate) fn write_str(&mut self, s: &str) -> Result<(), anyhow::Error> {
        if self.encoding == UTF_8 {
            self.writer.write_all(s.as_bytes())?;
        } else {
            let (bytes, _, unmappable) = self.encoding.encode(s);
            if unmappable {
                return Err(TabularError::Unmappable { encoding: self.encoding.name() }.into());
            }
            self.writer.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Write `record` followed by `separator`
    pub(crate) fn write_record(&mut self, record: &str, separator: &str) -> Result<(), anyhow::Error> {
        self.write_str(record)?;
        self.write_str(separator)
    }

    /// Flush buffered output and return the underlying writer
    pub(crate) fn into_inner(self) -> Result<W, anyhow::Error> {
        let writer = self.writer
            .into_inner()
            .map_err(|e| e.into_error())?;
        Ok(writer)
    }
}

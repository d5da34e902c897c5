use std::io::{ErrorKind, Read};

use encoding_rs::{Decoder, DecoderResult, Encoding};

use crate::error::TabularError;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Resolve an encoding label such as `UTF-8` or `ISO-8859-1`.
///
/// Only ASCII compatible encodings are accepted, record separators and delimiters are located
/// in decoded text but written back byte for byte.
pub(crate) fn resolve_encoding(label: &str) -> Result<&'static Encoding, TabularError> {
    let encoding = Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| TabularError::UnknownEncoding(label.to_string()))?;
    if !encoding.is_ascii_compatible() {
        return Err(TabularError::UnsupportedEncoding(encoding.name()));
    }
    Ok(encoding)
}

/// Incrementally decodes a byte stream and hands out records split on a separator string, or
/// single characters for the tabular parser.
pub(crate) struct TextSource<R: Read> {
    reader: R,
    decoder: Decoder,
    encoding: &'static Encoding,
    bytes: Vec<u8>,
    text: String,
    pos: usize,
    offset: u64,
    eof: bool,
}

impl<R: Read> TextSource<R> {
    pub(crate) fn new(reader: R, encoding: &'static Encoding) -> TextSource<R> {
        TextSource {
            reader,
            decoder: encoding.new_decoder_without_bom_handling(),
            encoding,
            bytes: vec![0; READ_BUFFER_SIZE],
            text: String::new(),
            pos: 0,
            offset: 0,
            eof: false,
        }
    }

    pub(crate) fn into_inner(self) -> R {
        self.reader
    }

    fn fill(&mut self) -> Result<(), anyhow::Error> {
        if self.eof {
            return Ok(());
        }
        if self.pos > 0 {
            self.text.drain(..self.pos);
            self.pos = 0;
        }

        let n = loop {
            match self.reader.read(&mut self.bytes) {
                Ok(n) => break n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        };
        let last = n == 0;

        let mut src = &self.bytes[..n];
        loop {
            let needed = self.decoder
                .max_utf8_buffer_length_without_replacement(src.len())
                .unwrap_or(src.len() * 3 + 16);
            self.text.reserve(needed);
            let (result, read) = self.decoder.decode_to_string_without_replacement(src, &mut self.text, last);
            src = &src[read..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => continue,
                DecoderResult::Malformed(_, _) => {
                    return Err(
                        TabularError::Encoding {
                            encoding: self.encoding.name(),
                            offset: self.offset + (n - src.len()) as u64,
                        }.into()
                    );
                }
            }
        }

        self.offset += n as u64;
        self.eof = last;
        Ok(())
    }

    /// Make at least `n` bytes of decoded text available unless the stream ends first
    fn ensure(&mut self, n: usize) -> Result<(), anyhow::Error> {
        while self.text.len() - self.pos < n && !self.eof {
            self.fill()?;
        }
        Ok(())
    }

    /// Next record terminated by `separator`, without the separator. The last record does not
    /// need a trailing separator. A stream ending right after a separator yields no extra record.
    pub(crate) fn read_record(&mut self, separator: &str) -> Result<Option<String>, anyhow::Error> {
        let mut search_from = self.pos;
        loop {
            if let Some(found) = self.text[search_from..].find(separator) {
                let end = search_from + found;
                let record = self.text[self.pos..end].to_string();
                self.pos = end + separator.len();
                return Ok(Some(record));
            }

            if self.eof {
                if self.pos < self.text.len() {
                    let record = self.text[self.pos..].to_string();
                    self.pos = self.text.len();
                    return Ok(Some(record));
                }
                return Ok(None);
            }

            // a separator may straddle the end of the decoded text
            let mut rescan = self.text.len().saturating_sub(separator.len()).max(self.pos);
            while !self.text.is_char_boundary(rescan) {
                rescan -= 1;
            }
            let relative = rescan - self.pos;
            self.fill()?;
            search_from = self.pos + relative;
        }
    }

    pub(crate) fn peek_char(&mut self) -> Result<Option<char>, anyhow::Error> {
        self.ensure(1)?;
        Ok(self.text[self.pos..].chars().next())
    }

    pub(crate) fn next_char(&mut self) -> Result<Option<char>, anyhow::Error> {
        let c = self.peek_char()?;
        if let Some(c) = c {
            self.pos += c.len_utf8();
        }
        Ok(c)
    }

    /// Consume `s` if the remaining text starts with it
    pub(crate) fn skip_if_starts_with(&mut self, s: &str) -> Result<bool, anyhow::Error> {
        self.ensure(s.len())?;
        if self.text[self.pos..].starts_with(s) {
            self.pos += s.len();
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use encoding_rs::{UTF_8, WINDOWS_1252};

    use crate::error::TabularError;
    use crate::text_source::{resolve_encoding, TextSource};

    /// Hands out one byte per read call to exercise separators split across reads
    struct Trickle<'a> {
        data: &'a [u8],
    }

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    fn records(source: &mut TextSource<impl Read>, separator: &str) -> Result<Vec<String>, anyhow::Error> {
        let mut result = Vec::new();
        while let Some(record) = source.read_record(separator)? {
            result.push(record);
        }
        Ok(result)
    }

    #[test]
    fn test_read_records() -> Result<(), anyhow::Error> {
        let mut source = TextSource::new("a\nb\n\nc".as_bytes(), UTF_8);
        assert_eq!(records(&mut source, "\n")?, vec!["a", "b", "", "c"]);

        let mut source = TextSource::new("a\nb\n".as_bytes(), UTF_8);
        assert_eq!(records(&mut source, "\n")?, vec!["a", "b"]);

        let mut source = TextSource::new("".as_bytes(), UTF_8);
        assert!(records(&mut source, "\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_multi_character_separator_across_reads() -> Result<(), anyhow::Error> {
        let data = "é1\r\nπ2\r\n3\r4\r\n".as_bytes();
        let mut source = TextSource::new(Trickle { data }, UTF_8);
        assert_eq!(records(&mut source, "\r\n")?, vec!["é1", "π2", "3\r4"]);
        Ok(())
    }

    #[test]
    fn test_decode_single_byte_encoding() -> Result<(), anyhow::Error> {
        let data: &[u8] = &[b'a', 0xE9, b'\n', 0x80];
        let mut source = TextSource::new(data, WINDOWS_1252);
        assert_eq!(records(&mut source, "\n")?, vec!["aé", "€"]);
        Ok(())
    }

    #[test]
    fn test_malformed_input() {
        let data: &[u8] = &[b'a', b'\n', 0xFF, b'\n'];
        let mut source = TextSource::new(data, UTF_8);
        let error = records(&mut source, "\n").unwrap_err();
        match error.downcast_ref::<TabularError>() {
            Some(TabularError::Encoding { encoding, .. }) => assert_eq!(*encoding, "UTF-8"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_encoding() {
        assert_eq!(resolve_encoding("utf8").unwrap(), UTF_8);
        assert_eq!(resolve_encoding("ISO-8859-1").unwrap().name(), "windows-1252");
        assert!(matches!(resolve_encoding("klingon"), Err(TabularError::UnknownEncoding(_))));
        assert!(matches!(resolve_encoding("UTF-16LE"), Err(TabularError::UnsupportedEncoding(_))));
    }

    #[test]
    fn test_chars() -> Result<(), anyhow::Error> {
        let mut source = TextSource::new(Trickle { data: "ab\r\nc".as_bytes() }, UTF_8);
        assert_eq!(source.next_char()?, Some('a'));
        assert_eq!(source.peek_char()?, Some('b'));
        assert!(!source.skip_if_starts_with("\r\n")?);
        assert_eq!(source.next_char()?, Some('b'));
        assert!(source.skip_if_starts_with("\r\n")?);
        assert_eq!(source.next_char()?, Some('c'));
        assert_eq!(source.next_char()?, None);
        Ok(())
    }
}

use std::io::Read;

use crate::text_source::TextSource;

/// A bounded run of consecutive data lines, numbered in input order
#[derive(Debug)]
pub(crate) struct Chunk {
    index: usize,
    lines: Vec<String>,
    bytes: u64,
}

impl Chunk {
    pub(crate) fn new(index: usize, lines: Vec<String>, bytes: u64) -> Chunk {
        Chunk {
            index,
            lines,
            bytes,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes
    }

    pub(crate) fn lines(self) -> Vec<String> {
        self.lines
    }
}

/// Splits the remaining lines of a source into chunks of at most `rows` lines. A chunk is also
/// closed as soon as its lines reach `jump` bytes.
pub(crate) struct ChunkIterator<R: Read> {
    source: TextSource<R>,
    record_separator: String,
    rows: usize,
    jump: u64,
    index: usize,
    done: bool,
}

impl<R: Read> ChunkIterator<R> {
    pub(crate) fn new(source: TextSource<R>, record_separator: &str, rows: usize, jump: u64) -> ChunkIterator<R> {
        ChunkIterator {
            source,
            record_separator: record_separator.to_string(),
            rows,
            jump,
            index: 0,
            done: false,
        }
    }

    fn read_chunk(&mut self) -> Result<Option<Chunk>, anyhow::Error> {
        let mut lines = Vec::new();
        let mut bytes: u64 = 0;
        while lines.len() < self.rows && bytes < self.jump {
            match self.source.read_record(&self.record_separator)? {
                Some(line) => {
                    bytes += line.len() as u64;
                    lines.push(line);
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if lines.is_empty() {
            Ok(None)
        } else {
            let chunk = Chunk::new(self.index, lines, bytes);
            self.index += 1;
            Ok(Some(chunk))
        }
    }
}

impl<R: Read> Iterator for ChunkIterator<R> {
    type Item = Result<Chunk, anyhow::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let chunk = self.read_chunk();
        if chunk.is_err() {
            self.done = true;
        }
        chunk.transpose()
    }
}

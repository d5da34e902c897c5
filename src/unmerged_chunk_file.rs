use std::cmp::Ordering;
use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use encoding_rs::UTF_8;

use crate::line_comparator::LineComparator;
use crate::line_record::LineRecord;
use crate::sorted_chunk_file::SortedChunkFile;
use crate::text_source::TextSource;

/// Read cursor over one chunk file during the merge. The cursor holds the next line of the chunk
/// as its head.
pub(crate) struct UnmergedChunkFile {
    index: usize,
    path: PathBuf,
    source: TextSource<File>,
    record_separator: String,
    comparator: LineComparator,
    head: Option<LineRecord>,
}

impl UnmergedChunkFile {
    pub(crate) fn new(chunk: &SortedChunkFile, record_separator: &str, comparator: &LineComparator) -> Result<UnmergedChunkFile, anyhow::Error> {
        let file = File::open(chunk.path())
            .with_context(|| format!("path: {}", chunk.path().display()))?;
        let mut unmerged = UnmergedChunkFile {
            index: chunk.index(),
            path: chunk.path().clone(),
            source: TextSource::new(file, UTF_8),
            record_separator: record_separator.to_string(),
            comparator: comparator.clone(),
            head: None,
        };
        unmerged.head = unmerged.read()?;
        Ok(unmerged)
    }

    fn read(&mut self) -> Result<Option<LineRecord>, anyhow::Error> {
        let line = self.source.read_record(&self.record_separator)
            .with_context(|| format!("path: {}", self.path.display()))?;
        Ok(line.map(|line| LineRecord::new(line, &self.comparator)))
    }

    /// Take the head and advance to the next line
    pub(crate) fn line_record(&mut self) -> Result<Option<LineRecord>, anyhow::Error> {
        let next = self.read()?;
        Ok(std::mem::replace(&mut self.head, next))
    }

    pub(crate) fn is_done(&self) -> bool {
        self.head.is_none()
    }
}

impl Eq for UnmergedChunkFile {}

impl PartialEq<Self> for UnmergedChunkFile {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for UnmergedChunkFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for UnmergedChunkFile {
    // comparison is flipped to work with BinaryHeap (Max Heap), the smallest head and among equal
    // heads the earliest chunk is the greatest
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.head, &other.head) {
            (None, None) => other.index.cmp(&self.index),
            // none > some so exhausted files pop first
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(head), Some(other_head)) => other_head.cmp(head)
                .then_with(|| other.index.cmp(&self.index)),
        }
    }
}

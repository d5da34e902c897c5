use std::cmp::Ordering;
use std::path::PathBuf;

/// A spilled, sorted chunk. Ordered by creation index, which breaks ties between equal keys
/// during the merge.
#[derive(Debug)]
pub(crate) struct SortedChunkFile {
    index: usize,
    path: PathBuf,
    lines: usize,
}

impl SortedChunkFile {
    pub(crate) fn new(index: usize, path: PathBuf, lines: usize) -> SortedChunkFile {
        SortedChunkFile {
            index,
            path,
            lines,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn path(&self) -> &PathBuf {
        &self.path
    }

    pub(crate) fn lines(&self) -> usize {
        self.lines
    }
}

impl Eq for SortedChunkFile {}

impl PartialEq<Self> for SortedChunkFile {
    fn eq(&self, other: &Self) -> bool {
        self.index.eq(&other.index)
    }
}

impl PartialOrd<Self> for SortedChunkFile {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortedChunkFile {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

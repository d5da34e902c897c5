use std::path::PathBuf;

use encoding_rs::Encoding;

use crate::line_comparator::LineComparator;

/// Immutable description of one sort job, validated by [crate::sort::Sort] at job start
#[derive(Clone)]
pub(crate) struct Config {
    tmp: PathBuf,
    tmp_prefix: String,
    tasks: usize,
    queue_size: usize,
    comparator: LineComparator,
    quote: Option<char>,
    record_separator: String,
    encoding: &'static Encoding,
    header_lines: usize,
    chunk_rows: usize,
    chunk_size_bytes: u64,
    files: usize,
    native_sort: bool,
}

impl Config {
    pub(crate) fn new(
        tmp: PathBuf,
        tmp_prefix: String,
        tasks: usize,
        comparator: LineComparator,
        quote: Option<char>,
        record_separator: String,
        encoding: &'static Encoding,
        header_lines: usize,
        chunk_rows: usize,
        chunk_size_bytes: u64,
        files: usize,
        native_sort: bool,
    ) -> Config {
        // each queued chunk holds its rows in memory
        let queue_size = tasks;
        Config {
            tmp,
            tmp_prefix,
            tasks,
            queue_size,
            comparator,
            quote,
            record_separator,
            encoding,
            header_lines,
            chunk_rows,
            chunk_size_bytes,
            files,
            native_sort,
        }
    }

    pub(crate) fn tmp(&self) -> &PathBuf {
        &self.tmp
    }

    pub(crate) fn tmp_prefix(&self) -> &String {
        &self.tmp_prefix
    }

    pub(crate) fn tasks(&self) -> usize {
        self.tasks
    }

    pub(crate) fn queue_size(&self) -> usize {
        self.queue_size
    }

    pub(crate) fn comparator(&self) -> &LineComparator {
        &self.comparator
    }

    pub(crate) fn column(&self) -> usize {
        self.comparator.column()
    }

    pub(crate) fn delimiter(&self) -> &str {
        self.comparator.delimiter()
    }

    pub(crate) fn quote(&self) -> Option<char> {
        self.quote
    }

    pub(crate) fn record_separator(&self) -> &str {
        &self.record_separator
    }

    pub(crate) fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub(crate) fn header_lines(&self) -> usize {
        self.header_lines
    }

    pub(crate) fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    pub(crate) fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size_bytes
    }

    pub(crate) fn files(&self) -> usize {
        self.files
    }

    pub(crate) fn native_sort(&self) -> bool {
        self.native_sort
    }
}

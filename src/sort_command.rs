use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context};
use command_executor::command::Command;
use encoding_rs::UTF_8;

use crate::chunk_iterator::Chunk;
use crate::line_comparator::LineComparator;
use crate::line_record::LineRecord;
use crate::sorted_chunk_file::SortedChunkFile;
use crate::text_sink::TextSink;

pub(crate) type SortResults = Arc<Mutex<Vec<Result<SortedChunkFile, anyhow::Error>>>>;

pub(crate) fn chunk_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("chunk-{:08}.part", index))
}

/// Write sorted lines to a chunk file, internal chunk files are always UTF-8
pub(crate) fn write_sorted_chunk(path: &Path, lines: impl Iterator<Item = LineRecord>, record_separator: &str) -> Result<usize, anyhow::Error> {
    let file = File::create(path)
        .with_context(|| format!("path: {}", path.display()))?;
    let mut sink = TextSink::new(file, UTF_8);
    let mut count = 0;
    for line_record in lines {
        sink.write_record(line_record.as_str(), record_separator)?;
        count += 1;
    }
    sink.into_inner()
        .with_context(|| format!("path: {}", path.display()))?;
    Ok(count)
}

/// Sorts one chunk in memory and spills it to the job directory
pub(crate) struct SortCommand {
    chunk: Mutex<Option<Chunk>>,
    comparator: LineComparator,
    record_separator: String,
    dir: PathBuf,
    results: SortResults,
}

impl SortCommand {
    pub(crate) fn new(chunk: Chunk, comparator: LineComparator, record_separator: String, dir: PathBuf, results: SortResults) -> SortCommand {
        SortCommand {
            chunk: Mutex::new(Some(chunk)),
            comparator,
            record_separator,
            dir,
            results,
        }
    }

    fn sort_chunk(&self) -> Result<SortedChunkFile, anyhow::Error> {
        let chunk = self.chunk
            .lock()
            .map_err(|_| anyhow!("chunk lock poisoned"))?
            .take()
            .ok_or_else(|| anyhow!("chunk already sorted"))?;
        let index = chunk.index();
        let bytes = chunk.bytes();

        let mut line_records: Vec<LineRecord> = chunk.lines()
            .into_iter()
            .map(|line| LineRecord::new(line, &self.comparator))
            .collect();
        // stable, rows with equal keys keep their input order
        line_records.sort();

        let path = chunk_path(&self.dir, index);
        let lines = write_sorted_chunk(&path, line_records.into_iter(), &self.record_separator)?;
        log::debug!("Spilled chunk {}, lines: {}, bytes: {}, path: {}", index, lines, bytes, path.display());
        Ok(SortedChunkFile::new(index, path, lines))
    }
}

impl Command for SortCommand {
    fn execute(&self) -> Result<(), anyhow::Error> {
        // failures are handed back through the results, the job decides what to do with them
        let result = self.sort_chunk();
        if let Err(e) = &result {
            log::error!("Failed to sort chunk: {:#}", e);
        }
        self.results
            .lock()
            .map_err(|_| anyhow!("results lock poisoned"))?
            .push(result);
        Ok(())
    }
}

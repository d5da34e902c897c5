use std::collections::BinaryHeap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{anyhow, Context};
use command_executor::shutdown_mode::ShutdownMode;
use command_executor::thread_pool_builder::ThreadPoolBuilder;
use encoding_rs::UTF_8;
use tempfile::{Builder, TempDir};

use crate::chunk_iterator::ChunkIterator;
use crate::comparison_mode::ComparisonMode;
use crate::config::Config;
use crate::error::TabularError;
use crate::file_limit::FileLimitGuard;
use crate::line_comparator::LineComparator;
use crate::line_record::LineRecord;
use crate::native_sort::native_sort;
use crate::normalize::parent_dir;
use crate::sort_command::{chunk_path, SortCommand, SortResults};
use crate::sort_phase::SortPhase;
use crate::sorted_chunk_file::SortedChunkFile;
use crate::strategy::{native_incompatibility, native_sort_available, select_strategy, SortStrategy};
use crate::text_sink::TextSink;
use crate::text_source::{resolve_encoding, TextSource};
use crate::unmerged_chunk_file::UnmergedChunkFile;

/// Sort a delimited text file by one column
///
/// The header lines are copied to the output unchanged, the data rows follow ordered by the
/// key of the sort column (see [LineComparator]). Rows with equal keys keep their input order.
///
/// When the job allows it, the `sort` utility of the operating system is used with the `C`
/// collation, otherwise the rows are sorted in memory bounded chunks which are spilled to a
/// temporary directory and merged. The temporary directory belongs to the job and is removed when
/// the job ends, successfully or not.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use tabular_file_sort::sort::Sort;
///
/// // sort a semicolon separated file with one header line by its fourth column
/// fn sort_taxa(input: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<(), anyhow::Error> {
///     let mut sort = Sort::new(input, output);
///     sort.with_column(3);
///     sort.with_delimiter(";");
///     sort.with_header_lines(1);
///     // set the directory for intermediate results. The default is the system temp dir -
///     // std::env::temp_dir(), however, for large files it is recommended to provide a dedicated
///     // directory for intermediate files.
///     sort.with_tmp_dir(tmp);
///     sort.sort()
/// }
/// ```
pub struct Sort {
    input: PathBuf,
    output: PathBuf,
    tmp: PathBuf,
    tasks: usize,
    column: usize,
    delimiter: String,
    quote: Option<char>,
    record_separator: String,
    encoding: String,
    header_lines: usize,
    chunk_rows: usize,
    chunk_size_bytes: u64,
    files: usize,
    native_sort: bool,
    comparison_mode: ComparisonMode,
}

impl Sort {
    /// Create a default Sort definition.
    ///
    /// * intermediate files go to a job directory under std::env::temp_dir()
    /// * sort column is 0, the first column
    /// * the delimiter is a TAB ("\t") and there is no quote character
    /// * the record separator is "\n"
    /// * the encoding is UTF-8
    /// * there are no header lines
    /// * chunks hold at most 100 000 rows or 10 MB
    /// * at most 1024 chunk files are merged at once
    /// * the native sort utility is used when the job allows it
    /// * keys are compared by code point
    ///
    /// The Sort implementation will increase the file descriptor rlimit to accommodate the merged
    /// chunk files
    pub fn new(input: PathBuf, output: PathBuf) -> Sort {
        Sort {
            input,
            output,
            tmp: std::env::temp_dir(),
            tasks: 0,
            column: 0,
            delimiter: "\t".to_string(),
            quote: None,
            record_separator: "\n".to_string(),
            encoding: "UTF-8".to_string(),
            header_lines: 0,
            chunk_rows: 100_000,
            chunk_size_bytes: 10_000_000,
            files: 1024,
            native_sort: true,
            comparison_mode: ComparisonMode::CodePoint,
        }
    }

    /// Set the directory under which the job directory for intermediate files is created
    pub fn with_tmp_dir(&mut self, tmp: PathBuf) {
        self.tmp = tmp;
    }

    /// Set the number of sorting tasks. The default is zero which will result in using all system
    /// cores
    pub fn with_tasks(&mut self, tasks: usize) {
        self.tasks = tasks;
    }

    /// Set the zero based sort column
    pub fn with_column(&mut self, column: usize) {
        self.column = column;
    }

    /// Set the column delimiter. It may be longer than one character, which rules out the native
    /// sort utility
    pub fn with_delimiter(&mut self, delimiter: &str) {
        self.delimiter = delimiter.to_string();
    }

    /// Declare the quote character of the file. Quotes are not interpreted by the comparator, a
    /// quoted file is never handed to the native sort utility
    pub fn with_quote(&mut self, quote: char) {
        self.quote = Some(quote);
    }

    /// Set the record separator, e.g. "\n", "\r" or "\r\n"
    pub fn with_record_separator(&mut self, record_separator: &str) {
        self.record_separator = record_separator.to_string();
    }

    /// Set the encoding label of input and output
    pub fn with_encoding(&mut self, encoding: &str) {
        self.encoding = encoding.to_string();
    }

    /// Number of leading lines copied to the output unsorted
    pub fn with_header_lines(&mut self, header_lines: usize) {
        self.header_lines = header_lines;
    }

    /// Maximum number of rows sorted in memory at once
    pub fn with_chunk_rows(&mut self, chunk_rows: usize) {
        self.chunk_rows = chunk_rows;
    }

    /// Maximum number of bytes sorted in memory at once, the chunk is closed on the line
    /// reaching it
    pub fn with_chunk_size_bytes(&mut self, chunk_size_bytes: u64) {
        self.chunk_size_bytes = chunk_size_bytes;
    }

    /// Same as [Sort::with_chunk_size_bytes] in MB
    pub fn with_chunk_size_mb(&mut self, chunk_size_mb: u64) {
        self.chunk_size_bytes = chunk_size_mb.saturating_mul(1_000_000);
    }

    /// Set the number of chunk files merged at once. The default is 1024.
    pub fn with_intermediate_files(&mut self, files: usize) {
        self.files = files;
    }

    /// Allow or forbid delegating to the native sort utility. The default is to allow it.
    pub fn with_native_sort(&mut self, native_sort: bool) {
        self.native_sort = native_sort;
    }

    /// Set [ComparisonMode]
    pub fn with_comparison_mode(&mut self, comparison_mode: ComparisonMode) {
        self.comparison_mode = comparison_mode;
    }

    /// The strategy [Sort::sort] would use
    pub fn strategy(&self) -> Result<SortStrategy, anyhow::Error> {
        let config = self.create_config()?;
        Ok(select_strategy(&config, Self::native_available(&config)))
    }

    /// Sort the input into the output
    pub fn sort(&self) -> Result<(), anyhow::Error> {
        let config = self.create_config()?;
        if !self.input.exists() {
            return Err(TabularError::InputNotFound(self.input.clone()).into());
        }
        log::info!(
            "Start sorting {} by column {} into {}",
            self.input.display(),
            config.column(),
            self.output.display()
        );

        let job_dir = Self::create_job_dir(&config)?;
        let result = match select_strategy(&config, Self::native_available(&config)) {
            SortStrategy::Native => {
                match native_sort(&self.input, &self.output, &config, job_dir.path()) {
                    Err(e) if matches!(e.downcast_ref::<TabularError>(), Some(TabularError::NativeSortFailed(_))) => {
                        log::warn!("Falling back to external sort: {:#}", e);
                        Self::external_sort(&self.input, &self.output, &config, job_dir.path())
                    }
                    other => other,
                }
            }
            SortStrategy::External => {
                Self::external_sort(&self.input, &self.output, &config, job_dir.path())
            }
        };

        let job_dir_path = job_dir.path().to_path_buf();
        let cleanup = job_dir.close()
            .with_context(|| format!("remove job directory: {}", job_dir_path.display()));
        result?;
        cleanup?;
        log::info!("Finish sorting {}", self.input.display());
        Ok(())
    }

    /// Check whether the data rows of the input are already sorted
    pub fn check(&self) -> Result<bool, anyhow::Error> {
        let config = self.create_config()?;
        if !self.input.exists() {
            return Err(TabularError::InputNotFound(self.input.clone()).into());
        }
        let file = File::open(&self.input)
            .with_context(|| format!("path: {}", self.input.display()))?;
        let mut source = TextSource::new(file, config.encoding());
        for _ in 0..config.header_lines() {
            if source.read_record(config.record_separator())?.is_none() {
                return Ok(true);
            }
        }

        let mut previous: Option<LineRecord> = None;
        while let Some(line) = source.read_record(config.record_separator())? {
            let current = LineRecord::new(line, config.comparator());
            if let Some(previous) = &previous {
                if previous > &current {
                    return Ok(false);
                }
            }
            previous = Some(current);
        }
        Ok(true)
    }

    pub(crate) fn create_config(&self) -> Result<Config, anyhow::Error> {
        let invalid = |message: String| -> anyhow::Error {
            TabularError::InvalidConfiguration(message).into()
        };
        if self.delimiter.is_empty() {
            return Err(invalid("delimiter must not be empty".to_string()));
        }
        if self.record_separator.is_empty() {
            return Err(invalid("record separator must not be empty".to_string()));
        }
        if self.delimiter.contains(&self.record_separator) || self.record_separator.contains(&self.delimiter) {
            return Err(
                invalid(format!("delimiter {:?} clashes with record separator {:?}", self.delimiter, self.record_separator))
            );
        }
        if self.chunk_rows == 0 || self.chunk_size_bytes == 0 {
            return Err(invalid("chunk budget must be positive".to_string()));
        }
        if self.files < 2 {
            return Err(invalid("at least two intermediate files must be merged at once".to_string()));
        }
        let encoding = resolve_encoding(&self.encoding)?;

        let tasks = if self.tasks == 0 {
            num_cpus::get()
        } else {
            self.tasks
        };

        let comparator = LineComparator::new(self.column, &self.delimiter)
            .with_comparison_mode(self.comparison_mode);

        Ok(
            Config::new(
                self.tmp.clone(),
                "tabular-sort-".to_string(),
                tasks,
                comparator,
                self.quote,
                self.record_separator.clone(),
                encoding,
                self.header_lines,
                self.chunk_rows,
                self.chunk_size_bytes,
                self.files,
                self.native_sort,
            )
        )
    }

    fn native_available(config: &Config) -> bool {
        config.native_sort() && native_incompatibility(config).is_none() && native_sort_available()
    }

    fn create_job_dir(config: &Config) -> Result<TempDir, anyhow::Error> {
        Builder::new()
            .prefix(config.tmp_prefix())
            .tempdir_in(config.tmp())
            .with_context(|| format!("create job directory in {}", config.tmp().display()))
    }

    fn transition(phase: &mut SortPhase, next: SortPhase) {
        log::info!("Sort phase {} -> {}", phase, next);
        *phase = next;
    }

    fn external_sort(input: &Path, output: &Path, config: &Config, job_dir: &Path) -> Result<(), anyhow::Error> {
        log::info!("Start external sort");
        let mut phase = SortPhase::Split;
        let result = Self::run_phases(input, output, config, job_dir, &mut phase);
        if let Err(e) = &result {
            log::error!("External sort of {} failed in phase {}: {:#}", input.display(), phase, e);
        }
        let failed_in = phase;
        if result.is_err() {
            Self::transition(&mut phase, SortPhase::Failed);
        }
        result.with_context(|| format!("sort phase: {}, input: {}", failed_in, input.display()))
    }

    fn run_phases(input: &Path, output: &Path, config: &Config, job_dir: &Path, phase: &mut SortPhase) -> Result<(), anyhow::Error> {
        let file = File::open(input)
            .with_context(|| format!("path: {}", input.display()))?;
        let mut source = TextSource::new(file, config.encoding());
        let mut header = Vec::with_capacity(config.header_lines());
        for _ in 0..config.header_lines() {
            match source.read_record(config.record_separator())? {
                Some(line) => header.push(line),
                None => break,
            }
        }

        let sorted_files = Self::split_and_sort(source, config, job_dir, phase)?;

        Self::transition(phase, SortPhase::Merge);
        Self::merge_sorted_files(sorted_files, &header, output, config, job_dir)?;

        Self::transition(phase, SortPhase::Done);
        Ok(())
    }

    fn split_and_sort(source: TextSource<File>, config: &Config, job_dir: &Path, phase: &mut SortPhase) -> Result<Vec<SortedChunkFile>, anyhow::Error> {
        let mut thread_pool_builder = ThreadPoolBuilder::new();
        let mut sorting_pool = thread_pool_builder
            .with_name("sorting".to_string())
            .with_tasks(config.tasks())
            .with_queue_size(config.queue_size())
            .with_shutdown_mode(ShutdownMode::CompletePending)
            .build()?;

        let results: SortResults = Arc::new(Mutex::new(Vec::new()));
        let mut submitted: usize = 0;
        let split = (|| -> Result<(), anyhow::Error> {
            let chunks = ChunkIterator::new(
                source,
                config.record_separator(),
                config.chunk_rows(),
                config.chunk_size_bytes(),
            );
            for chunk in chunks {
                let sort_command = Box::new(
                    SortCommand::new(
                        chunk?,
                        config.comparator().clone(),
                        config.record_separator().to_string(),
                        job_dir.to_path_buf(),
                        results.clone(),
                    )
                );
                sorting_pool.submit(sort_command);
                submitted += 1;
            }
            Ok(())
        })();

        if split.is_ok() {
            Self::transition(phase, SortPhase::SortChunks);
        }
        log::info!("Shutting down sorting pool, submitted chunks: {}", submitted);
        sorting_pool.shutdown();
        let joined = sorting_pool.join();
        split?;
        joined?;

        let results = std::mem::take(
            &mut *results.lock().map_err(|_| anyhow!("sort results lock poisoned"))?
        );
        let mut sorted_files = Vec::with_capacity(results.len());
        for result in results {
            sorted_files.push(result?);
        }
        if sorted_files.len() != submitted {
            return Err(anyhow!("Sorted {} of {} chunks", sorted_files.len(), submitted));
        }
        sorted_files.sort();
        Ok(sorted_files)
    }

    fn merge_sorted_files(sorted_files: Vec<SortedChunkFile>, header: &[String], output: &Path, config: &Config, job_dir: &Path) -> Result<(), anyhow::Error> {
        let _file_limit = FileLimitGuard::acquire(config.files())?;
        Self::merge_into_output(sorted_files, header, output, config, job_dir)
    }

    fn merge_into_output(mut sorted_files: Vec<SortedChunkFile>, header: &[String], output: &Path, config: &Config, job_dir: &Path) -> Result<(), anyhow::Error> {
        let mut next_index = sorted_files.iter().map(|f| f.index() + 1).max().unwrap_or(0);
        while sorted_files.len() > config.files() {
            sorted_files = Self::reduce_sorted_files(sorted_files, config, job_dir, &mut next_index)?;
        }

        let output_dir = parent_dir(output);
        let merged_file = Builder::new()
            .prefix(config.tmp_prefix())
            .tempfile_in(output_dir)
            .with_context(|| format!("path: {}", output_dir.display()))?;
        let mut merged_writer = TextSink::new(merged_file, config.encoding());
        for line in header {
            merged_writer.write_record(line, config.record_separator())?;
        }
        Self::internal_merge(sorted_files, config, &mut merged_writer)?;

        let merged_file = merged_writer.into_inner()?;
        merged_file.persist(output)
            .with_context(|| format!("path: {}", output.display()))?;
        Ok(())
    }

    /// Merge consecutive runs of chunk files so that at most `files` remain. New chunks are
    /// numbered in run order, which keeps equal keys in input order.
    fn reduce_sorted_files(sorted_files: Vec<SortedChunkFile>, config: &Config, job_dir: &Path, next_index: &mut usize) -> Result<Vec<SortedChunkFile>, anyhow::Error> {
        log::info!("Reducing {} sorted files in runs of {}", sorted_files.len(), config.files());
        let mut reduced = Vec::new();
        let mut sorted_files = sorted_files.into_iter().peekable();
        while sorted_files.peek().is_some() {
            let mut run: Vec<SortedChunkFile> = sorted_files.by_ref().take(config.files()).collect();
            let index = *next_index;
            *next_index += 1;

            if run.len() == 1 {
                let single = run.remove(0);
                reduced.push(SortedChunkFile::new(index, single.path().clone(), single.lines()));
                continue;
            }

            let path = chunk_path(job_dir, index);
            let file = File::create(&path)
                .with_context(|| format!("path: {}", path.display()))?;
            let mut merged_writer = TextSink::new(file, UTF_8);
            let lines = Self::internal_merge(run, config, &mut merged_writer)?;
            merged_writer.into_inner()?;
            reduced.push(SortedChunkFile::new(index, path, lines));
        }
        Ok(reduced)
    }

    pub(crate) fn internal_merge<W: Write>(sorted_files: Vec<SortedChunkFile>, config: &Config, merged_writer: &mut TextSink<W>) -> Result<usize, anyhow::Error> {
        log::info!("Merging {} sorted files, thread: {}", sorted_files.len(), thread::current().name().unwrap_or("unnamed"));
        let record_separator = config.record_separator();
        let mut merged_len: usize = 0;

        if sorted_files.len() == 1 {
            let path = sorted_files[0].path();
            let file = File::open(path)
                .with_context(|| format!("path: {}", path.display()))?;
            let mut source = TextSource::new(file, UTF_8);
            while let Some(line) = source.read_record(record_separator)? {
                merged_writer.write_record(&line, record_separator)?;
                merged_len += 1;
            }
        } else if sorted_files.len() > 1 {
            let mut unmerged_files = BinaryHeap::with_capacity(sorted_files.len());
            for sorted_file in &sorted_files {
                let unmerged = UnmergedChunkFile::new(sorted_file, record_separator, config.comparator())?;
                if !unmerged.is_done() {
                    unmerged_files.push(unmerged);
                }
            }

            while let Some(mut current_min) = unmerged_files.pop() {
                // comparison operators are flipped to work with BinaryHeap (Max Heap)
                while let Some(line_record) = current_min.line_record()? {
                    merged_writer.write_record(line_record.as_str(), record_separator)?;
                    merged_len += 1;
                    if current_min.is_done() {
                        break;
                    }
                    if let Some(unmerged_min) = unmerged_files.peek() {
                        if &current_min < unmerged_min {
                            break;
                        }
                    }
                }
                if !current_min.is_done() {
                    unmerged_files.push(current_min);
                }
            }
        }

        for sorted_file in &sorted_files {
            std::fs::remove_file(sorted_file.path())
                .with_context(|| format!("path: {}", sorted_file.path().display()))?;
        }
        log::info!("Finished merging sorted files, thread: {}, merged length: {} lines", thread::current().name().unwrap_or("unnamed"), merged_len);
        Ok(merged_len)
    }
}

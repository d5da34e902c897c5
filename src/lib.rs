//! This crate sorts and normalizes large delimited text files, for example the CSV and TSV files
//! exchanged as [Darwin Core Archives](https://dwc.tdwg.org/text/) in biodiversity data
//! publishing.
//!
//! * [sort::Sort] orders the data rows of a file by one column, keeping its header lines on top.
//!   Files larger than memory are sorted in bounded chunks that are spilled to a job owned
//!   temporary directory and merged. When the layout allows it the `sort` utility of the
//!   operating system is used with the `C` collation, giving the same order.
//! * [normalize::Normalize] rewrites irregular input (quoted fields spanning lines, stray
//!   control characters, missing final line break) into one line per record.
//! * [tabular_reader::TabularReader] reads records as lists of field values, tolerating rows
//!   with more or fewer fields than the header.
//!
//! Sort keys are compared as raw text by code point, independent of any locale. See
//! [comparison_mode::ComparisonMode] and [line_comparator::LineComparator].
//!
//! # Examples
//! ```
//! use std::path::PathBuf;
//! use tabular_file_sort::normalize::Normalize;
//! use tabular_file_sort::sort::Sort;
//!
//! // normalize a CSV file, then sort it by its first column
//! fn normalize_and_sort(input: PathBuf, normalized: PathBuf, output: PathBuf, tmp: PathBuf) -> Result<usize, anyhow::Error> {
//!     let normalize = Normalize::new(input, normalized.clone());
//!     let records = normalize.normalize()?;
//!
//!     let mut sort = Sort::new(normalized, output);
//!     sort.with_delimiter(",");
//!     sort.with_quote('"');
//!     sort.with_header_lines(1);
//!     // a dedicated directory for intermediate files, preferably on the same file system as the
//!     // output
//!     sort.with_tmp_dir(tmp);
//!     sort.sort()?;
//!     Ok(records)
//! }
//! ```
//!

pub(crate) mod chunk_iterator;
pub(crate) mod config;
pub(crate) mod file_limit;
pub(crate) mod line_record;
pub(crate) mod native_sort;
pub(crate) mod sort_command;
pub(crate) mod sorted_chunk_file;
pub(crate) mod text_sink;
pub(crate) mod text_source;
pub(crate) mod unmerged_chunk_file;

pub mod comparison_mode;
pub mod error;
pub mod line_comparator;
pub mod normalize;
pub mod sort;
pub mod sort_phase;
pub mod strategy;
pub mod tabular_format;
pub mod tabular_reader;

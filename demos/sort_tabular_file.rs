use std::path::{Path, PathBuf};
use anyhow::Error;
use simple_logger::SimpleLogger;
use tabular_file_sort::comparison_mode::ComparisonMode;
use tabular_file_sort::normalize::Normalize;
use tabular_file_sort::sort::Sort;

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn normalize_csv(input_path: &Path, output_path: &Path) -> Result<usize, Error> {
    let normalize = Normalize::new(input_path.to_path_buf(), output_path.to_path_buf());
    normalize.normalize()
}

fn sort_csv(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut text_file = Sort::new(input_path.to_path_buf(), output_path.to_path_buf());
    text_file.with_delimiter(",");
    text_file.with_quote('"');
    text_file.sort()?;
    Ok(())
}

fn sort_with_header(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    // tab delimited without quotes, eligible for the native sort utility
    let mut text_file = Sort::new(input_path.to_path_buf(), output_path.to_path_buf());
    text_file.with_header_lines(1);
    log::info!("Strategy: {:?}", text_file.strategy()?);
    text_file.sort()?;
    Ok(())
}

fn sort_by_column(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut text_file = Sort::new(input_path.to_path_buf(), output_path.to_path_buf());
    text_file.with_column(3);
    text_file.with_delimiter(";");
    text_file.with_header_lines(1);
    text_file.with_native_sort(false);
    text_file.with_chunk_rows(2);
    text_file.sort()?;
    Ok(())
}

fn sort_utf16_order(input_path: &Path, output_path: &Path) -> Result<(), Error> {
    let mut text_file = Sort::new(input_path.to_path_buf(), output_path.to_path_buf());
    text_file.with_comparison_mode(ComparisonMode::Utf16CodeUnit);
    text_file.sort()?;
    Ok(())
}

// cargo run -r --example sort_tabular_file
pub fn main() -> Result<(), Error> {
    SimpleLogger::new().init()?;

    let normalized_path = PathBuf::from("./target/normalized.csv");
    let records = normalize_csv(Path::new("./tests/fixtures/test_normalize.csv"), &normalized_path)?;
    log::info!("Normalized {} records", records);

    sort_csv(&normalized_path, Path::new("./target/normalized-sorted.csv"))?;
    sort_with_header(Path::new("./tests/fixtures/taxon.txt"), Path::new("./target/taxon-sorted.txt"))?;
    sort_by_column(Path::new("./tests/fixtures/TDB_104.csv"), Path::new("./target/TDB_104-sorted.csv"))?;
    sort_utf16_order(
        Path::new("./tests/fixtures/unicode-supplementary-multilingual-plane.txt"),
        Path::new("./target/unicode-utf16-sorted.txt"),
    )?;

    Ok(())
}

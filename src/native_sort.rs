use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{anyhow, Context};
use tempfile::Builder;

use crate::config::Config;
use crate::error::TabularError;
use crate::normalize::parent_dir;
use crate::text_sink::TextSink;
use crate::text_source::TextSource;

/// Sort by delegating the data rows to the `sort` utility of the operating system.
///
/// Only used for jobs the selector has found compatible: `\n` separated UTF-8 lines, a single
/// byte delimiter and no quoting. The header lines are written first, the utility appends the
/// sorted rows behind them.
pub(crate) fn native_sort(input: &Path, output: &Path, config: &Config, job_dir: &Path) -> Result<(), anyhow::Error> {
    log::info!("Start native sort of {}", input.display());
    let file = File::open(input)
        .with_context(|| format!("path: {}", input.display()))?;
    let mut source = TextSource::new(file, config.encoding());

    let output_dir = parent_dir(output);
    let merged_file = Builder::new()
        .prefix(config.tmp_prefix())
        .tempfile_in(output_dir)
        .with_context(|| format!("path: {}", output_dir.display()))?;

    let mut sink = TextSink::new(merged_file, config.encoding());
    for _ in 0..config.header_lines() {
        match source.read_record(config.record_separator())? {
            Some(header) => sink.write_record(&header, config.record_separator())?,
            None => break,
        }
    }
    let merged_file = sink.into_inner()?;
    let stdout = merged_file.as_file().try_clone()?;

    let column = config.column() + 1;
    let mut child = Command::new("sort")
        .env("LC_ALL", "C")
        .arg("-s")
        .arg(format!("-t{}", config.delimiter()))
        .arg(format!("-k{},{}", column, column))
        .arg("-T")
        .arg(job_dir)
        .stdin(Stdio::piped())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TabularError::NativeSortFailed(format!("spawn sort: {}", e)))?;

    let stdin = child.stdin.take().ok_or_else(|| anyhow!("sort stdin is not piped"))?;
    let mut writer = BufWriter::new(stdin);
    let mut lines: usize = 0;
    let fed = (|| -> Result<(), anyhow::Error> {
        while let Some(line) = source.read_record(config.record_separator())? {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            lines += 1;
        }
        writer.flush()?;
        Ok(())
    })();
    drop(writer);

    let mut stderr = String::new();
    if let Some(mut err) = child.stderr.take() {
        err.read_to_string(&mut stderr)?;
    }
    let status = child.wait()?;
    if !status.success() {
        return Err(TabularError::NativeSortFailed(format!("{}: {}", status, stderr.trim())).into());
    }
    fed?;

    merged_file.persist(output)
        .with_context(|| format!("path: {}", output.display()))?;
    log::info!("Finish native sort of {}, sorted {} lines", input.display(), lines);
    Ok(())
}

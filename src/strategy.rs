use std::process::{Command, Stdio};

use encoding_rs::UTF_8;

use crate::comparison_mode::ComparisonMode;
use crate::config::Config;

/// How a sort job is carried out
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortStrategy {
    /// Delegate to the operating system `sort` utility running with the `C` collation
    Native,
    /// Sort in process with the external merge sort
    External,
}

/// Whether a `sort` utility answering `sort --version` is on the `PATH`
pub fn native_sort_available() -> bool {
    Command::new("sort")
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// The reason the native utility would not order the job exactly like the in process sort, or
/// `None` when it would.
///
/// The native utility splits fields on a single byte, knows nothing about quotes, only handles
/// `\n` terminated lines and compares bytes. Byte order equals code point order only for UTF-8.
pub(crate) fn native_incompatibility(config: &Config) -> Option<String> {
    let delimiter = config.delimiter();
    let mut chars = delimiter.chars();
    let single_ascii = match (chars.next(), chars.next()) {
        (Some(c), None) => c.is_ascii() && c != '\n' && c != '\0',
        _ => false,
    };

    if !single_ascii {
        Some(format!("delimiter {:?} is not a single ASCII character", delimiter))
    } else if let Some(quote) = config.quote() {
        Some(format!("quote character {:?} is configured", quote))
    } else if config.record_separator() != "\n" {
        Some(format!("record separator {:?} is not a line feed", config.record_separator()))
    } else if config.encoding() != UTF_8 {
        Some(format!("encoding {} does not sort by code point as bytes", config.encoding().name()))
    } else if config.comparator().comparison_mode() != ComparisonMode::CodePoint {
        Some(format!("comparison mode {:?} is not code point order", config.comparator().comparison_mode()))
    } else {
        None
    }
}

pub(crate) fn select_strategy(config: &Config, native_available: bool) -> SortStrategy {
    if !config.native_sort() {
        log::info!("Native sort disabled, using external sort");
        return SortStrategy::External;
    }

    match native_incompatibility(config) {
        Some(reason) => {
            log::info!("Using external sort: {}", reason);
            SortStrategy::External
        }
        None if !native_available => {
            log::info!("Using external sort: native sort utility not available");
            SortStrategy::External
        }
        None => {
            log::info!("Using native sort");
            SortStrategy::Native
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::comparison_mode::ComparisonMode;
    use crate::config::Config;
    use crate::sort::Sort;
    use crate::strategy::{native_incompatibility, select_strategy, SortStrategy};

    fn job_config(configure: impl FnOnce(&mut Sort)) -> Config {
        let mut sort = Sort::new(PathBuf::from("in.txt"), PathBuf::from("out.txt"));
        configure(&mut sort);
        sort.create_config().unwrap()
    }

    #[test]
    fn test_plain_tsv_is_native() {
        let config = job_config(|_| {});
        assert_eq!(native_incompatibility(&config), None);
        assert_eq!(select_strategy(&config, true), SortStrategy::Native);
        assert_eq!(select_strategy(&config, false), SortStrategy::External);
    }

    #[test]
    fn test_multi_byte_delimiter_is_external() {
        let config = job_config(|sort| sort.with_delimiter("×"));
        assert_eq!(select_strategy(&config, true), SortStrategy::External);

        let config = job_config(|sort| sort.with_delimiter("::"));
        assert_eq!(select_strategy(&config, true), SortStrategy::External);
    }

    #[test]
    fn test_quote_is_external() {
        let config = job_config(|sort| {
            sort.with_delimiter(",");
            sort.with_quote('"');
        });
        assert_eq!(select_strategy(&config, true), SortStrategy::External);
    }

    #[test]
    fn test_record_separator_is_external() {
        for separator in ["\r", "\r\n"] {
            let config = job_config(|sort| sort.with_record_separator(separator));
            assert_eq!(select_strategy(&config, true), SortStrategy::External);
        }
    }

    #[test]
    fn test_encoding_is_external() {
        let config = job_config(|sort| sort.with_encoding("windows-1252"));
        assert_eq!(select_strategy(&config, true), SortStrategy::External);
    }

    #[test]
    fn test_comparison_mode_is_external() {
        let config = job_config(|sort| sort.with_comparison_mode(ComparisonMode::Utf16CodeUnit));
        assert_eq!(select_strategy(&config, true), SortStrategy::External);
    }

    #[test]
    fn test_disabled_native_is_external() {
        let config = job_config(|sort| sort.with_native_sort(false));
        assert_eq!(select_strategy(&config, true), SortStrategy::External);
    }
}

//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.
//!
//! ```text
//! cat.jpg → avatars/cat.webp
//!     Stored: WebP, 18204 bytes from 91733
//!     Disk: local (public)
//!
//! notes.pdf → docs/notes.pdf
//!     Stored: original (not converted)
//!     Disk: local (private)
//! ```

use crate::pipeline::{IngestionConfig, IngestionResult, UploadedInput};

/// Format the outcome of one ingestion.
///
/// `stored_size` is the size of the stored artifact when known.
pub fn format_ingest_result(
    input: &UploadedInput,
    config: &IngestionConfig,
    result: &IngestionResult,
    stored_size: Option<u64>,
) -> Vec<String> {
    let mut lines = vec![format!(
        "{} → {}",
        input.original_name(),
        result.stored_path
    )];

    let stored = if result.used_fallback || !result.stored_path.ends_with(".webp") {
        "original (not converted)".to_string()
    } else {
        match stored_size {
            Some(size) => format!("WebP, {size} bytes from {}", input.bytes().len()),
            None => "WebP".to_string(),
        }
    };
    lines.push(format!("    Stored: {stored}"));
    lines.push(format!("    Disk: {} ({})", config.disk, config.visibility));
    lines
}

pub fn print_ingest_result(
    input: &UploadedInput,
    config: &IngestionConfig,
    result: &IngestionResult,
    stored_size: Option<u64>,
) {
    for line in format_ingest_result(input, config, result, stored_size) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Visibility;

    fn config() -> IngestionConfig {
        IngestionConfig::new("local").with_directory("avatars")
    }

    #[test]
    fn converted_result_shows_sizes() {
        let input = UploadedInput::new(vec![0u8; 1000], "image/jpeg", "cat.jpg");
        let result = IngestionResult {
            stored_path: "avatars/cat.webp".into(),
            used_fallback: false,
        };

        let lines = format_ingest_result(&input, &config(), &result, Some(250));

        assert_eq!(
            lines,
            vec![
                "cat.jpg → avatars/cat.webp",
                "    Stored: WebP, 250 bytes from 1000",
                "    Disk: local (public)",
            ]
        );
    }

    #[test]
    fn fallback_result_says_original() {
        let input = UploadedInput::new(vec![1, 2, 3], "image/png", "bad.png");
        let result = IngestionResult {
            stored_path: "avatars/bad.png".into(),
            used_fallback: true,
        };
        let config = config().with_visibility(Visibility::Private);

        let lines = format_ingest_result(&input, &config, &result, Some(3));

        assert_eq!(lines[1], "    Stored: original (not converted)");
        assert_eq!(lines[2], "    Disk: local (private)");
    }

    #[test]
    fn verbatim_result_says_original() {
        let input = UploadedInput::new(vec![1], "image/png", "keep.png");
        let result = IngestionResult {
            stored_path: "keep.png".into(),
            used_fallback: false,
        };

        let lines = format_ingest_result(&input, &config(), &result, None);
        assert_eq!(lines[1], "    Stored: original (not converted)");
    }
}

//! Storage path derivation for ingested uploads.
//!
//! Every stored artifact lands at `directory/filename`, where `directory` is
//! the configured upload directory with leading and trailing `/` trimmed, and
//! an empty directory means the disk root:
//!
//! - converted: `avatars/photo.png` → `avatars/photo.webp`
//! - fallback:  `avatars/photo.png` → `avatars/photo.png`
//!
//! Only the final component of the original filename is used, so a client
//! supplying `a/b/photo.png` cannot steer the artifact outside the directory.
//! No collision handling happens here; a second upload with the same name
//! resolves to the same path.

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Name used when the client-supplied filename has no usable component.
pub const UNNAMED: &str = "upload";

/// Final non-empty path component of a client-supplied filename.
///
/// Trailing separators are ignored (`"a/uploads/"` → `"uploads"`). A name
/// that is empty or only `.`/`..` becomes [`UNNAMED`], so the result is
/// always a valid single path component.
pub fn base_name(original: &str) -> &str {
    match original.rsplit(SEPARATORS).find(|part| !part.is_empty()) {
        Some("." | "..") | None => UNNAMED,
        Some(name) => name,
    }
}

/// Filename stem: the base name with its last extension removed.
///
/// - `"a/b/photo.png"` → `"photo"`
/// - `"archive.tar.gz"` → `"archive.tar"`
/// - `".env"` → `".env"` (a leading dot is not an extension)
/// - `"README"` → `"README"`
pub fn file_stem(original: &str) -> &str {
    let name = base_name(original);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Trim leading and trailing separators from an upload directory.
pub fn normalize_directory(directory: &str) -> &str {
    directory.trim_matches('/')
}

/// Join a directory and filename with a single `/`.
pub fn join(directory: &str, filename: &str) -> String {
    let directory = normalize_directory(directory);
    if directory.is_empty() {
        filename.to_string()
    } else {
        format!("{directory}/{filename}")
    }
}

/// Path for a converted artifact: original stem plus `.{extension}`.
pub fn resolve(original: &str, extension: &str, directory: &str) -> String {
    join(directory, &format!("{}.{}", file_stem(original), extension))
}

/// Path for a verbatim artifact: the original base name, extension kept.
pub fn original_path(original: &str, directory: &str) -> String {
    join(directory, base_name(original))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_replaces_extension() {
        assert_eq!(resolve("photo.png", "webp", ""), "photo.webp");
        assert_eq!(resolve("photo.png", "webp", "uploads"), "uploads/photo.webp");
    }

    #[test]
    fn resolve_of_stem_only_is_stable() {
        let stem = file_stem("a/b/photo.png");
        assert_eq!(stem, "photo");
        assert_eq!(resolve(stem, "webp", "uploads"), "uploads/photo.webp");
    }

    #[test]
    fn resolve_trims_directory_separators() {
        assert_eq!(resolve("cat.jpg", "webp", "/avatars/"), "avatars/cat.webp");
        assert_eq!(resolve("cat.jpg", "webp", "//a/b//"), "a/b/cat.webp");
        assert_eq!(resolve("cat.jpg", "webp", "/"), "cat.webp");
    }

    #[test]
    fn resolve_strips_only_last_extension() {
        assert_eq!(resolve("scan.final.tiff", "webp", ""), "scan.final.webp");
    }

    #[test]
    fn resolve_webp_input_keeps_name() {
        assert_eq!(resolve("already.webp", "webp", "x"), "x/already.webp");
    }

    #[test]
    fn stem_without_extension_is_name() {
        assert_eq!(file_stem("README"), "README");
        assert_eq!(file_stem(".env"), ".env");
        assert_eq!(file_stem("trailing."), "trailing");
    }

    #[test]
    fn stem_handles_windows_separators() {
        assert_eq!(file_stem(r"C:\Users\me\dog.jpeg"), "dog");
    }

    #[test]
    fn base_name_takes_last_non_empty_component() {
        assert_eq!(base_name("dir/file.txt"), "file.txt");
        assert_eq!(base_name("uploads/"), "uploads");
        assert_eq!(base_name(r"a\b\"), "b");
    }

    #[test]
    fn degenerate_names_become_unnamed() {
        for name in ["", ".", "..", "/", "//", "a/..", r"..\", "./"] {
            assert_eq!(base_name(name), UNNAMED, "name {name:?}");
        }
    }

    #[test]
    fn degenerate_names_resolve_to_valid_keys() {
        assert_eq!(original_path("..", "docs"), "docs/upload");
        assert_eq!(original_path("", "docs"), "docs/upload");
        assert_eq!(original_path("uploads/", "docs"), "docs/uploads");
        assert_eq!(resolve("..", "webp", "docs"), "docs/upload.webp");
        assert_eq!(resolve("", "webp", ""), "upload.webp");
    }

    #[test]
    fn original_path_keeps_extension() {
        assert_eq!(original_path("report.pdf", "docs"), "docs/report.pdf");
        assert_eq!(original_path("x/y/report.pdf", ""), "report.pdf");
    }

    #[test]
    fn join_empty_directory_has_no_prefix() {
        assert_eq!(join("", "a.webp"), "a.webp");
        assert_eq!(join("d", "a.webp"), "d/a.webp");
    }
}

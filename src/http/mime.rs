//! MIME type detection module
//!
//! Picks a download `Content-Type` from a file name's extension.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess the MIME type of a file from its extension
///
/// # Examples
/// ```
/// use restbase::http::mime::content_type_for;
/// assert_eq!(content_type_for("report.PDF"), "application/pdf");
/// assert_eq!(content_type_for("archive"), "application/octet-stream");
/// ```
pub fn content_type_for(path: impl AsRef<Path>) -> &'static str {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("txt" | "md") => "text/plain; charset=utf-8",
        Some("csv") => "text/csv",
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz") => "application/gzip",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("odt") => "application/vnd.oasis.opendocument.text",
        Some("ods") => "application/vnd.oasis.opendocument.spreadsheet",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => OCTET_STREAM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_types() {
        assert_eq!(content_type_for("notes.txt"), "text/plain; charset=utf-8");
        assert_eq!(content_type_for("export.csv"), "text/csv");
        assert_eq!(content_type_for("dir/photo.JPG"), "image/jpeg");
        assert_eq!(content_type_for("data.json"), "application/json");
    }

    #[test]
    fn test_unknown_extension() {
        assert_eq!(content_type_for("file.xyz"), OCTET_STREAM);
        assert_eq!(content_type_for("Makefile"), OCTET_STREAM);
    }
}

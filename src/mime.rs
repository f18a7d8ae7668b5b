//! Media types of binary fields.
//!
//! A binary field stores a varuint id into [`MIME_TYPES`] instead of the
//! media type's name. Id 0 is `application/octet-stream`, the fallback for
//! unknown or missing file extensions.

/// `(extension, media type)` pairs. The position in this table is the id
/// written to the wire, so entries are only ever appended.
pub const MIME_TYPES: &[(&str, &str)] = &[
    ("bin", "application/octet-stream"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("html", "text/html"),
    ("xml", "application/xml"),
    ("pdf", "application/pdf"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("svg", "image/svg+xml"),
    ("webp", "image/webp"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("mp4", "video/mp4"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("js", "text/javascript"),
    ("css", "text/css"),
    ("md", "text/markdown"),
    ("wasm", "application/wasm"),
    ("parquet", "application/vnd.apache.parquet"),
];

/// Id of `application/octet-stream`.
pub const OCTET_STREAM: u64 = 0;

/// Resolves a file extension (with or without the leading dot, any case) to
/// a media type id. Unknown extensions map to [`OCTET_STREAM`].
#[must_use]
pub fn id_for_extension(ext: &str) -> u64 {
    let ext = ext.trim_start_matches('.');
    MIME_TYPES
        .iter()
        .position(|(e, _)| e.eq_ignore_ascii_case(ext))
        .map_or(OCTET_STREAM, |i| i as u64)
}

/// Media type name for an id, or `None` for ids this table does not know.
#[must_use]
pub fn name(id: u64) -> Option<&'static str> {
    usize::try_from(id)
        .ok()
        .and_then(|i| MIME_TYPES.get(i))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(name(id_for_extension("json")), Some("application/json"));
        assert_eq!(name(id_for_extension(".PNG")), Some("image/png"));
        assert_eq!(id_for_extension("csv"), 3);
    }

    #[test]
    fn test_unknown_extension_is_octet_stream() {
        assert_eq!(id_for_extension("nope"), OCTET_STREAM);
        assert_eq!(id_for_extension(""), OCTET_STREAM);
        assert_eq!(name(OCTET_STREAM), Some("application/octet-stream"));
        assert_eq!(name(10_000), None);
    }
}

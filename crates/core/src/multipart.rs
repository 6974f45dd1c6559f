//! Single-file multipart/form-data decoder.
//!
//! Decodes the raw request body of an upload without a multipart library.
//! The wire format is fixed by the upstream clients:
//!
//! ```text
//! ------WebKitFormBoundary88asdgewtgewx\r\n
//! Content-Disposition: form-data; user="mike"; filename="xxx.jpg"; md5="xxxx"; size=10240\r\n
//! Content-Type: application/octet-stream\r\n
//! \r\n
//! <raw file content>\r\n
//! ------WebKitFormBoundary88asdgewtgewx
//! ```
//!
//! Scanning works over an explicit cursor with bounds-checked searches that
//! return `Option` positions; there are no sentinel offsets. Each required
//! attribute is located by its literal `key="` marker in order of first
//! appearance, and the content span runs from the blank line after the
//! headers up to two bytes before the closing boundary.

use crate::error::{DecodeError, DecodeResult};
use crate::upload::{ContentHash, StagedUpload};

/// Line terminator used throughout the wire format.
const CRLF: &[u8] = b"\r\n";

/// Blank line separating the part headers from the content.
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Find the first occurrence of `needle` in `haystack` at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

/// Extract a quoted attribute value located by its `key="` marker.
///
/// Returns the trimmed value and the cursor position just past the closing
/// quote, so subsequent attributes are searched in order of appearance.
fn quoted_attr<'a>(
    body: &'a [u8],
    cursor: usize,
    marker: &[u8],
    field: &'static str,
) -> DecodeResult<(&'a str, usize)> {
    let start = find(body, marker, cursor).ok_or(DecodeError::MissingField(field))? + marker.len();
    let end = find(body, b"\"", start).ok_or(DecodeError::MissingField(field))?;
    let value =
        std::str::from_utf8(&body[start..end]).map_err(|_| DecodeError::InvalidEncoding(field))?;
    Ok((value.trim(), end + 1))
}

/// Extract the `size=` attribute, which runs to the end of its line.
///
/// The upstream clients send it unquoted while the other attributes are
/// quoted; an optional surrounding quote pair is tolerated.
fn size_attr(body: &[u8], cursor: usize) -> DecodeResult<(u64, usize)> {
    let marker: &[u8] = b"size=";
    let start =
        find(body, marker, cursor).ok_or(DecodeError::MissingField("size"))? + marker.len();
    let end = find(body, CRLF, start).ok_or(DecodeError::MissingField("size"))?;
    let raw = std::str::from_utf8(&body[start..end])
        .map_err(|_| DecodeError::InvalidEncoding("size"))?
        .trim();
    let raw = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    let size = raw
        .parse::<u64>()
        .map_err(|_| DecodeError::InvalidSize(raw.to_string()))?;
    Ok((size, end))
}

/// Reject filenames that would escape the staging directory.
///
/// Path separators and parent references in the client-supplied filename are
/// refused outright rather than flattened; see DESIGN.md for the policy.
fn validate_filename(filename: &str) -> DecodeResult<()> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains('\0')
        || filename == "."
        || filename == ".."
    {
        return Err(DecodeError::UnsafeFilename(filename.to_string()));
    }
    Ok(())
}

/// Decode a raw multipart body into a single-file upload.
///
/// Fails with `DecodeError` when the boundary is absent, any required
/// attribute marker is missing, or the content region cannot be located
/// within the body. The decoder performs no I/O; staging the content to
/// disk is the caller's responsibility.
pub fn decode_upload(body: &[u8]) -> DecodeResult<StagedUpload> {
    // The boundary token is everything before the first line terminator.
    let boundary_end = find(body, CRLF, 0).ok_or(DecodeError::MissingBoundary)?;
    if boundary_end == 0 {
        return Err(DecodeError::MissingBoundary);
    }
    let boundary = &body[..boundary_end];

    // Required attributes, in order of first appearance.
    let (owner, cursor) = quoted_attr(body, boundary_end, b"user=\"", "user")?;
    let (filename, cursor) = quoted_attr(body, cursor, b"filename=\"", "filename")?;
    let (md5, cursor) = quoted_attr(body, cursor, b"md5=\"", "md5")?;
    let (declared_size, cursor) = size_attr(body, cursor)?;

    let content_hash = ContentHash::parse(md5)?;
    validate_filename(filename)?;

    // Content runs from the first byte after the blank line following the
    // headers up to the closing boundary, minus the trailing CRLF.
    let content_start =
        find(body, HEADER_END, cursor).ok_or(DecodeError::UnterminatedContent)? + HEADER_END.len();
    let closing = find(body, boundary, content_start).ok_or(DecodeError::UnterminatedContent)?;
    if closing < content_start + CRLF.len() {
        return Err(DecodeError::UnterminatedContent);
    }
    let content_end = closing - CRLF.len();

    Ok(StagedUpload {
        owner: owner.to_string(),
        filename: filename.to_string(),
        content_hash,
        declared_size,
        content: body[content_start..content_end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "------WebKitFormBoundary88asdgewtgewx";
    const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

    fn build_body(user: &str, filename: &str, md5: &str, size: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(BOUNDARY.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; user=\"{user}\"; filename=\"{filename}\"; md5=\"{md5}\"; size={size}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n");
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(BOUNDARY.as_bytes());
        body
    }

    #[test]
    fn decodes_complete_body() {
        let body = build_body("mike", "photo.jpg", EMPTY_MD5, "11", b"hello world");
        let upload = decode_upload(&body).unwrap();
        assert_eq!(upload.owner, "mike");
        assert_eq!(upload.filename, "photo.jpg");
        assert_eq!(upload.content_hash.as_str(), EMPTY_MD5);
        assert_eq!(upload.declared_size, 11);
        assert_eq!(upload.content, b"hello world");
    }

    #[test]
    fn decodes_empty_content() {
        let body = build_body("alice", "a.txt", EMPTY_MD5, "0", b"");
        let upload = decode_upload(&body).unwrap();
        assert_eq!(upload.declared_size, 0);
        assert!(upload.content.is_empty());
    }

    #[test]
    fn decodes_binary_content_with_crlf_bytes() {
        let content = b"\x00\x01\r\n\x02binary\r\n\x03";
        let body = build_body("mike", "blob.bin", EMPTY_MD5, "13", content);
        let upload = decode_upload(&body).unwrap();
        assert_eq!(upload.content, content);
    }

    #[test]
    fn trims_attribute_whitespace() {
        let body = build_body(" mike ", "  a.txt ", EMPTY_MD5, " 7 ", b"content");
        let upload = decode_upload(&body).unwrap();
        assert_eq!(upload.owner, "mike");
        assert_eq!(upload.filename, "a.txt");
        assert_eq!(upload.declared_size, 7);
    }

    #[test]
    fn tolerates_quoted_size() {
        let body = build_body("mike", "a.txt", EMPTY_MD5, "\"42\"", b"x");
        let upload = decode_upload(&body).unwrap();
        assert_eq!(upload.declared_size, 42);
    }

    #[test]
    fn rejects_body_without_boundary() {
        assert!(matches!(
            decode_upload(b"no line terminator anywhere"),
            Err(DecodeError::MissingBoundary)
        ));
        assert!(matches!(
            decode_upload(b""),
            Err(DecodeError::MissingBoundary)
        ));
    }

    #[test]
    fn rejects_missing_md5_marker() {
        let body = build_body("mike", "a.txt", EMPTY_MD5, "3", b"abc");
        let stripped = String::from_utf8(body)
            .unwrap()
            .replace(&format!("md5=\"{EMPTY_MD5}\"; "), "");
        assert!(matches!(
            decode_upload(stripped.as_bytes()),
            Err(DecodeError::MissingField("md5"))
        ));
    }

    #[test]
    fn rejects_missing_user_marker() {
        let body = format!(
            "{BOUNDARY}\r\nContent-Disposition: form-data; filename=\"a.txt\"; md5=\"{EMPTY_MD5}\"; size=3\r\n\r\nabc\r\n{BOUNDARY}"
        );
        assert!(matches!(
            decode_upload(body.as_bytes()),
            Err(DecodeError::MissingField("user"))
        ));
    }

    #[test]
    fn rejects_missing_closing_boundary() {
        let mut body = Vec::new();
        body.extend_from_slice(BOUNDARY.as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; user=\"m\"; filename=\"a.txt\"; md5=\"{EMPTY_MD5}\"; size=3\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"\r\n\r\n");
        body.extend_from_slice(b"abc");
        assert!(matches!(
            decode_upload(&body),
            Err(DecodeError::UnterminatedContent)
        ));
    }

    #[test]
    fn rejects_invalid_hash() {
        let body = build_body("mike", "a.txt", "nothex", "3", b"abc");
        assert!(matches!(
            decode_upload(&body),
            Err(DecodeError::InvalidContentHash(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_size() {
        let body = build_body("mike", "a.txt", EMPTY_MD5, "lots", b"abc");
        assert!(matches!(
            decode_upload(&body),
            Err(DecodeError::InvalidSize(_))
        ));
    }

    #[test]
    fn rejects_path_traversal_filename() {
        for name in ["../../etc/passwd", "a/b.txt", "..", "c:\\windows\\x"] {
            let body = build_body("mike", name, EMPTY_MD5, "3", b"abc");
            assert!(
                matches!(decode_upload(&body), Err(DecodeError::UnsafeFilename(_))),
                "filename {name:?} should be rejected"
            );
        }
    }
}

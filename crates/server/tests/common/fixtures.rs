//! Wire-format fixtures for upload and dedup requests.
//!
//! Note: #[allow(dead_code)] because each test file compiles common/
//! separately and not every file uses every fixture.

/// MD5 of the empty string.
#[allow(dead_code)]
pub const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";

/// MD5 of "The quick brown fox jumps over the lazy dog".
#[allow(dead_code)]
pub const FOX_MD5: &str = "9e107d9d372bb6826bd81d3542a419d6";

const BOUNDARY: &str = "------WebKitFormBoundary88asdgewtgewx";

/// Build a raw multipart upload body exactly as the upstream web client
/// sends it.
#[allow(dead_code)]
pub fn multipart_body(user: &str, filename: &str, md5: &str, size: u64, content: &[u8]) -> Vec<u8> {
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

/// The same body with the `md5="..."` attribute removed.
#[allow(dead_code)]
pub fn multipart_body_without_md5(user: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let body = multipart_body(user, filename, EMPTY_MD5, content.len() as u64, content);
    String::from_utf8(body)
        .unwrap()
        .replace(&format!("md5=\"{EMPTY_MD5}\"; "), "")
        .into_bytes()
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Part {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// Parses every part of a multipart body. Parts without a header block
/// (preamble, closing delimiter) are dropped.
pub fn parse_multipart(body: &[u8], boundary: &str) -> Vec<Part> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";
    let mut parts = Vec::new();

    for raw in split_on(body, delimiter.as_bytes()) {
        let sep_pos = match find_subsequence(raw, sep) {
            Some(pos) => pos,
            None => continue,
        };
        let headers = String::from_utf8_lossy(&raw[..sep_pos]);
        let data = &raw[sep_pos + sep.len()..];
        let data = data.strip_suffix(b"\r\n").unwrap_or(data);

        let mut part = Part { data: data.to_vec(), ..Part::default() };
        for line in headers.lines() {
            let (key, value) = match line.split_once(':') {
                Some(kv) => kv,
                None => continue,
            };
            if key.trim().eq_ignore_ascii_case("content-disposition") {
                part.name = disposition_param(value, "name");
                part.filename = disposition_param(value, "filename");
            } else if key.trim().eq_ignore_ascii_case("content-type") {
                part.content_type = Some(value.trim().to_ascii_lowercase());
            }
        }
        parts.push(part);
    }
    parts
}

/// Reads `key=value` or `key="value"` from a Content-Disposition header value.
fn disposition_param(value: &str, key: &str) -> Option<String> {
    value.split(';')
        .map(|s| s.trim())
        .filter_map(|s| s.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().trim_matches('"').to_owned())
}

/// The first part carrying a file.
pub fn first_file(parts: &[Part]) -> Option<&Part> {
    parts.iter().find(|p| p.is_file())
}

/// Value of a named plain-text (non-file) field.
pub fn text_field<'a>(parts: &'a [Part], name: &str) -> Option<&'a str> {
    parts.iter()
        .filter(|p| !p.is_file())
        .find(|p| p.name.as_deref() == Some(name))
        .and_then(|p| std::str::from_utf8(&p.data).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"--XYZ\r\n");
        b.extend_from_slice(b"Content-Disposition: form-data; name=\"blur_parameter\"\r\n\r\n");
        b.extend_from_slice(b"0.75\r\n");
        b.extend_from_slice(b"--XYZ\r\n");
        b.extend_from_slice(b"Content-Disposition: form-data; name=\"file\"; filename=\"data.zip\"\r\n");
        b.extend_from_slice(b"Content-Type: application/zip\r\n\r\n");
        b.extend_from_slice(b"PK\x03\x04\r\n\r\nbinary");
        b.extend_from_slice(b"\r\n--XYZ--\r\n");
        b
    }

    #[test]
    fn boundary_is_read_from_content_type() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"XYZ\"").as_deref(),
            Some("XYZ")
        );
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn parts_are_split_with_their_headers() {
        let parts = parse_multipart(&body(), "XYZ");
        assert_eq!(parts.len(), 2);

        assert_eq!(text_field(&parts, "blur_parameter"), Some("0.75"));

        let file = first_file(&parts).unwrap();
        assert_eq!(file.name.as_deref(), Some("file"));
        assert_eq!(file.filename.as_deref(), Some("data.zip"));
        assert_eq!(file.content_type.as_deref(), Some("application/zip"));
        assert_eq!(file.data, b"PK\x03\x04\r\n\r\nbinary");
    }

    #[test]
    fn file_parts_are_not_text_fields() {
        let parts = parse_multipart(&body(), "XYZ");
        assert_eq!(text_field(&parts, "file"), None);
    }
}

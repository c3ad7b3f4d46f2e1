use encoding_rs::Encoding;
use regex::Regex;
use std::sync::LazyLock;

static HEADER_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>]+)"#).unwrap());

/// Decode a fetched body to UTF-8.
///
/// Honors an explicit charset label from the Content-Type header or a
/// `<meta charset>` tag in the first 4KB; anything unlabeled or unknown is
/// decoded as UTF-8 with replacement characters. The page is scored on
/// textual heuristics, so a lossy decode is preferable to failing the fetch.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = labeled_encoding(bytes, content_type).unwrap_or(encoding_rs::UTF_8);
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}

fn labeled_encoding(bytes: &[u8], content_type: Option<&str>) -> Option<&'static Encoding> {
    if let Some(header) = content_type
        && let Some(captures) = HEADER_CHARSET_REGEX.captures(header)
        && let Some(label) = captures.get(1)
        && let Some(encoding) = Encoding::for_label(label.as_str().as_bytes())
    {
        return Some(encoding);
    }

    let head = &bytes[..bytes.len().min(4096)];
    let head_str = String::from_utf8_lossy(head);
    if let Some(captures) = META_CHARSET_REGEX.captures(&head_str)
        && let Some(label) = captures.get(1)
        && let Some(encoding) = Encoding::for_label(label.as_str().as_bytes())
    {
        return Some(encoding);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8_without_label() {
        let body = "Hello, 世界!".as_bytes();
        assert_eq!(decode_body(body, None), "Hello, 世界!");
    }

    #[test]
    fn honors_header_charset() {
        // "café" in windows-1252: e9 for é
        let body = b"caf\xe9";
        let decoded = decode_body(body, Some("text/html; charset=windows-1252"));
        assert_eq!(decoded, "café");
    }

    #[test]
    fn honors_meta_charset() {
        let mut body = b"<html><head><meta charset=\"windows-1252\"></head><body>caf\xe9</body>".to_vec();
        body.extend_from_slice(b"</html>");
        let decoded = decode_body(&body, Some("text/html"));
        assert!(decoded.contains("café"));
    }

    #[test]
    fn unknown_label_falls_back_to_lossy_utf8() {
        let body = b"ok \xff bytes";
        let decoded = decode_body(body, Some("text/html; charset=not-a-charset"));
        assert!(decoded.starts_with("ok "));
        assert!(decoded.contains('\u{FFFD}'));
    }
}

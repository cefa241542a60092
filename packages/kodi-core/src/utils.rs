//! General utilities shared across the application.

use std::time::{SystemTime, UNIX_EPOCH};

use quick_xml::events::BytesStart;

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Path Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the protocol of a path (`"http"` for `http://host/a.mp3`).
///
/// Plain filesystem paths have no protocol.
#[must_use]
pub fn protocol(path: &str) -> Option<String> {
    let (scheme, _) = path.split_once("://")?;
    if scheme.is_empty() || !scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+') {
        return None;
    }
    Some(scheme.to_ascii_lowercase())
}

/// Returns the lowercase extension of a path or URL, without the dot.
///
/// Query strings and fragments of URLs are ignored.
#[must_use]
pub fn extension(path: &str) -> Option<String> {
    let without_query = path.split(['?', '#']).next().unwrap_or(path);
    let file_name = without_query
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(without_query);
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Returns true for paths served over a network stream protocol.
#[must_use]
pub fn is_internet_stream(path: &str) -> bool {
    matches!(
        protocol(path).as_deref(),
        Some("http" | "https" | "rtmp" | "rtsp" | "mms" | "udp")
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// XML Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns an attribute value of an XML element, unescaped.
pub fn xml_attr(elem: &BytesStart, attr_name: &[u8]) -> Option<String> {
    elem.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == attr_name)
        .map(|a| {
            let raw = String::from_utf8_lossy(&a.value).to_string();
            quick_xml::escape::unescape(&raw)
                .map(|v| v.into_owned())
                .unwrap_or(raw)
        })
}

/// Parses an XML boolean attribute (`true`/`false`/`1`/`0`).
pub fn parse_xml_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_ignores_query_and_case() {
        assert_eq!(extension("/media/Movie.MKV").as_deref(), Some("mkv"));
        assert_eq!(
            extension("http://host/stream.mp3?token=a.b").as_deref(),
            Some("mp3")
        );
        assert_eq!(extension("/media/.hidden"), None);
        assert_eq!(extension("/media/folder/"), None);
    }

    #[test]
    fn protocol_detection() {
        assert_eq!(protocol("smb://nas/share").as_deref(), Some("smb"));
        assert_eq!(protocol("/home/user/a.mp3"), None);
        assert!(is_internet_stream("https://radio.example/live"));
        assert!(!is_internet_stream("nfs://server/export/a.mkv"));
    }
}

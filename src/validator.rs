//! Syntactic URL checks run before any network or process work.

use crate::CaptureError;
use url::Url;

/// Returns true when `raw` parses as an absolute URL with both a scheme and a host.
///
/// No DNS lookups or network access happen here.
pub fn is_valid_url(raw: &str) -> bool {
    parse_absolute(raw).is_some()
}

/// Parse a capture target, restricted to the schemes the engines can fetch.
pub fn parse_target(raw: &str) -> Result<Url, CaptureError> {
    let url = parse_absolute(raw)
        .ok_or_else(|| CaptureError::invalid_input("Invalid URL provided."))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(CaptureError::invalid_input(format!(
            "Unsupported URL scheme '{other}'"
        ))),
    }
}

fn parse_absolute(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() || has_malformed_percent_encoding(raw) {
        return None;
    }

    let url = Url::parse(raw).ok()?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

// The url crate passes stray '%' through untouched, so check escapes ourselves.
fn has_malformed_percent_encoding(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                return true;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    false
}

/// Host of a URL string, if any. Used for log fields.
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
}

//! Domain normalization for identity resolution across slices.
//!
//! ## Canonical Domain Form
//!
//! Every raw vertex string (a URL, a hostname, or a dotted reversed-label
//! string) is mapped to its canonical form before it is used as a merge key:
//!
//! ```text
//! canonical(raw) = lower(trim(strip_dot(strip_port(strip_www(host(raw))))))
//! ```
//!
//! Where:
//! - `host`: if the string contains `://`, parse it as a URL and keep the hostname
//! - `strip_www`: drop one leading `www.`
//! - `strip_port`: drop a trailing `:<digits>`
//! - `strip_dot`: drop trailing `.` characters
//!
//! Normalization is pure and total. Any input yields some output; if nothing
//! structural is recognized the trimmed, lowercased input is returned.

use url::Url;

const SCHEME_SEPARATOR: &str = "://";
const WWW_PREFIX: &str = "www.";

/// Normalize a raw domain, hostname or URL to its canonical domain.
///
/// # Example
///
/// ```rust
/// use temporal_webgraph::normalize::normalize_domain;
///
/// assert_eq!(normalize_domain("HTTP://WWW.Example.COM:80/x"), "example.com");
/// assert_eq!(normalize_domain("example.com"), "example.com");
/// ```
pub fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let host = if lowered.contains(SCHEME_SEPARATOR) {
        extract_host(&lowered)
    } else {
        lowered.clone()
    };

    let host = host.strip_prefix(WWW_PREFIX).unwrap_or(&host);
    let host = strip_port(host);
    let host = host.trim_end_matches('.').trim();

    if host.is_empty() {
        lowered
    } else {
        host.to_string()
    }
}

/// Hostname of a URL-like string, falling back to the raw authority section
/// when the URL parser rejects it.
fn extract_host(lowered: &str) -> String {
    if let Ok(url) = Url::parse(lowered) {
        if let Some(host) = url.host_str() {
            if !host.is_empty() {
                return host.to_string();
            }
        }
    }

    let after_scheme = lowered
        .split_once(SCHEME_SEPARATOR)
        .map(|(_, rest)| rest)
        .unwrap_or(lowered);
    let authority = after_scheme
        .split(|c| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or(after_scheme);
    let authority = authority
        .rsplit_once('@')
        .map(|(_, host)| host)
        .unwrap_or(authority);
    authority.to_string()
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// Reverse the dot-separated labels of a domain (`nasa.gov` → `gov.nasa`).
pub fn reverse_labels(domain: &str) -> String {
    domain.split('.').rev().collect::<Vec<_>>().join(".")
}

/// Suffixes of a domain with at least two labels, longest first.
///
/// `a.b.example.co` yields `a.b.example.co`, `b.example.co`, `example.co`.
/// A single-label domain yields itself.
pub fn registrable_suffixes(domain: &str) -> Vec<&str> {
    let mut suffixes = vec![domain];
    let mut rest = domain;
    while let Some((_, tail)) = rest.split_once('.') {
        if !tail.contains('.') {
            break;
        }
        suffixes.push(tail);
        rest = tail;
    }
    suffixes
}

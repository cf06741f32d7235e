//! Shared URL/form parsing and HTML helpers for route handlers.

/// Parse URL-encoded pairs (`key=value&key2=value2`), decoding both sides.
/// A leading `?` is ignored, so this serves query strings and form bodies.
pub fn parse_params(input: &str) -> Vec<(String, String)> {
    let input = input.strip_prefix('?').unwrap_or(input);
    if input.is_empty() {
        return Vec::new();
    }
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, val) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(val))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. `+` is a space; malformed escapes
/// pass through unchanged. Invalid UTF-8 is replaced, not rejected.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            if let Some(v) = bytes.get(i + 1..i + 3).and_then(|h| hex_pair(h[0], h[1])) {
                out.push(v);
                i += 3;
                continue;
            }
        }
        out.push(if b == b'+' { b' ' } else { b });
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_pair(hi: u8, lo: u8) -> Option<u8> {
    let hi = (hi as char).to_digit(16)?;
    let lo = (lo as char).to_digit(16)?;
    Some((hi * 16 + lo) as u8)
}

/// Percent-encode everything outside the unreserved set, for building
/// `hx-get` URLs that carry lookup keys (`|` and `=`).
pub fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 3);
    for b in input.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// First value for `key`.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Every value for `key`, accepting both `key=` and `key[]=` spellings.
pub fn get_params<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
    let bracket = format!("{}[]", key);
    params
        .iter()
        .filter(|(k, _)| k == key || *k == bracket)
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Escape text for interpolation into HTML.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Red error line used by every handler.
pub fn error_fragment(message: &str) -> String {
    format!(
        r#"<span class="text-red-600">{}</span>"#,
        escape_html(message)
    )
}

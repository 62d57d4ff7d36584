//! Parameter percent-encoding.
//!
//! Everything outside the RFC 3986 unreserved set is escaped as `%XX`
//! (upper case), so space becomes `%20`, never `+`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::request::types::Params;

/// Characters left as-is: `A-Z a-z 0-9 - _ . ~`.
pub const YOP_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single key or value.
pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, YOP_ENCODE_SET).to_string()
}

/// Encode parameters as `k=v&k=v`, keys sorted, one pair per value in caller order.
///
/// Used for form bodies and query strings.
pub fn encode_params(params: &Params) -> String {
    let mut out = String::new();
    for (key, values) in params {
        let key = percent_encode(key);
        for value in values {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&key);
            out.push('=');
            out.push_str(&percent_encode(value));
        }
    }
    out
}

/// Canonical form for signing: encoded pairs sorted by key, then by value.
pub fn canonical_params(params: &Params) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .flat_map(|(k, vs)| {
            let key = percent_encode(k);
            vs.iter().map(move |v| (key.clone(), percent_encode(v)))
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

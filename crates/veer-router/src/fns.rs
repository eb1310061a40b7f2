//! Path and query utilities
//!
//! Base stripping is a plain first-occurrence substring removal, not a
//! prefix-anchored match. A base that also occurs later in the path is
//! removed wherever it first appears; callers depend on that exact
//! behavior, so it is kept and pinned by tests.

use indexmap::IndexMap;
use percent_encoding::percent_decode_str;

/// Insertion-order-preserving mapping of capture or query keys to
/// decoded values. `None` marks a key that appeared without a value.
pub type Params = IndexMap<String, Option<String>>;

/// Strip `base` from `canonical_path` and drop the query string.
/// An empty result after stripping becomes `"/"`.
pub fn extract_path(base: &str, canonical_path: &str) -> String {
    let stripped = if base.is_empty() {
        canonical_path.to_string()
    } else {
        canonical_path.replacen(base, "", 1)
    };
    let path = if stripped.is_empty() {
        "/".to_string()
    } else {
        stripped
    };
    match path.find('?') {
        Some(i) => path[..i].to_string(),
        None => path,
    }
}

/// Raw substring after the first `?`, or `""` when there is none.
pub fn extract_query_string(path: &str) -> String {
    match path.find('?') {
        Some(i) => path[i + 1..].to_string(),
        None => String::new(),
    }
}

/// Parse the query portion of `path` into a [`Params`] map.
///
/// Pairs split on the first `=`; a key with no `=` maps to `None`.
/// Keys are stored raw, values are decoded. Later duplicate keys
/// overwrite earlier ones while keeping the original insertion
/// position.
pub fn extract_query_params(path: &str) -> Params {
    let mut params = Params::new();
    let Some(i) = path.find('?') else {
        return params;
    };
    let query = &path[i + 1..];
    if query.is_empty() {
        return params;
    }

    for pair in query.split('&') {
        let (key, value) = match pair.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (pair, None),
        };
        params.insert(key.to_string(), value.map(decode_url_component));
    }

    params
}

/// Decode an `application/x-www-form-urlencoded` component: `+` maps
/// to space, then percent sequences are decoded. Malformed input never
/// fails the caller; invalid UTF-8 is decoded lossily and logged.
pub fn decode_url_component(value: &str) -> String {
    let unplussed = value.replace('+', " ");
    decode_lossy(&unplussed, value)
}

/// Percent-decode a path component. Unlike [`decode_url_component`],
/// `+` is left alone, matching plain URI decoding.
pub fn decode_uri(value: &str) -> String {
    decode_lossy(value, value)
}

fn decode_lossy(input: &str, original: &str) -> String {
    match percent_decode_str(input).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(error) => {
            tracing::warn!(value = %original, %error, "malformed percent-encoding, decoding lossily");
            percent_decode_str(input).decode_utf8_lossy().into_owned()
        }
    }
}

//! Deep link decoding

use percent_encoding::percent_decode_str;

/// Extract the pairing URI carried in the `uri` query parameter.
///
/// Accepts both `neon3://?uri=...` and the bare `neon3://uri=...` form.
/// The parameter value is percent-decoded; reserved characters inside it
/// stay escaped in the raw link, so splitting on `&` is safe.
pub fn decode_deep_link(link: &str) -> Option<String> {
    let link = link.trim();
    let query = match link.split_once('?') {
        Some((_, query)) => query,
        None => link.split_once("://").map(|(_, rest)| rest).unwrap_or(link),
    };

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "uri")
        .and_then(|(_, value)| percent_decode_str(value).decode_utf8().ok())
        .map(|value| value.into_owned())
        .filter(|value| !value.is_empty())
}

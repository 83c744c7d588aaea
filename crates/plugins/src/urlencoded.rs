//! `key=value&key=value` pair parsing shared by the query parser and the form decoder.

use micro_request::Query;

/// The number of pairs considered when no `parameterLimit` is configured.
pub const DEFAULT_MAX_KEYS: usize = 1000;

/// Parses `&` separated pairs, each split on its first `=`.
///
/// Keys and values are percent-decoded with `+` read as a space, a pair without `=`
/// gets an empty value and repeated keys aggregate in order of appearance. Only the
/// first `max_keys` pairs are considered; `0` disables the bound.
pub(crate) fn parse_pairs(input: &[u8], max_keys: usize) -> Result<Query, serde_urlencoded::de::Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(truncate_pairs(input, max_keys))?;
    Ok(pairs.into_iter().collect())
}

fn truncate_pairs(input: &[u8], max_keys: usize) -> &[u8] {
    if max_keys == 0 {
        return input;
    }

    input
        .iter()
        .enumerate()
        .filter(|(_, byte)| **byte == b'&')
        .nth(max_keys - 1)
        .map_or(input, |(index, _)| &input[..index])
}

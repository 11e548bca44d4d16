//! Manifest normalization and digest
//!
//! The second line of a fetched result set changes between fetches of the same
//! content (generation date, query id). It is replaced with a fixed line before
//! hashing so the digest only tracks real content changes.

/// Line substituted for the volatile second line
pub const NORMALIZED_SECOND_LINE: &[u8] = b"<ResultSet>";

/// Replace line 1 (0-based) with `<ResultSet>` and strip trailing whitespace.
///
/// Lines are split on `\n` only and rejoined with `\n`. A document with a
/// single line has nothing to replace and is only stripped.
pub fn normalize(data: &[u8]) -> Vec<u8> {
    let mut normalized = Vec::with_capacity(data.len());

    for (index, line) in data.split(|&b| b == b'\n').enumerate() {
        if index > 0 {
            normalized.push(b'\n');
        }
        if index == 1 {
            normalized.extend_from_slice(NORMALIZED_SECOND_LINE);
        } else {
            normalized.extend_from_slice(line);
        }
    }

    let end = normalized
        .iter()
        .rposition(|&b| !is_strippable(b))
        .map_or(0, |i| i + 1);
    normalized.truncate(end);
    normalized
}

/// Lowercase hex MD5 of `data`
pub fn digest_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

// ASCII whitespace including vertical tab
fn is_strippable(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

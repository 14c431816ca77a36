//! Canonical textual form of principal identities.
//!
//! Wire form is an opaque byte string; the canonical text form is the
//! lowercase base32 encoding of `crc32(bytes) ++ bytes`, split into
//! dash-separated groups of five characters. The decoder is strict: bad
//! characters, bad grouping, and checksum mismatches all fail explicitly.

use thiserror::Error;

const B32_ALPHABET: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";
const GROUP_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrincipalTextError {
    #[error("principal text contains invalid character `{0}`")]
    InvalidCharacter(char),
    #[error("principal text is not grouped in dash-separated blocks of five")]
    BadGrouping,
    #[error("principal text checksum mismatch")]
    ChecksumMismatch,
    #[error("principal text too short to carry a checksum")]
    TooShort,
}

/// Encode raw principal bytes into canonical text.
pub fn to_text(bytes: &[u8]) -> String {
    let mut payload = Vec::with_capacity(bytes.len() + 4);
    payload.extend_from_slice(&crc32fast::hash(bytes).to_be_bytes());
    payload.extend_from_slice(bytes);

    let encoded = base32_encode(&payload);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / GROUP_LEN);
    for (i, ch) in encoded.chars().enumerate() {
        if i > 0 && i % GROUP_LEN == 0 {
            out.push('-');
        }
        out.push(ch);
    }
    out
}

/// Decode canonical text back into raw principal bytes, verifying the
/// checksum and the grouping.
pub fn from_text(text: &str) -> Result<Vec<u8>, PrincipalTextError> {
    let mut compact = String::with_capacity(text.len());
    for (i, group) in text.split('-').enumerate() {
        // every group is exactly five chars except the last, which may be shorter
        if i > 0 && compact.len() % GROUP_LEN != 0 {
            return Err(PrincipalTextError::BadGrouping);
        }
        if group.is_empty() || group.len() > GROUP_LEN {
            return Err(PrincipalTextError::BadGrouping);
        }
        compact.push_str(group);
    }

    let payload = base32_decode(&compact)?;
    if payload.len() < 4 {
        return Err(PrincipalTextError::TooShort);
    }
    let (crc, bytes) = payload.split_at(4);
    if crc != crc32fast::hash(bytes).to_be_bytes() {
        return Err(PrincipalTextError::ChecksumMismatch);
    }
    Ok(bytes.to_vec())
}

pub fn is_valid_text(text: &str) -> bool {
    from_text(text).is_ok()
}

fn base32_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(5) * 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        acc = (acc << 8) | byte as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(B32_ALPHABET[((acc >> bits) & 31) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(B32_ALPHABET[((acc << (5 - bits)) & 31) as usize] as char);
    }
    out
}

fn base32_decode(text: &str) -> Result<Vec<u8>, PrincipalTextError> {
    let mut out = Vec::with_capacity(text.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for ch in text.chars() {
        let v = match ch {
            'a'..='z' => ch as u32 - 'a' as u32,
            'A'..='Z' => ch as u32 - 'A' as u32,
            '2'..='7' => ch as u32 - '2' as u32 + 26,
            other => return Err(PrincipalTextError::InvalidCharacter(other)),
        };
        acc = (acc << 5) | v;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
    }
    Ok(out)
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_raw_bytes() {
        for bytes in [
            vec![],
            vec![0u8],
            vec![1, 2, 3, 4, 5],
            (0u8..29).collect::<Vec<_>>(),
        ] {
            let text = to_text(&bytes);
            assert_eq!(from_text(&text).as_deref(), Ok(bytes.as_slice()), "{text}");
        }
    }

    #[test]
    fn management_identity_is_aaaaa_aa() {
        // the empty byte string is the well-known management identity
        assert_eq!(to_text(&[]), "aaaaa-aa");
        assert_eq!(from_text("aaaaa-aa"), Ok(vec![]));
    }

    #[test]
    fn corrupted_text_fails_the_checksum() {
        let text = to_text(&[1, 2, 3, 4]);
        // flip the leading character: that is checksum territory
        let mut corrupted: Vec<char> = text.chars().collect();
        corrupted[0] = if corrupted[0] == 'a' { 'b' } else { 'a' };
        let corrupted: String = corrupted.into_iter().collect();
        assert_eq!(
            from_text(&corrupted),
            Err(PrincipalTextError::ChecksumMismatch)
        );
    }

    #[test]
    fn bad_grouping_and_bad_characters_are_rejected() {
        assert_eq!(from_text("aaaaaaa-a"), Err(PrincipalTextError::BadGrouping));
        assert_eq!(
            from_text("aaa!a-aa"),
            Err(PrincipalTextError::InvalidCharacter('!'))
        );
        assert!(matches!(from_text("aa"), Err(_)));
    }
}

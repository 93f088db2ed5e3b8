//! Base64url helpers shared by every material type.
//!
//! CESR uses the RFC 4648 URL-safe alphabet without padding. Integers inside
//! codes (soft sizes, indices, counts) are written big-endian, one sextet per
//! character.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::{CesrError, Result};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Encode bytes with the URL-safe alphabet, no padding.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode URL-safe base64 text, no padding.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    check_chars(text)?;
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| CesrError::MalformedText(e.to_string()))
}

/// Value of a single base64url character.
pub fn char_value(c: char) -> Result<u64> {
    match c {
        'A'..='Z' => Ok(c as u64 - 'A' as u64),
        'a'..='z' => Ok(c as u64 - 'a' as u64 + 26),
        '0'..='9' => Ok(c as u64 - '0' as u64 + 52),
        '-' => Ok(62),
        '_' => Ok(63),
        _ => Err(CesrError::InvalidBase64(c)),
    }
}

/// Reject anything outside the URL-safe alphabet.
pub fn check_chars(text: &str) -> Result<()> {
    for c in text.chars() {
        char_value(c)?;
    }
    Ok(())
}

/// Convert a base64url string to an integer.
pub fn b64_to_int(text: &str) -> Result<u64> {
    if text.len() > 10 {
        return Err(CesrError::MalformedText(format!(
            "integer field {text:?} too wide"
        )));
    }
    text.chars()
        .try_fold(0u64, |acc, c| Ok((acc << 6) | char_value(c)?))
}

/// Convert an integer to a base64url string of exactly `len` characters.
///
/// Returns `None` when the value does not fit.
pub fn int_to_b64(value: u64, len: usize) -> Option<String> {
    if len < 11 && value > max_for(len) {
        return None;
    }
    let mut out = vec![b'A'; len];
    let mut v = value;
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(v & 0x3f) as usize];
        v >>= 6;
    }
    Some(String::from_utf8_lossy(&out).into_owned())
}

/// Largest integer representable in `len` base64 characters.
pub fn max_for(len: usize) -> u64 {
    if len >= 11 {
        u64::MAX
    } else {
        (1u64 << (6 * len)) - 1
    }
}

/// Render the first `chars` sextets of a binary stream as text.
///
/// Used to sniff codes out of the binary domain.
pub fn sniff_b2(qb2: &[u8], chars: usize) -> Result<String> {
    let nbytes = chars.div_ceil(4) * 3;
    if qb2.len() < nbytes {
        return Err(CesrError::Shortage {
            needed: nbytes - qb2.len(),
        });
    }
    let text = encode(&qb2[..nbytes]);
    Ok(text[..chars].to_string())
}

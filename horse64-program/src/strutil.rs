//! UTF-8 ↔ UTF-32 conversion with surrogate-pair byte escaping.
//!
//! Horse64 strings are UTF-32 code-unit buffers so that invalid UTF-8
//! input can still round-trip: each offending byte `b` is encoded as
//! the surrogate-range code point `0xDC80 + b`. Surrogate code points
//! are not valid Unicode scalar values, so [`crate::value::Utf32Buf`]
//! is `Vec<u32>` rather than `Vec<char>` --- this module is the only
//! place that needs to reason about the surrogate range directly.

use thiserror::Error;

use crate::value::Utf32Buf;

const SURROGATE_ESCAPE_BASE: u32 = 0xDC80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid UTF-8 byte sequence at offset {offset}")]
    InvalidEncoding { offset: usize },
}

/// Decodes `bytes` as UTF-8 into UTF-32 code units. With
/// `surrogate_escape`, invalid bytes are individually mapped to
/// `0xDC80 + byte` instead of failing the whole decode.
pub fn utf8_to_utf32(bytes: &[u8], surrogate_escape: bool) -> Result<Utf32Buf, DecodeError> {
    let mut out = Utf32Buf::new();
    let mut i = 0;

    while i < bytes.len() {
        match decode_one(&bytes[i..]) {
            Some((cp, len)) => {
                out.push(cp);
                i += len;
            }
            None => {
                if surrogate_escape {
                    out.push(SURROGATE_ESCAPE_BASE + bytes[i] as u32);
                    i += 1;
                } else {
                    return Err(DecodeError::InvalidEncoding { offset: i });
                }
            }
        }
    }

    Ok(out)
}

/// Encodes UTF-32 code units back to UTF-8 bytes, reversing escaped
/// surrogate code points back to their original raw byte.
pub fn utf32_to_utf8(units: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(units.len());

    for &cp in units {
        if (SURROGATE_ESCAPE_BASE..SURROGATE_ESCAPE_BASE + 0x100).contains(&cp) {
            out.push((cp - SURROGATE_ESCAPE_BASE) as u8);
        } else if let Some(ch) = char::from_u32(cp) {
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        } else {
            // Not produced by utf8_to_utf32, but keep the function
            // total rather than panicking on hand-built buffers.
            out.extend_from_slice("\u{FFFD}".as_bytes());
        }
    }

    out
}

/// Decodes a single UTF-8 scalar value at the start of `bytes`,
/// returning its code point and byte length. `None` means the lead
/// byte (and however many continuation bytes validate) does not form
/// a valid encoding, so the caller should escape exactly one byte and
/// retry.
fn decode_one(bytes: &[u8]) -> Option<(u32, usize)> {
    let b0 = bytes[0];

    let (len, mut cp) = if b0 & 0x80 == 0 {
        return Some((b0 as u32, 1));
    } else if b0 & 0xE0 == 0xC0 {
        (2, (b0 & 0x1F) as u32)
    } else if b0 & 0xF0 == 0xE0 {
        (3, (b0 & 0x0F) as u32)
    } else if b0 & 0xF8 == 0xF0 {
        (4, (b0 & 0x07) as u32)
    } else {
        return None;
    };

    if bytes.len() < len {
        return None;
    }

    for &cont in &bytes[1..len] {
        if cont & 0xC0 != 0x80 {
            return None;
        }
        cp = (cp << 6) | (cont & 0x3F) as u32;
    }

    // Reject overlong encodings and surrogate code points smuggled in
    // through UTF-8, matching `std::str::from_utf8`'s notion of valid.
    let min = match len {
        2 => 0x80,
        3 => 0x800,
        4 => 0x10000,
        _ => 0,
    };
    if cp < min || cp > 0x10FFFF || (0xD800..=0xDFFF).contains(&cp) {
        return None;
    }

    Some((cp, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        let units = utf8_to_utf32(b"hello", true).unwrap();
        assert_eq!(utf32_to_utf8(&units), b"hello");
    }

    #[test]
    fn invalid_byte_is_escaped_and_reversible() {
        let bytes = [0x68, 0xFF, 0x69];
        let units = utf8_to_utf32(&bytes, true).unwrap();
        assert_eq!(units, vec![0x68, SURROGATE_ESCAPE_BASE + 0xFF, 0x69]);
        assert_eq!(utf32_to_utf8(&units), bytes);
    }

    #[test]
    fn invalid_byte_without_escape_fails() {
        let bytes = [0xFF];
        assert_eq!(
            utf8_to_utf32(&bytes, false),
            Err(DecodeError::InvalidEncoding { offset: 0 })
        );
    }

    proptest::proptest! {
        #[test]
        fn round_trips_any_byte_sequence_with_escape(bytes in proptest::collection::vec(proptest::prelude::any::<u8>(), 0..64)) {
            let units = utf8_to_utf32(&bytes, true).unwrap();
            proptest::prop_assert_eq!(utf32_to_utf8(&units), bytes);
        }
    }
}

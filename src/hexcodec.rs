// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whitespace-tolerant hex decoding for the `data=` and `ext_data=` script fields.
//!
//! The script format allows embedded whitespace in hex strings (eg to break a
//! long payload across a continuation line), which the [`hex`] crate's strict
//! decoder rejects. This scans byte-at-a-time instead, same as the original
//! tool's `hex()` helper.

use crate::error::{Error, ErrorInt};

/// Decodes `text` as hex, skipping whitespace, into freshly allocated bytes.
///
/// An odd number of hex digits silently drops the trailing nibble, matching
/// the original tool (it only ever emits a byte once two nibbles have
/// accumulated).
pub(crate) fn decode(text: &str, line: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::with_capacity(text.len() / 2);
    let mut nibble: Option<u8> = None;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        let v = c.to_digit(16).ok_or_else(|| {
            crate::error::wrap!(ErrorInt::ScriptSyntax {
                line,
                description: format!("invalid hex digit '{c}'"),
            })
        })? as u8;
        match nibble.take() {
            None => nibble = Some(v),
            Some(hi) => out.push((hi << 4) | v),
        }
    }
    Ok(out)
}

/// Encodes `bytes` as lowercase hex with no separators, the inverse of [`decode`]
/// modulo whitespace insensitivity. Used by tests and diagnostics.
#[cfg(test)]
pub(crate) fn encode(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plain_hex() {
        assert_eq!(decode("deadbeef", 1).unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn ignores_embedded_whitespace() {
        assert_eq!(
            decode("de ad\tbe\nef", 1).unwrap(),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn rejects_non_hex() {
        assert!(decode("zz", 1).is_err());
    }

    #[test]
    fn decode_is_left_inverse_of_encode() {
        let original = vec![0x00, 0x01, 0xff, 0x7f, 0xaa];
        let encoded = encode(&original);
        assert_eq!(decode(&encoded, 1).unwrap(), original);
    }

    #[test]
    fn decode_is_left_inverse_of_encode_with_whitespace_inserted() {
        let original = vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];
        let mut encoded = encode(&original);
        encoded.insert(4, ' ');
        encoded.insert(9, '\n');
        assert_eq!(decode(&encoded, 1).unwrap(), original);
    }
}

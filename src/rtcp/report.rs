// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The 24-byte RR report block shared by RR and SR packets (§4.4).

use super::common::{num_value, syntax_error};
use crate::error::Error;
use crate::script::Node;

/// Builds one report block: `ssrc:32, fraction:8, lost:24, last_seq:32,
/// jit:32, lsr:32, dlsr:32`.
///
/// `fraction` and `lost` share one 32-bit word, `fraction` in the top byte
/// and `lost` in the low 24 bits, per RFC 3550's wire layout.
pub(crate) fn build_report_block(children: &[Node], line: usize) -> Result<[u8; 24], Error> {
    let mut ssrc: u32 = 0;
    let mut fraction: u8 = 0;
    let mut lost: u32 = 0;
    let mut last_seq: u32 = 0;
    let mut jit: u32 = 0;
    let mut lsr: u32 = 0;
    let mut dlsr: u32 = 0;

    for child in children {
        let Node::Param { name, value } = child else {
            return Err(syntax_error(line, "RR report block cannot contain a sub-list"));
        };
        match name.as_str() {
            "ssrc" => ssrc = num_value(value, name, line)? as u32,
            "fraction" => fraction = num_value(value, name, line)? as u8,
            "lost" => lost = (num_value(value, name, line)? as u32) & 0x00ff_ffff,
            "last_seq" => last_seq = num_value(value, name, line)? as u32,
            "jit" => jit = num_value(value, name, line)? as u32,
            "lsr" => lsr = num_value(value, name, line)? as u32,
            "dlsr" => dlsr = num_value(value, name, line)? as u32,
            _ => return Err(syntax_error(line, format!("unknown RR field '{name}'"))),
        }
    }

    let fraction_word = ((fraction as u32) << 24) | lost;
    let mut out = [0u8; 24];
    out[0..4].copy_from_slice(&ssrc.to_be_bytes());
    out[4..8].copy_from_slice(&fraction_word.to_be_bytes());
    out[8..12].copy_from_slice(&last_seq.to_be_bytes());
    out[12..16].copy_from_slice(&jit.to_be_bytes());
    out[16..20].copy_from_slice(&lsr.to_be_bytes());
    out[20..24].copy_from_slice(&dlsr.to_be_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script;

    #[test]
    fn fraction_in_top_byte_lost_in_low_24_bits() {
        let nodes = script::parse("(ssrc=1 fraction=128 lost=0xabcdef)", 1).unwrap();
        let children = nodes[0].children().unwrap();
        let block = build_report_block(children, 1).unwrap();
        assert_eq!(u32::from_be_bytes(block[4..8].try_into().unwrap()), 0x80ab_cdef);
    }

    #[test]
    fn zeroed_fields_default_to_zero() {
        let nodes = script::parse("(ssrc=1)", 1).unwrap();
        let children = nodes[0].children().unwrap();
        let block = build_report_block(children, 1).unwrap();
        assert_eq!(block, [0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }
}

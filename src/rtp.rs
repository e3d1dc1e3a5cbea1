// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTP data packet serializer (§4.2): a flat `name=value` token line in, one
//! bit-exact RTP packet out.
//!
//! Bit layout: `v(2)|p(1)|x(1)|cc(4) | m(1)|pt(7) | seq(16) | ts(32) | ssrc(32)
//! | csrc[0..cc] | ext? | payload`.

use bytes::{Bytes, BytesMut};
use smallvec::SmallVec;

use crate::error::{Error, ErrorInt};
use crate::hexcodec;
use crate::script::parse_c_uint;

const FIXED_HEADER_LEN: usize = 12;
const MAX_CSRC: usize = 15;

fn syntax_error(line: usize, description: impl Into<String>) -> Error {
    crate::error::wrap!(ErrorInt::ScriptSyntax {
        line,
        description: description.into(),
    })
}

fn parse_uint_value(value: Option<&str>, field: &str, line: usize) -> Result<u64, Error> {
    let v = value.ok_or_else(|| syntax_error(line, format!("field '{field}' requires a value")))?;
    parse_c_uint(v).ok_or_else(|| syntax_error(line, format!("invalid numeric value for '{field}': '{v}'")))
}

/// Builds one RTP packet from the flat token body following the `RTP` keyword.
pub(crate) fn build(text: &str, line: usize) -> Result<Bytes, Error> {
    let mut version: u8 = 2;
    let mut padding = false;
    let mut extension = false;
    let mut marker = false;
    let mut pt: u8 = 0;
    let mut seq: u16 = 0;
    let mut ts: u32 = 0;
    let mut ssrc: u32 = 0;
    let mut cc_explicit: Option<u8> = None;
    let mut csrc: SmallVec<[u32; MAX_CSRC]> = SmallVec::new();
    let mut max_csrc_idx: Option<usize> = None;
    let mut ext_type: Option<u16> = None;
    let mut ext_len_words: Option<u16> = None;
    let mut ext_data: Vec<u8> = Vec::new();
    let mut payload: Vec<u8> = Vec::new();
    let mut len_override: Option<usize> = None;
    let mut ext_pl: usize = 0;

    // Split on literal spaces only (as the original tool's `strtok(text, " ")`
    // does), not all whitespace: a `data=`/`ext_data=` value continued across
    // a tab-indented continuation line keeps its embedded tab/newline as part
    // of the same token, and the hex decoder skips over that whitespace.
    for tok in text.split(' ').filter(|s| !s.is_empty()) {
        let (name, value) = match tok.split_once('=') {
            Some((n, v)) => (n, Some(v)),
            None => (tok, None),
        };
        match name {
            "v" => version = parse_uint_value(value, name, line)? as u8,
            "p" => padding = parse_uint_value(value, name, line)? != 0,
            "x" => extension = parse_uint_value(value, name, line)? != 0,
            "m" => marker = parse_uint_value(value, name, line)? != 0,
            "cc" => cc_explicit = Some(parse_uint_value(value, name, line)? as u8),
            "pt" => pt = parse_uint_value(value, name, line)? as u8,
            "seq" => seq = parse_uint_value(value, name, line)? as u16,
            "ts" => ts = parse_uint_value(value, name, line)? as u32,
            "ssrc" => ssrc = parse_uint_value(value, name, line)? as u32,
            "ext_type" => {
                ext_type = Some(parse_uint_value(value, name, line)? as u16);
                ext_pl += 4;
            }
            "ext_len" => {
                let words = parse_uint_value(value, name, line)?;
                ext_len_words = Some(words as u16);
                ext_pl += (words as usize) * 4;
            }
            "ext_data" => {
                let v = value.ok_or_else(|| syntax_error(line, "ext_data requires a value"))?;
                ext_data = hexcodec::decode(v, line)?;
            }
            "data" => {
                let v = value.ok_or_else(|| syntax_error(line, "data requires a value"))?;
                payload = hexcodec::decode(v, line)?;
            }
            "len" => len_override = Some(parse_uint_value(value, name, line)? as usize),
            _ if name.starts_with("csrc") => {
                let k: usize = name[4..]
                    .parse()
                    .map_err(|_| syntax_error(line, format!("invalid csrc index in '{name}'")))?;
                if k >= MAX_CSRC {
                    return Err(syntax_error(
                        line,
                        format!("csrc index {k} out of range (max {})", MAX_CSRC - 1),
                    ));
                }
                if csrc.len() <= k {
                    csrc.resize(k + 1, 0);
                }
                csrc[k] = parse_uint_value(value, name, line)? as u32;
                max_csrc_idx = Some(max_csrc_idx.map_or(k, |m| m.max(k)));
            }
            "" => {}
            _ => return Err(syntax_error(line, format!("unknown RTP field '{name}'"))),
        }
    }

    let cc = cc_explicit.unwrap_or_else(|| max_csrc_idx.map_or(0, |m| m + 1) as u8);
    csrc.resize(cc as usize, 0);

    let header_len = FIXED_HEADER_LEN + 4 * cc as usize;
    let total = len_override.unwrap_or(header_len + ext_pl + payload.len());
    let scratch_len = total.max(header_len + 4 + ext_data.len());

    let mut buf = BytesMut::zeroed(scratch_len);
    buf[0] = (version << 6) | ((padding as u8) << 5) | ((extension as u8) << 4) | cc;
    buf[1] = ((marker as u8) << 7) | (pt & 0x7f);
    buf[2..4].copy_from_slice(&seq.to_be_bytes());
    buf[4..8].copy_from_slice(&ts.to_be_bytes());
    buf[8..12].copy_from_slice(&ssrc.to_be_bytes());
    for (i, id) in csrc.iter().enumerate() {
        let off = FIXED_HEADER_LEN + 4 * i;
        buf[off..off + 4].copy_from_slice(&id.to_be_bytes());
    }
    if ext_type.is_some() || ext_len_words.is_some() {
        buf[header_len..header_len + 2].copy_from_slice(&ext_type.unwrap_or(0).to_be_bytes());
        buf[header_len + 2..header_len + 4]
            .copy_from_slice(&ext_len_words.unwrap_or(0).to_be_bytes());
    }
    if !ext_data.is_empty() {
        let off = header_len + 4;
        buf[off..off + ext_data.len()].copy_from_slice(&ext_data);
    }
    if !payload.is_empty() {
        let off = header_len + ext_pl;
        buf[off..off + payload.len()].copy_from_slice(&payload);
    }
    buf.truncate(total);
    Ok(buf.freeze())
}

/// Reads the `(version, padding, extension, cc, marker, pt, seq, ts, ssrc)`
/// tuple back out of a serialized packet, for round-trip tests and debugging.
/// Mirrors the layout `build` writes; not used by the generation pipeline.
#[cfg(test)]
pub(crate) fn read_header(packet: &[u8]) -> (u8, bool, bool, u8, bool, u8, u16, u32, u32) {
    let version = packet[0] >> 6;
    let padding = (packet[0] >> 5) & 1 != 0;
    let extension = (packet[0] >> 4) & 1 != 0;
    let cc = packet[0] & 0x0f;
    let marker = (packet[1] >> 7) != 0;
    let pt = packet[1] & 0x7f;
    let seq = u16::from_be_bytes([packet[2], packet[3]]);
    let ts = u32::from_be_bytes([packet[4], packet[5], packet[6], packet[7]]);
    let ssrc = u32::from_be_bytes([packet[8], packet[9], packet[10], packet[11]]);
    (version, padding, extension, cc, marker, pt, seq, ts, ssrc)
}

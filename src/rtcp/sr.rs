// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SR (Sender Report) builder (§4.5): RR plus a 20-byte sender-info block
//! (after the sender's own SSRC) describing wall-clock/RTP time and
//! packet/octet counts.
//!
//! The script's first sub-list under `SR` carries the sender-info fields
//! (`ssrc`, `ntp`, `ts`, `psent`, `osent`); any further sub-lists are RR-style
//! report blocks, built the same way as a standalone RR packet's blocks.

use bytes::{Bytes, BytesMut};

use super::common::{num_value, params_and_blocks, syntax_error, write_common_header, HeaderOverrides, RTCP_SR};
use super::report::build_report_block;
use crate::error::Error;
use crate::ntp::NtpTimestamp;
use crate::script::Node;

const HDR_LEN: usize = 28; // common(4) + ssrc(4) + sender-info(20)
const BLOCK_LEN: usize = 24;

struct SenderInfo {
    ssrc: u32,
    ntp_sec: u32,
    ntp_frac: u32,
    rtp_ts: u32,
    psent: u32,
    osent: u32,
}

fn build_sender_info(children: &[Node], line: usize) -> Result<SenderInfo, Error> {
    let now = NtpTimestamp::now();
    let mut info = SenderInfo {
        ssrc: 0,
        ntp_sec: now.sec,
        ntp_frac: now.frac,
        rtp_ts: 0,
        psent: 0,
        osent: 0,
    };
    for child in children {
        let Node::Param { name, value } = child else {
            return Err(syntax_error(line, "SR sender-info block cannot contain a sub-list"));
        };
        match name.as_str() {
            "ssrc" => info.ssrc = num_value(value, name, line)? as u32,
            "ntp" => {
                let v = num_value(value, name, line)?;
                info.ntp_sec = (v >> 32) as u32;
                info.ntp_frac = v as u32;
            }
            "ts" => info.rtp_ts = num_value(value, name, line)? as u32,
            "psent" => info.psent = num_value(value, name, line)? as u32,
            "osent" => info.osent = num_value(value, name, line)? as u32,
            _ => return Err(syntax_error(line, format!("unknown SR sender-info field '{name}'"))),
        }
    }
    Ok(info)
}

pub(crate) fn build(children: &[Node], line: usize) -> Result<Bytes, Error> {
    let (params, blocks) = params_and_blocks(children);
    let mut overrides = HeaderOverrides::default();
    for (name, value) in &params {
        if *name == "SR" {
            continue;
        }
        if !overrides.try_consume(name, value, line)? {
            return Err(syntax_error(line, format!("unknown SR header field '{name}'")));
        }
    }
    let Some((sender_info_children, report_blocks)) = blocks.split_first() else {
        return Err(syntax_error(line, "SR requires a sender-info sub-list"));
    };
    let info = build_sender_info(sender_info_children, line)?;

    let total = HDR_LEN + BLOCK_LEN * report_blocks.len();
    let mut buf = BytesMut::zeroed(total);
    write_common_header(&mut buf, &overrides, RTCP_SR, report_blocks.len(), total);
    buf[4..8].copy_from_slice(&info.ssrc.to_be_bytes());
    buf[8..12].copy_from_slice(&info.ntp_sec.to_be_bytes());
    buf[12..16].copy_from_slice(&info.ntp_frac.to_be_bytes());
    buf[16..20].copy_from_slice(&info.rtp_ts.to_be_bytes());
    buf[20..24].copy_from_slice(&info.psent.to_be_bytes());
    buf[24..28].copy_from_slice(&info.osent.to_be_bytes());
    let mut off = HDR_LEN;
    for block in report_blocks {
        let b = build_report_block(block, line)?;
        buf[off..off + BLOCK_LEN].copy_from_slice(&b);
        off += BLOCK_LEN;
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script;

    fn build_line(text: &str) -> Result<Bytes, Error> {
        let nodes = script::parse(text, 1).unwrap();
        let children = nodes[0].children().unwrap();
        build(children, 1)
    }

    #[test]
    fn scenario_sender_info_plus_one_report_block() {
        let pkt = build_line(
            "(SR (ssrc=0xdeadbeef psent=50 osent=200) (ssrc=0x11111111 fraction=0 lost=0 last_seq=50 jit=0 lsr=0 dlsr=0))",
        )
        .unwrap();
        assert_eq!(pkt.len(), HDR_LEN + BLOCK_LEN);
        assert_eq!(pkt[1], 200);
        assert_eq!(&pkt[4..8], &0xdeadbeefu32.to_be_bytes());
        assert_eq!(&pkt[20..24], &50u32.to_be_bytes());
        assert_eq!(&pkt[24..28], &200u32.to_be_bytes());
        assert_eq!(pkt[0] & 0x1f, 1);
    }

    #[test]
    fn ntp_defaults_near_wall_clock() {
        let pkt = build_line("(SR (ssrc=1))").unwrap();
        let ntp_sec = u32::from_be_bytes(pkt[8..12].try_into().unwrap());
        let now = NtpTimestamp::now();
        assert!((ntp_sec as i64 - now.sec as i64).abs() <= 1);
    }

    #[test]
    fn ntp_override_splits_into_sec_and_frac() {
        let pkt = build_line("(SR (ssrc=1 ntp=0x1122334455667788))").unwrap();
        assert_eq!(u32::from_be_bytes(pkt[8..12].try_into().unwrap()), 0x11223344);
        assert_eq!(u32::from_be_bytes(pkt[12..16].try_into().unwrap()), 0x55667788);
    }

    #[test]
    fn missing_sender_info_is_an_error() {
        assert!(build_line("(SR p=0)").is_err());
    }
}

// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! BYE builder (§4.6): one 32-bit SSRC per sub-list, no payload otherwise.

use bytes::{Bytes, BytesMut};

use super::common::{
    num_value, params_and_blocks, syntax_error, write_common_header, HeaderOverrides, RTCP_BYE,
};
use crate::error::Error;
use crate::script::Node;

pub(crate) fn build(children: &[Node], line: usize) -> Result<Bytes, Error> {
    let (params, blocks) = params_and_blocks(children);
    let mut overrides = HeaderOverrides::default();
    for (name, value) in &params {
        if *name == "BYE" {
            continue;
        }
        if !overrides.try_consume(name, value, line)? {
            return Err(syntax_error(line, format!("unknown BYE header field '{name}'")));
        }
    }

    let mut ssrcs = Vec::with_capacity(blocks.len());
    for block in &blocks {
        let [Node::Param { name, value }] = block else {
            return Err(syntax_error(line, "BYE sub-list must contain exactly one 'ssrc' param"));
        };
        if name != "ssrc" {
            return Err(syntax_error(line, format!("unknown BYE block field '{name}'")));
        }
        ssrcs.push(num_value(value, name, line)? as u32);
    }

    let total = 4 + 4 * ssrcs.len();
    let mut buf = BytesMut::zeroed(total);
    write_common_header(&mut buf, &overrides, RTCP_BYE, ssrcs.len(), total);
    for (i, ssrc) in ssrcs.iter().enumerate() {
        let off = 4 + 4 * i;
        buf[off..off + 4].copy_from_slice(&ssrc.to_be_bytes());
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
    fn scenario_single_ssrc() {
        let pkt = build_line("(BYE (ssrc=0x01020304))").unwrap();
        assert_eq!(&pkt[..], &[0x81, 0xCB, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04][..]);
    }

    #[test]
    fn zero_ssrcs_yields_four_byte_packet() {
        let pkt = build_line("(BYE)").unwrap();
        assert_eq!(pkt.len(), 4);
        assert_eq!(u16::from_be_bytes([pkt[2], pkt[3]]), 0);
    }

    #[test]
    fn multiple_ssrcs_concatenate() {
        let pkt = build_line("(BYE (ssrc=1) (ssrc=2))").unwrap();
        assert_eq!(pkt.len(), 12);
        assert_eq!(&pkt[4..8], &1u32.to_be_bytes());
        assert_eq!(&pkt[8..12], &2u32.to_be_bytes());
    }
}

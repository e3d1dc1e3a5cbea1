// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RR (Receiver Report) builder (§4.4): an 8-byte header (common + reporter
//! SSRC) followed by one 24-byte report block per sub-list.

use bytes::{Bytes, BytesMut};

use super::common::{
    num_value, params_and_blocks, syntax_error, write_common_header, HeaderOverrides, RTCP_RR,
};
use super::report::build_report_block;
use crate::error::Error;
use crate::script::Node;

const HDR_LEN: usize = 8;
const BLOCK_LEN: usize = 24;

pub(crate) fn build(children: &[Node], line: usize) -> Result<Bytes, Error> {
    let (params, blocks) = params_and_blocks(children);
    let mut overrides = HeaderOverrides::default();
    let mut ssrc: u32 = 0;
    for (name, value) in &params {
        if *name == "RR" {
            continue;
        }
        if overrides.try_consume(name, value, line)? {
            continue;
        }
        if *name == "ssrc" {
            ssrc = num_value(value, name, line)? as u32;
            continue;
        }
        return Err(syntax_error(line, format!("unknown RR header field '{name}'")));
    }

    let total = HDR_LEN + BLOCK_LEN * blocks.len();
    let mut buf = BytesMut::zeroed(total);
    write_common_header(&mut buf, &overrides, RTCP_RR, blocks.len(), total);
    buf[4..8].copy_from_slice(&ssrc.to_be_bytes());
    let mut off = HDR_LEN;
    for block in &blocks {
        let b = build_report_block(block, line)?;
        buf[off..off + BLOCK_LEN].copy_from_slice(&b);
        off += BLOCK_LEN;
    }
    Ok(buf.freeze())
}

// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SDES (Source Description) builder (§4.3).

use bytes::{Bytes, BytesMut};

use super::common::{
    num_value, params_and_blocks, syntax_error, write_common_header, HeaderOverrides, RTCP_SDES,
};
use crate::error::Error;
use crate::script::{Node, Value};

fn item_type(name: &str) -> Option<u8> {
    Some(match name {
        "end" => 0,
        "cname" => 1,
        "name" => 2,
        "email" => 3,
        "phone" => 4,
        "loc" => 5,
        "tool" => 6,
        "note" => 7,
        "priv" => 8,
        _ => return None,
    })
}

/// Builds one SDES chunk: a 32-bit SSRC, a sequence of `<type><len><data>`
/// items, a zero terminator, then zero padding to the next 4-byte boundary.
/// Runs unconditionally even for a chunk with no items (length 8).
fn build_chunk(children: &[Node], line: usize) -> Result<Vec<u8>, Error> {
    let mut ssrc: u32 = 0;
    let mut items: Vec<(u8, Vec<u8>)> = Vec::new();

    for child in children {
        let Node::Param { name, value } = child else {
            return Err(syntax_error(line, "SDES chunk cannot contain a sub-list"));
        };
        if name == "src" {
            ssrc = num_value(value, name, line)? as u32;
            continue;
        }
        let ty = item_type(name)
            .ok_or_else(|| syntax_error(line, format!("unknown SDES item type '{name}'")))?;
        let data = match value {
            Some(Value::Str(s)) => s.as_bytes().to_vec(),
            Some(Value::Num(n)) => n.to_string().into_bytes(),
            None => Vec::new(),
        };
        if data.len() > u8::MAX as usize {
            return Err(syntax_error(line, "SDES item too long (max 255 bytes)"));
        }
        items.push((ty, data));
    }

    let mut body = Vec::with_capacity(4 + items.iter().map(|(_, d)| 2 + d.len()).sum::<usize>() + 4);
    body.extend_from_slice(&ssrc.to_be_bytes());
    for (ty, data) in &items {
        body.push(*ty);
        body.push(data.len() as u8);
        body.extend_from_slice(data);
    }
    body.push(0); // terminator
    while body.len() % 4 != 0 {
        body.push(0);
    }
    Ok(body)
}

pub(crate) fn build(children: &[Node], line: usize) -> Result<Bytes, Error> {
    let (params, blocks) = params_and_blocks(children);
    let mut overrides = HeaderOverrides::default();
    for (name, value) in &params {
        if *name == "SDES" {
            continue;
        }
        if !overrides.try_consume(name, value, line)? {
            return Err(syntax_error(line, format!("unknown SDES header field '{name}'")));
        }
    }

    let mut chunks = Vec::with_capacity(blocks.len());
    for block in &blocks {
        chunks.push(build_chunk(block, line)?);
    }

    let body_len: usize = chunks.iter().map(Vec::len).sum();
    let total = 4 + body_len;
    let mut buf = BytesMut::zeroed(total);
    write_common_header(&mut buf, &overrides, RTCP_SDES, blocks.len(), total);
    let mut off = 4;
    for chunk in &chunks {
        buf[off..off + chunk.len()].copy_from_slice(chunk);
        off += chunk.len();
    }
    Ok(buf.freeze())
}

// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared RTCP common-header bits (the first 4 bytes of every sub-packet) and
//! the `p`/`count`/`len` header-level override parsing used by every builder.

use bytes::BytesMut;

use crate::error::{Error, ErrorInt};
use crate::script::{Node, Value};

pub(crate) const RTCP_SR: u8 = 200;
pub(crate) const RTCP_RR: u8 = 201;
pub(crate) const RTCP_SDES: u8 = 202;
pub(crate) const RTCP_BYE: u8 = 203;
pub(crate) const RTCP_APP: u8 = 204;

pub(crate) fn syntax_error(line: usize, description: impl Into<String>) -> Error {
    crate::error::wrap!(ErrorInt::ScriptSyntax {
        line,
        description: description.into(),
    })
}

pub(crate) fn num_value(value: &Option<Value>, name: &str, line: usize) -> Result<u64, Error> {
    value
        .as_ref()
        .and_then(Value::as_num)
        .ok_or_else(|| syntax_error(line, format!("field '{name}' requires a numeric value")))
}

pub(crate) fn str_value<'a>(
    value: &'a Option<Value>,
    name: &str,
    line: usize,
) -> Result<&'a str, Error> {
    value
        .as_ref()
        .and_then(Value::as_str)
        .ok_or_else(|| syntax_error(line, format!("field '{name}' requires a string value")))
}

/// Header-level overrides common to every RTCP sub-packet TYPE (§3, §4.3-4.6).
#[derive(Default)]
pub(crate) struct HeaderOverrides {
    pub(crate) p: bool,
    pub(crate) count: Option<u8>,
    pub(crate) length_words: Option<u16>,
}

impl HeaderOverrides {
    /// Recognizes `p=`/`count=`/`len=`. Returns `Ok(true)` if `name` was one
    /// of these (and was consumed), `Ok(false)` if the caller should handle
    /// `name` itself.
    pub(crate) fn try_consume(
        &mut self,
        name: &str,
        value: &Option<Value>,
        line: usize,
    ) -> Result<bool, Error> {
        match name {
            "p" => {
                self.p = num_value(value, name, line)? != 0;
                Ok(true)
            }
            "count" => {
                self.count = Some(num_value(value, name, line)? as u8);
                Ok(true)
            }
            "len" => {
                self.length_words = Some(num_value(value, name, line)? as u16);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// Writes the 4-byte RTCP common header at the start of `buf`, filling in
/// `count`/`length` defaults (`count` = number of blocks, `length` =
/// `(total - 4) / 4`) unless the script overrode them.
pub(crate) fn write_common_header(
    buf: &mut BytesMut,
    overrides: &HeaderOverrides,
    pt: u8,
    block_count: usize,
    total_len: usize,
) {
    let count = overrides.count.unwrap_or(block_count as u8);
    let length_words = overrides
        .length_words
        .unwrap_or(((total_len - 4) / 4) as u16);
    buf[0] = (2 << 6) | ((overrides.p as u8) << 5) | (count & 0x1f);
    buf[1] = pt;
    buf[2..4].copy_from_slice(&length_words.to_be_bytes());
}

/// Splits a TYPE group's children into its leading TYPE tag, its flat
/// header-level params, and its nested block groups, in textual order. Does
/// not classify the flat params; each builder interprets its own set.
pub(crate) fn params_and_blocks(children: &[Node]) -> (Vec<(&str, &Option<Value>)>, Vec<&[Node]>) {
    let mut params = Vec::new();
    let mut blocks = Vec::new();
    for child in children {
        match child {
            Node::Param { name, value } => params.push((name.as_str(), value)),
            Node::Group { children } => blocks.push(children.as_slice()),
        }
    }
    (params, blocks)
}

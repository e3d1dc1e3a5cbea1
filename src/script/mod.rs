// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Script text format: the descriptor grammar (§4.1), its tagged-tree output
//! (§3), and logical-line assembly (§4.10).

mod descriptor;
mod node;
mod reader;

pub(crate) use descriptor::{parse, parse_c_uint};
pub(crate) use node::{Node, Value};
pub(crate) use reader::{LogicalLine, ScriptReader};

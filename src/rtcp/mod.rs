// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! RTCP compound packet builders (§4.3-§4.7) and their dispatch (§4.8, Design
//! Notes "Builder dispatch").

mod app;
mod bye;
mod common;
mod report;
mod rr;
mod sdes;
mod sr;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::Error;
use crate::script::{self, Node};

type Builder = fn(&[Node], usize) -> Result<Bytes, Error>;

/// The sole source of truth for which RTCP sub-type name maps to which
/// builder; adding a new sub-type is one entry here.
const BUILDERS: &[(&str, Builder)] = &[
    ("SDES", sdes::build),
    ("RR", rr::build),
    ("SR", sr::build),
    ("BYE", bye::build),
    ("APP", app::build),
];

fn lookup(type_name: &str) -> Option<Builder> {
    BUILDERS
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, f)| *f)
}

/// Parses an RTCP body (the text after the `RTCP` keyword) and builds the
/// compound packet: the concatenation of each top-level sub-packet, in
/// textual order, with no additional outer wrapping.
pub(crate) fn build_compound(text: &str, line: usize) -> Result<Bytes, Error> {
    let nodes = script::parse(text, line)?;
    let mut out = BytesMut::new();
    for node in &nodes {
        let children = node.children().ok_or_else(|| {
            common::syntax_error(line, "expected a parenthesized RTCP sub-packet")
        })?;
        let type_name = children
            .first()
            .and_then(Node::name)
            .ok_or_else(|| common::syntax_error(line, "RTCP sub-packet missing a TYPE tag"))?;
        let builder = lookup(type_name)
            .ok_or_else(|| common::syntax_error(line, format!("unknown RTCP TYPE '{type_name}'")))?;
        out.put(builder(children, line)?);
    }
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_concatenates_sub_packets_in_order() {
        let pkt = build_compound(
            "(SDES (src=1 cname=\"a\")) (BYE (ssrc=1))",
            1,
        )
        .unwrap();
        // SDES: 4 + 4 + (1+1+1) + (1+2) = 16; BYE: 4 + 4 = 8.
        assert_eq!(pkt.len(), 16 + 8);
        assert_eq!(pkt[1], 202); // SDES pt
        assert_eq!(pkt[16 + 1], 203); // BYE pt
    }

    #[test]
    fn unknown_type_is_a_script_error() {
        assert!(build_compound("(XYZ (ssrc=1))", 1).is_err());
    }

    #[test]
    fn scenario_bye_wire_bytes() {
        let pkt = build_compound("(BYE (ssrc=0x01020304))", 1).unwrap();
        assert_eq!(&pkt[..], &[0x81, 0xCB, 0x00, 0x01, 0x01, 0x02, 0x03, 0x04][..]);
    }
}

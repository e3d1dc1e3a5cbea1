// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! APP builder (§4.7): reserved. Emits an empty (zero-length) packet and
//! logs a warning rather than treating the line as an error, since a script
//! author may use it as a harmless timing marker.

use bytes::Bytes;
use log::warn;

use crate::error::Error;
use crate::script::Node;

pub(crate) fn build(_children: &[Node], line: usize) -> Result<Bytes, Error> {
    warn!("line {line}: APP RTCP sub-type is reserved and emits an empty packet");
    Ok(Bytes::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script;

    #[test]
    fn emits_empty_packet() {
        let nodes = script::parse("(APP)", 1).unwrap();
        let children = nodes[0].children().unwrap();
        let pkt = build(children, 1).unwrap();
        assert!(pkt.is_empty());
    }
}

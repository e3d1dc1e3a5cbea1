// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatcher (§4.8): turns one logical script line into a scheduled,
//! serialized packet.

use std::time::Duration;

use bytes::Bytes;

use crate::error::{Error, ErrorInt};
use crate::rtcp;
use crate::rtp;

fn syntax_error(line: usize, description: impl Into<String>) -> Error {
    crate::error::wrap!(ErrorInt::ScriptSyntax {
        line,
        description: description.into(),
    })
}

/// Which transmit sink a built packet belongs on (§4.11: sink 0 = RTP, sink
/// 1 = RTCP).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum SinkKind {
    Rtp,
    Rtcp,
}

/// A built packet along with the sink it's destined for and its scheduled
/// time relative to the first packet in the script (§3).
pub(crate) struct PendingPacket {
    pub(crate) bytes: Bytes,
    pub(crate) kind: SinkKind,
    pub(crate) scheduled: Duration,
}

/// Splits a logical line into its `<sec>.<usec>` prefix and the remaining
/// `TYPE body` text. The two leading tokens are split on any ASCII
/// whitespace; text to the right of the `TYPE` keyword is preserved
/// byte-for-byte (continuation-line whitespace inside a `data=` value must
/// survive into the RTP/RTCP body parsers unchanged).
fn split_line(text: &str, line: usize) -> Result<(Duration, &str, &str), Error> {
    let trimmed = text.trim_start();
    let mut head = trimmed.splitn(2, char::is_whitespace);
    let time_tok = head
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| syntax_error(line, "empty script line"))?;
    let rest = head.next().unwrap_or("").trim_start();

    let (sec_str, usec_str) = time_tok
        .split_once('.')
        .ok_or_else(|| syntax_error(line, format!("invalid time prefix '{time_tok}'")))?;
    let sec: u64 = sec_str
        .parse()
        .map_err(|_| syntax_error(line, format!("invalid seconds in '{time_tok}'")))?;
    let usec: u32 = usec_str
        .parse()
        .map_err(|_| syntax_error(line, format!("invalid microseconds in '{time_tok}'")))?;
    let scheduled = Duration::new(sec, usec.saturating_mul(1000));

    let mut tail = rest.splitn(2, char::is_whitespace);
    let keyword = tail
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| syntax_error(line, "missing RTP/RTCP keyword"))?;
    let body = tail.next().unwrap_or("");
    Ok((scheduled, keyword, body))
}

/// Parses one logical line into a [`PendingPacket`].
pub(crate) fn generate(text: &str, line: usize) -> Result<PendingPacket, Error> {
    let (scheduled, keyword, body) = split_line(text, line)?;
    match keyword {
        "RTP" => Ok(PendingPacket {
            bytes: rtp::build(body, line)?,
            kind: SinkKind::Rtp,
            scheduled,
        }),
        "RTCP" => Ok(PendingPacket {
            bytes: rtcp::build_compound(body, line)?,
            kind: SinkKind::Rtcp,
            scheduled,
        }),
        other => Err(syntax_error(line, format!("unknown line TYPE '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_prefix_and_rtp_body() {
        let p = generate("0.020000 RTP pt=96 seq=2 ts=160 ssrc=1 data=aa", 1).unwrap();
        assert_eq!(p.kind, SinkKind::Rtp);
        assert_eq!(p.scheduled, Duration::from_micros(20_000));
    }

    #[test]
    fn parses_rtcp_compound_body() {
        let p = generate("5.000000 RTCP (BYE (ssrc=0xdeadbeef))", 1).unwrap();
        assert_eq!(p.kind, SinkKind::Rtcp);
        assert_eq!(p.scheduled, Duration::from_secs(5));
        assert_eq!(p.bytes[1], 203);
    }

    #[test]
    fn unknown_keyword_is_a_script_error() {
        assert!(generate("1.0 XYZ anything", 1).is_err());
    }

    #[test]
    fn malformed_time_prefix_is_a_script_error() {
        assert!(generate("notatime RTP pt=0", 1).is_err());
    }

    #[test]
    fn continuation_whitespace_in_rtp_body_survives_split() {
        let p = generate("0.0 RTP ssrc=1 data=de\nad", 1).unwrap();
        assert_eq!(&p.bytes[12..14], &[0xde, 0xad]);
    }
}

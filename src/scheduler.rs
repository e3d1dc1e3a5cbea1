// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playout scheduler (§4.9): reads logical lines, generates packets, and
//! drives an async timer against the recorded inter-packet timing.
//!
//! The deadline/clamping arithmetic in [`next_deadline`] is a pure function
//! of `(base_offset, script_time, now)`, independent of Tokio, so the
//! `Unstarted -> Running -> (Rewinding -> Running)* -> Terminated` state
//! machine is unit-testable without any I/O.

use std::io::{BufRead, Seek};
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use pretty_hex::PrettyHex;

use crate::error::Error;
use crate::generator::{self, PendingPacket, SinkKind};
use crate::script::ScriptReader;
use crate::sink::PacketSink;

/// Computes the next send deadline from the running base offset and the
/// packet's scheduled script time, clamping to `now` (and reporting whether
/// clamping occurred) if the computed deadline has already passed.
///
/// `base_offset` is signed relative to `now`'s clock: positive means the
/// first packet's wall-clock send time is ahead of `now`'s origin. We carry
/// it as a `Duration` plus a sign-free formulation by computing directly in
/// `Instant` arithmetic at the call site instead; see [`PlayoutScheduler`].
pub(crate) fn next_deadline(base: Instant, script_time: Duration, now: Instant) -> (Instant, bool) {
    match base.checked_add(script_time) {
        Some(deadline) if deadline >= now => (deadline, false),
        _ => (now, true),
    }
}

/// Drives playout of a script source through two packet sinks.
pub(crate) struct PlayoutScheduler<R, S> {
    reader: ScriptReader<R>,
    rtp_sink: S,
    rtcp_sink: S,
    loop_mode: bool,
}

// `R: Seek` is required unconditionally (not just for loop mode) so the
// binary settles the "can this source rewind" question once, at startup,
// rather than deferring a trait-bound mismatch into `run()`. The CLI layer
// enforces the actual policy (`-l` requires `-f`, since only a file reader
// is supplied pre-buffered as a `Cursor`); see `cli.rs`/`bin/rtpreplay.rs`.
impl<R: BufRead + Seek, S: PacketSink> PlayoutScheduler<R, S> {
    pub(crate) fn new(reader: ScriptReader<R>, rtp_sink: S, rtcp_sink: S, loop_mode: bool) -> Self {
        PlayoutScheduler {
            reader,
            rtp_sink,
            rtcp_sink,
            loop_mode,
        }
    }

    async fn send(&self, packet: &PendingPacket) {
        let (sink, name) = match packet.kind {
            SinkKind::Rtp => (&self.rtp_sink, "RTP"),
            SinkKind::Rtcp => (&self.rtcp_sink, "RTCP"),
        };
        if let Err(e) = sink.send(&packet.bytes).await {
            warn!("send on {name} sink failed: {e}");
        } else {
            trace!(
                "sent {} byte {name} packet:\n{:?}",
                packet.bytes.len(),
                packet.bytes.hex_dump()
            );
        }
    }

    /// Reads and builds the next logical line, rewinding and recursing once
    /// on EOF in loop mode. Returns `None` at true end of input
    /// (non-looping EOF); the `bool` reports whether a rewind happened while
    /// fetching this packet.
    fn next_packet(&mut self) -> Result<Option<(PendingPacket, bool)>, Error> {
        let mut rewound = false;
        loop {
            match self.reader.next_logical_line()? {
                Some(line) => {
                    let packet = generator::generate(&line.text, line.line_no)?;
                    return Ok(Some((packet, rewound)));
                }
                None if self.loop_mode => {
                    debug!("reached end of script; rewinding for loop mode");
                    self.reader.rewind()?;
                    rewound = true;
                }
                None => return Ok(None),
            }
        }
    }

    /// Runs playout to completion: `Terminated` is reached by non-loop EOF;
    /// loop mode runs until the process is killed (`tokio::signal`, §5).
    pub(crate) async fn run(mut self) -> Result<(), Error> {
        let Some((mut pending, _)) = self.next_packet()? else {
            debug!("empty script; nothing to play out");
            return Ok(());
        };
        let mut base = Instant::now()
            .checked_sub(pending.scheduled)
            .unwrap_or_else(Instant::now);
        self.send(&pending).await;

        loop {
            let (next, rewound) = match self.next_packet()? {
                Some(p) => p,
                None => {
                    debug!("end of script reached; terminating");
                    return Ok(());
                }
            };

            // A rewind resets `base`/"is first" state so each loop
            // iteration's timing is relative to its own first packet.
            if rewound {
                base = Instant::now()
                    .checked_sub(next.scheduled)
                    .unwrap_or_else(Instant::now);
                pending = next;
                self.send(&pending).await;
                continue;
            }

            let now = Instant::now();
            let (deadline, clamped) = next_deadline(base, next.scheduled, now);
            if clamped {
                warn!("computed deadline was in the past; clamping to now");
            }
            tokio::time::sleep_until(deadline.into()).await;
            pending = next;
            self.send(&pending).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_tracks_script_time_when_in_the_future() {
        let now = Instant::now();
        let base = now - Duration::from_millis(5);
        let (deadline, clamped) = next_deadline(base, Duration::from_millis(50), now);
        assert!(!clamped);
        assert_eq!(deadline, base + Duration::from_millis(50));
        assert!(deadline > now);
    }

    #[test]
    fn deadline_clamps_to_now_when_in_the_past() {
        let now = Instant::now();
        let base = now - Duration::from_secs(10);
        let (deadline, clamped) = next_deadline(base, Duration::from_millis(1), now);
        assert!(clamped);
        assert_eq!(deadline, now);
    }

    #[test]
    fn deadline_exactly_at_now_is_not_clamped() {
        let now = Instant::now();
        let (deadline, clamped) = next_deadline(now, Duration::ZERO, now);
        assert!(!clamped);
        assert_eq!(deadline, now);
    }

    struct RecordingSink(std::sync::Mutex<Vec<Vec<u8>>>);

    impl RecordingSink {
        fn new() -> Self {
            RecordingSink(std::sync::Mutex::new(Vec::new()))
        }
    }

    impl PacketSink for RecordingSink {
        async fn send(&self, bytes: &[u8]) -> std::io::Result<()> {
            self.0.lock().unwrap().push(bytes.to_vec());
            Ok(())
        }
    }

    fn scheduler_over(
        script: &str,
        loop_mode: bool,
    ) -> PlayoutScheduler<std::io::Cursor<Vec<u8>>, RecordingSink> {
        let reader = ScriptReader::new(std::io::Cursor::new(script.as_bytes().to_vec()));
        PlayoutScheduler::new(reader, RecordingSink::new(), RecordingSink::new(), loop_mode)
    }

    #[tokio::test(start_paused = true)]
    async fn two_packet_script_sends_both_in_order() {
        let scheduler = scheduler_over(
            "0.000000 RTP pt=96 seq=1 ts=0 ssrc=1 data=aa\n0.050000 RTP pt=96 seq=2 ts=160 ssrc=1 data=bb\n",
            false,
        );
        scheduler.run().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_script_returns_immediately() {
        let scheduler = scheduler_over("", false);
        scheduler.run().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn malformed_line_is_a_fatal_error() {
        let scheduler = scheduler_over("notatime RTP pt=0\n", false);
        assert!(scheduler.run().await.is_err());
    }
}

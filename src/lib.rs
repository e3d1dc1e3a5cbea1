// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replays a scripted sequence of RTP and RTCP packets over UDP, reproducing
//! the wire format and inter-packet timing of a recorded session.
//!
//! The entry point is [`run`]: it resolves a [`cli::Opts`] into bound
//! transmit sockets and a script source, then drives a
//! [`scheduler::PlayoutScheduler`] to completion.

pub mod cli;
mod error;
mod generator;
mod hexcodec;
mod input;
mod ntp;
mod rtcp;
mod rtp;
mod scheduler;
mod script;
mod sink;

pub use error::{Error, ErrorKind};

use std::io::{BufReader, Cursor, Read};

use input::ScriptSource;
use scheduler::PlayoutScheduler;
use script::ScriptReader;

/// Runs one playout session: validates and resolves `opts`, opens the
/// transmit sockets and script source, then plays the script out to
/// completion (EOF without `-l`) or until the process is signaled.
pub async fn run(opts: cli::Opts) -> Result<(), Error> {
    let config = opts.resolve()?;
    let (rtp_sink, rtcp_sink) = sink::open(&config.destination)?;
    let source = open_script_source(config.script.as_deref())?;
    let reader = ScriptReader::new(source);
    let scheduler = PlayoutScheduler::new(reader, rtp_sink, rtcp_sink, config.loop_mode);
    scheduler.run().await
}

fn open_script_source(path: Option<&std::path::Path>) -> Result<ScriptSource, Error> {
    match path {
        Some(p) => {
            let f = std::fs::File::open(p)
                .map_err(|e| error::ErrorInt::io(format!("opening script '{}'", p.display()), e))?;
            Ok(ScriptSource::File(BufReader::new(f)))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|e| error::ErrorInt::io("reading script from stdin", e))?;
            Ok(ScriptSource::Stdin(Cursor::new(buf)))
        }
    }
}

/// Exposed only so `cargo fuzz` targets (which live in a separate crate) can
/// reach the text-parsing pipeline; not part of the supported public API.
#[doc(hidden)]
pub mod fuzz_targets {
    /// Runs one logical script line through the full dispatcher: time-prefix
    /// parsing, RTP/RTCP keyword dispatch, descriptor parsing, and the
    /// relevant serializer(s).
    pub fn generate_line(text: &str) -> Result<(), crate::Error> {
        crate::generator::generate(text, 1).map(|_| ())
    }
}

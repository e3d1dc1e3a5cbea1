// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line surface (§4.12): `argv` parsing into a typed options struct,
//! and the startup-time validation/resolution that turns it into a
//! [`Config`] the rest of the crate can run against.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use structopt::StructOpt;

use crate::error::{Error, ErrorInt};
use crate::sink::Destination;

/// Replays a scripted sequence of RTP/RTCP packets over UDP.
#[derive(StructOpt, Debug)]
#[structopt(name = "rtpreplay")]
pub struct Opts {
    /// Script file to read (defaults to stdin).
    #[structopt(short = "f", long = "file", parse(from_os_str))]
    pub script: Option<PathBuf>,

    /// Replay the script indefinitely, rewinding on each EOF. Requires `-f`,
    /// since stdin can't be rewound.
    #[structopt(short = "l", long = "loop")]
    pub loop_mode: bool,

    /// Bind the RTP/RTCP sockets to a fixed, consecutive local port pair
    /// instead of letting the OS choose ephemeral ports.
    #[structopt(short = "s", long = "source-port")]
    pub source_port: Option<u16>,

    /// Set the IP router-alert option on outgoing packets, where supported.
    #[structopt(short = "a", long = "router-alert")]
    pub router_alert: bool,

    /// Enable verbose (debug-level) logging.
    #[structopt(short = "v", long = "verbose")]
    pub verbose: bool,

    /// Destination as `host/port[/ttl]`. `ttl` is only meaningful for a
    /// multicast host and defaults to 1.
    pub destination: String,
}

/// Resolved, validated configuration derived from [`Opts`], ready to drive a
/// playout session.
pub(crate) struct Config {
    pub(crate) script: Option<PathBuf>,
    pub(crate) loop_mode: bool,
    pub(crate) destination: Destination,
}

impl Opts {
    /// Validates flag combinations and resolves the destination spec,
    /// producing the startup errors described in §4.12/§7 (exit 1) rather
    /// than letting an inconsistency surface later as a confusing failure.
    pub(crate) fn resolve(self) -> Result<Config, Error> {
        if self.loop_mode && self.script.is_none() {
            return Err(ErrorInt::usage("-l/--loop requires -f/--file (stdin can't be rewound)"));
        }
        let destination = parse_destination(&self.destination, self.source_port, self.router_alert)?;
        Ok(Config {
            script: self.script,
            loop_mode: self.loop_mode,
            destination,
        })
    }
}

/// Parses `host/port[/ttl]` and resolves `host` via the system resolver,
/// producing the RTP (even) and RTCP (odd) socket addresses.
fn parse_destination(spec: &str, source_port: Option<u16>, router_alert: bool) -> Result<Destination, Error> {
    let mut parts = spec.split('/');
    let host = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ErrorInt::bad_destination(spec, "missing host"))?;
    let port: u16 = parts
        .next()
        .ok_or_else(|| ErrorInt::bad_destination(spec, "missing port"))?
        .parse()
        .map_err(|_| ErrorInt::bad_destination(spec, "port must be a 16-bit integer"))?;
    let ttl: u32 = match parts.next() {
        Some(t) => t
            .parse()
            .map_err(|_| ErrorInt::bad_destination(spec, "ttl must be an integer"))?,
        None => 1,
    };
    if parts.next().is_some() {
        return Err(ErrorInt::bad_destination(spec, "too many '/'-separated components"));
    }

    let rtp_addr = resolve_one(host, port, spec)?;
    let rtcp_addr = SocketAddr::new(rtp_addr.ip(), port + 1);
    Ok(Destination {
        rtp_addr,
        rtcp_addr,
        fixed_source_port: source_port,
        router_alert,
        ttl,
    })
}

fn resolve_one(host: &str, port: u16, spec: &str) -> Result<SocketAddr, Error> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| ErrorInt::bad_destination(spec, format!("resolving '{host}': {e}")))?
        .next()
        .ok_or_else(|| ErrorInt::bad_destination(spec, format!("'{host}' resolved to no addresses")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_port_ttl() {
        let dest = parse_destination("127.0.0.1/5000/16", None, false).unwrap();
        assert_eq!(dest.rtp_addr.port(), 5000);
        assert_eq!(dest.rtcp_addr.port(), 5001);
        assert_eq!(dest.ttl, 16);
    }

    #[test]
    fn ttl_defaults_to_one() {
        let dest = parse_destination("127.0.0.1/5000", None, false).unwrap();
        assert_eq!(dest.ttl, 1);
    }

    #[test]
    fn rejects_missing_port() {
        assert!(parse_destination("127.0.0.1", None, false).is_err());
    }

    #[test]
    fn rejects_extra_components() {
        assert!(parse_destination("127.0.0.1/5000/16/extra", None, false).is_err());
    }

    #[test]
    fn loop_mode_without_file_is_a_usage_error() {
        let opts = Opts {
            script: None,
            loop_mode: true,
            source_port: None,
            router_alert: false,
            verbose: false,
            destination: "127.0.0.1/5000".into(),
        };
        assert_eq!(opts.resolve().unwrap_err().kind(), crate::error::ErrorKind::Startup);
    }

    #[test]
    fn loop_mode_with_file_resolves_fine() {
        let opts = Opts {
            script: Some(PathBuf::from("/dev/null")),
            loop_mode: true,
            source_port: None,
            router_alert: false,
            verbose: false,
            destination: "127.0.0.1/5000".into(),
        };
        assert!(opts.resolve().is_ok());
    }
}

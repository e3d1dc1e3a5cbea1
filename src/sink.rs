// Copyright (C) 2021 Scott Lamb <slamb@slamb.org>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transmit sinks and socket setup (§4.11): the "already-bound,
//! already-connected transmit handles" the playout scheduler sends through,
//! so it never touches a raw socket or an address-family distinction.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use log::info;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;

use crate::error::{Error, ErrorInt};

/// A place to put outgoing bytes. The scheduler depends on this, not on a
/// concrete socket type, so its deadline/send loop is testable against a
/// fake sink.
pub(crate) trait PacketSink {
    async fn send(&self, bytes: &[u8]) -> std::io::Result<()>;
}

/// A connected UDP socket.
pub(crate) struct UdpSink(UdpSocket);

impl PacketSink for UdpSink {
    async fn send(&self, bytes: &[u8]) -> std::io::Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.0.send(bytes).await.map(|_| ())
    }
}

/// Destination and source-port configuration resolved from the CLI (§4.12).
pub(crate) struct Destination {
    pub(crate) rtp_addr: SocketAddr,
    pub(crate) rtcp_addr: SocketAddr,
    pub(crate) fixed_source_port: Option<u16>,
    pub(crate) router_alert: bool,
    pub(crate) ttl: u32,
}

fn is_multicast(addr: &SocketAddr) -> bool {
    match addr.ip() {
        IpAddr::V4(v4) => v4.is_multicast(),
        IpAddr::V6(v6) => v6.is_multicast(),
    }
}

/// Builds one UDP socket2 `Socket`, optionally bound to a fixed local port
/// with `SO_REUSEADDR`/`SO_REUSEPORT`, with `IP_MULTICAST_TTL` set when the
/// peer is a class-D address, then connects it to `peer`.
fn build_socket(peer: SocketAddr, local_port: Option<u16>, router_alert: bool, ttl: u32) -> Result<Socket, Error> {
    let domain = match peer {
        SocketAddr::V4(_) => Domain::IPV4,
        SocketAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|e| ErrorInt::io("creating UDP socket", e))?;

    if let Some(port) = local_port {
        socket
            .set_reuse_address(true)
            .map_err(|e| ErrorInt::io("setting SO_REUSEADDR", e))?;
        #[cfg(unix)]
        socket
            .set_reuse_port(true)
            .map_err(|e| ErrorInt::io("setting SO_REUSEPORT", e))?;
        let local: SocketAddr = (IpAddr::V4(Ipv4Addr::UNSPECIFIED), port).into();
        socket
            .bind(&local.into())
            .map_err(|e| ErrorInt::io(format!("binding source port {port}"), e))?;
    }

    if is_multicast(&peer) {
        socket
            .set_multicast_ttl_v4(ttl)
            .map_err(|e| ErrorInt::io("setting IP_MULTICAST_TTL", e))?;
    }

    if router_alert {
        // The IP router-alert option (RFC 2113) has no portable setsockopt
        // exposed by socket2; platforms that support it do so via raw
        // `IP_OPTIONS`, which isn't attempted here. Surfaced as a no-op with
        // a log line rather than a silent gap.
        info!("router-alert option requested but not supported on this platform; ignoring");
    }

    socket.set_nonblocking(true).map_err(|e| ErrorInt::io("setting socket nonblocking", e))?;
    socket
        .connect(&peer.into())
        .map_err(|e| ErrorInt::io(format!("connecting to {peer}"), e))?;
    Ok(socket)
}

/// Resolves and binds the RTP/RTCP transmit sockets described by
/// `destination`, returning them connected and ready for [`PacketSink::send`].
pub(crate) fn open(destination: &Destination) -> Result<(UdpSink, UdpSink), Error> {
    let rtp_local = destination.fixed_source_port;
    let rtcp_local = destination.fixed_source_port.map(|p| p + 1);
    let rtp = build_socket(destination.rtp_addr, rtp_local, destination.router_alert, destination.ttl)?;
    let rtcp = build_socket(destination.rtcp_addr, rtcp_local, destination.router_alert, destination.ttl)?;
    info!(
        "sending RTP to {} and RTCP to {}",
        destination.rtp_addr, destination.rtcp_addr
    );
    let rtp = UdpSocket::from_std(rtp.into()).map_err(|e| ErrorInt::io("adopting RTP socket into the runtime", e))?;
    let rtcp = UdpSocket::from_std(rtcp.into()).map_err(|e| ErrorInt::io("adopting RTCP socket into the runtime", e))?;
    Ok((UdpSink(rtp), UdpSink(rtcp)))
}

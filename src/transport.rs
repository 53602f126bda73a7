//! UDP exchange with a single server: send, bounded wait, retry.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::protocol::ProtocolViolation;

/// How one wait for a reply ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Reply { len: usize },
    Timeout,
    /// A datagram arrived from somewhere other than the queried server.
    Foreign { from: SocketAddr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// Zero-based.
    pub number: u32,
    pub bytes_sent: usize,
    pub elapsed: Duration,
    pub outcome: Outcome,
}

/// Reported to the caller of [`UdpTransport::exchange`] as attempts run.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    Sending { number: u32, bytes: usize },
    Finished(&'a Attempt),
}

/// Owns the socket for the lifetime of a resolver. Dropping it closes the
/// socket on every path.
#[derive(Debug)]
pub struct UdpTransport {
    socket: UdpSocket,
    server: SocketAddr,
    max_attempts: u32,
}

impl UdpTransport {
    pub fn bind(config: &ResolverConfig, server: Ipv4Addr) -> Result<UdpTransport> {
        config.validate()?;

        let socket = UdpSocket::bind(config.bind_addr).map_err(|e| Error::network("bind", e))?;
        socket
            .set_read_timeout(Some(config.timeout))
            .map_err(|e| Error::network("set_read_timeout", e))?;

        Ok(UdpTransport {
            socket,
            server: config.server_addr(server),
            max_attempts: config.max_attempts,
        })
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| Error::network("local_addr", e))
    }

    pub fn send(&self, packet: &[u8]) -> Result<usize> {
        self.socket
            .send_to(packet, self.server)
            .map_err(|e| Error::network("send", e))
    }

    /// Blocks for at most the configured timeout.
    pub fn wait_for_reply(&self, buf: &mut [u8]) -> Result<Outcome> {
        match self.socket.recv_from(buf) {
            Ok((_, from)) if from != self.server => Ok(Outcome::Foreign { from }),
            Ok((len, _)) => Ok(Outcome::Reply { len }),
            Err(e) if is_timeout(&e) => Ok(Outcome::Timeout),
            Err(e) => Err(Error::network("receive", e)),
        }
    }

    /// Sends `packet` until a reply from the server lands in `buf` or the
    /// attempts run out. The same bytes, and so the same transaction ID, go
    /// out on every attempt. A foreign datagram uses up the attempt it
    /// arrived in. Returns the reply length.
    pub fn exchange<F>(&self, packet: &[u8], buf: &mut [u8], mut progress: F) -> Result<usize>
    where
        F: FnMut(Progress<'_>) -> Result<()>,
    {
        let mut last_foreign = None;

        for number in 0..self.max_attempts {
            progress(Progress::Sending {
                number,
                bytes: packet.len(),
            })?;

            let started = Instant::now();
            let bytes_sent = self.send(packet)?;
            let outcome = self.wait_for_reply(buf)?;
            let attempt = Attempt {
                number,
                bytes_sent,
                elapsed: started.elapsed(),
                outcome,
            };

            match outcome {
                Outcome::Reply { len } => {
                    debug!(attempt = number, len, elapsed = ?attempt.elapsed, "reply received");
                    progress(Progress::Finished(&attempt))?;
                    return Ok(len);
                }
                Outcome::Timeout => {
                    debug!(attempt = number, elapsed = ?attempt.elapsed, "timed out");
                    last_foreign = None;
                }
                Outcome::Foreign { from } => {
                    warn!(
                        attempt = number,
                        expected = %self.server,
                        %from,
                        "discarding datagram from unexpected source"
                    );
                    last_foreign = Some(from);
                }
            }
            progress(Progress::Finished(&attempt))?;
        }

        match last_foreign {
            Some(received) => Err(ProtocolViolation::SenderMismatch {
                expected: self.server,
                received,
            }
            .into()),
            None => Err(Error::NoReply {
                attempts: self.max_attempts,
            }),
        }
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

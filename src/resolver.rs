//! One query, one server: build, exchange, validate, report.

use std::io::Write;
use std::net::Ipv4Addr;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::protocol::query::{QueryKind, QueryPacket};
use crate::protocol::response::Response;
use crate::protocol::{Header, MAX_DNS_SIZE};
use crate::transport::{Outcome, Progress, UdpTransport};

pub struct Resolver {
    transport: UdpTransport,
    server: Ipv4Addr,
}

impl Resolver {
    pub fn new(server: Ipv4Addr, config: &ResolverConfig) -> Result<Resolver> {
        let transport = UdpTransport::bind(config, server)?;
        Ok(Resolver { transport, server })
    }

    /// Resolves `lookup` and writes the report to `out` as it goes. Records
    /// are only written once the whole response has validated.
    pub fn resolve<W: Write>(
        &self,
        kind: QueryKind,
        lookup: &str,
        out: &mut W,
    ) -> Result<Response> {
        writeln!(out, "Lookup  : {}", lookup)?;
        let packet = QueryPacket::build(kind, lookup)?;
        writeln!(
            out,
            "Query   : {}, type {}, TXID 0x{:04X}",
            packet.query_name(),
            kind.qtype(),
            packet.transaction_id()
        )?;
        writeln!(out, "Server  : {}", self.server)?;
        writeln!(out, "********************************")?;

        self.exchange(&packet, out)
    }

    fn exchange<W: Write>(&self, packet: &QueryPacket, out: &mut W) -> Result<Response> {
        debug!(
            server = %self.transport.server(),
            txid = packet.transaction_id(),
            bytes = packet.len(),
            "sending query"
        );

        let mut buf = [0u8; MAX_DNS_SIZE];
        let len = self
            .transport
            .exchange(packet.as_bytes(), &mut buf, |progress| {
                match progress {
                    Progress::Sending { number, bytes } => {
                        write!(out, "Attempt {} with {} bytes... ", number, bytes)?;
                        out.flush()?;
                    }
                    Progress::Finished(attempt) => {
                        let ms = attempt.elapsed.as_millis();
                        match attempt.outcome {
                            Outcome::Reply { len } => {
                                writeln!(out, "response in {} ms with {} bytes", ms, len)?
                            }
                            Outcome::Timeout => writeln!(out, "timeout in {} ms", ms)?,
                            Outcome::Foreign { from } => {
                                writeln!(out, "discarded reply from {} in {} ms", from, ms)?
                            }
                        }
                    }
                }
                Ok(())
            })?;
        let reply = &buf[..len];

        let header = Header::parse(reply)?;
        writeln!(out, "  {}", header)?;

        let response = Response::from_header(header, reply, packet.transaction_id())?;
        writeln!(
            out,
            "  succeeded with Rcode = {}",
            response.header.result_code().code()
        )?;
        response.print(out)?;

        if response.skipped > 0 {
            debug!(skipped = response.skipped, "records of other types not shown");
        }
        Ok(response)
    }
}

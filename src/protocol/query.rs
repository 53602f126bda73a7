use std::fmt;
use std::net::Ipv4Addr;

use rand::Rng;

use super::name::{encode_name, encode_reverse_name};
use super::{
    Header, QuestionHeader, CLASS_INET, HEADER_SIZE, QUESTION_HEADER_SIZE, TYPE_A,
    TYPE_PTR,
};
use crate::error::Result;

/// Forward lookups ask for A records, reverse lookups for PTR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Forward,
    Reverse,
}

impl QueryKind {
    /// IPv4 literals get a reverse lookup, anything else a forward one.
    pub fn for_lookup(lookup: &str) -> QueryKind {
        if lookup.parse::<Ipv4Addr>().is_ok() {
            QueryKind::Reverse
        } else {
            QueryKind::Forward
        }
    }

    pub fn qtype(self) -> u16 {
        match self {
            QueryKind::Forward => TYPE_A,
            QueryKind::Reverse => TYPE_PTR,
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueryKind::Forward => f.write_str("A"),
            QueryKind::Reverse => f.write_str("PTR"),
        }
    }
}

/// A fully encoded outbound query. Built once per resolution and resent
/// unchanged on every attempt.
#[derive(Debug, Clone)]
pub struct QueryPacket {
    header: Header,
    kind: QueryKind,
    query_name: String,
    bytes: Vec<u8>,
}

impl QueryPacket {
    pub fn build(kind: QueryKind, lookup: &str) -> Result<QueryPacket> {
        //Zero is never handed out
        let transaction_id = rand::thread_rng().gen_range(1..=u16::MAX);
        QueryPacket::with_transaction_id(kind, lookup, transaction_id)
    }

    pub fn with_transaction_id(
        kind: QueryKind,
        lookup: &str,
        transaction_id: u16,
    ) -> Result<QueryPacket> {
        let (query_name, encoded_name) = match kind {
            QueryKind::Forward => (lookup.to_owned(), encode_name(lookup)?),
            QueryKind::Reverse => encode_reverse_name(lookup)?,
        };

        let header = Header::query(transaction_id);
        let question = QuestionHeader {
            qtype: kind.qtype(),
            qclass: CLASS_INET,
        };

        // Names are capped at 255 bytes, so a query always fits in 512.
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(HEADER_SIZE + encoded_name.len() + QUESTION_HEADER_SIZE)?;
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(&encoded_name);
        bytes.extend_from_slice(&question.to_bytes());

        Ok(QueryPacket {
            header,
            kind,
            query_name,
            bytes,
        })
    }

    pub fn transaction_id(&self) -> u16 {
        self.header.transaction_id
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// The name actually asked for, e.g. `1.2.168.192.in-addr.arpa`.
    pub fn query_name(&self) -> &str {
        &self.query_name
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

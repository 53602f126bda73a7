//! DNS wire format: fixed headers, constants and the codecs built on them.
//!
//! Every multi-byte field is read and written explicitly in network byte
//! order at a known offset. Nothing is overlaid onto the raw buffer, so a
//! bounds check is the only gate in front of any read.

pub mod name;
pub mod query;
pub mod response;

use std::fmt;
use std::net::SocketAddr;

use byteorder::{ByteOrder, NetworkEndian};
use thiserror::Error;

pub const HEADER_SIZE: usize = 12;
pub const QUESTION_HEADER_SIZE: usize = 4;
pub const RECORD_HEADER_SIZE: usize = 10;

/// Largest message handled over UDP (no EDNS0).
pub const MAX_DNS_SIZE: usize = 512;
pub const DNS_PORT: u16 = 53;
pub const CLASS_INET: u16 = 1;

pub const TYPE_A: u16 = 1;
pub const TYPE_NS: u16 = 2;
pub const TYPE_CNAME: u16 = 5;
pub const TYPE_PTR: u16 = 12;
pub const TYPE_HINFO: u16 = 13;
pub const TYPE_MX: u16 = 15;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_AXFR: u16 = 252;
pub const TYPE_ANY: u16 = 255;

pub const OPCODE_QUERY: u8 = 0;

const FLAG_QR: u16 = 0x8000;
const FLAG_AA: u16 = 0x0400;
const FLAG_TC: u16 = 0x0200;
const FLAG_RD: u16 = 0x0100;
const FLAG_RA: u16 = 0x0080;
const OPCODE_SHIFT: u16 = 11;
const OPCODE_MASK: u16 = 0x0F;
const RCODE_MASK: u16 = 0x000F;

/// A response that cannot be trusted or cannot be walked safely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("invalid reply: smaller than fixed header ({len} bytes)")]
    TruncatedHeader { len: usize },

    #[error("invalid reply: TXID mismatch, sent {sent:04X}, received {received:04X}")]
    TxidMismatch { sent: u16, received: u16 },

    #[error(
        "invalid reply: response not received on the same IP/port as requested server \
         (expected {expected}, got {received})"
    )]
    SenderMismatch {
        expected: SocketAddr,
        received: SocketAddr,
    },

    #[error("invalid section: not enough records in {section}")]
    NotEnoughRecords { section: &'static str },

    #[error("invalid record: truncated name at offset {offset}")]
    TruncatedName { offset: usize },

    #[error("invalid record: truncated jump offset at offset {offset}")]
    TruncatedJumpOffset { offset: usize },

    #[error("invalid record: jump into fixed header (offset {offset} -> {target})")]
    JumpIntoHeader { offset: usize, target: usize },

    #[error("invalid record: jump beyond packet boundary (offset {offset} -> {target})")]
    JumpBeyondPacket { offset: usize, target: usize },

    #[error("invalid record: jump loop at offset {offset}")]
    JumpLoop { offset: usize },

    #[error("invalid record: reserved label type 0x{byte:02X} at offset {offset}")]
    InvalidLabelType { offset: usize, byte: u8 },

    #[error("invalid record: truncated fixed query header at offset {offset}")]
    TruncatedQuestion { offset: usize },

    #[error("invalid record: truncated fixed RR header at offset {offset}")]
    TruncatedRecordHeader { offset: usize },

    #[error("invalid record: RR value length {length} beyond packet at offset {offset}")]
    RecordValueBeyondPacket { offset: usize, length: u16 },

    #[error("invalid record: A value of {length} bytes at offset {offset}")]
    InvalidAddressLength { offset: usize, length: u16 },

    #[error("invalid record: name value runs past RR value length at offset {offset}")]
    RecordNameBeyondValue { offset: usize },
}

/// Server-reported outcome carried in the low four bits of the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    NoError,
    FormatError,
    ServerFailure,
    NameError,
    NotImplemented,
    Refused,
    Other(u8),
}

impl ResultCode {
    pub fn code(self) -> u8 {
        match self {
            ResultCode::NoError => 0,
            ResultCode::FormatError => 1,
            ResultCode::ServerFailure => 2,
            ResultCode::NameError => 3,
            ResultCode::NotImplemented => 4,
            ResultCode::Refused => 5,
            ResultCode::Other(code) => code,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ResultCode::NoError => "NOERROR",
            ResultCode::FormatError => "FORMERR",
            ResultCode::ServerFailure => "SERVFAIL",
            ResultCode::NameError => "NXDOMAIN",
            ResultCode::NotImplemented => "NOTIMP",
            ResultCode::Refused => "REFUSED",
            ResultCode::Other(_) => "UNKNOWN",
        }
    }
}

impl From<u8> for ResultCode {
    fn from(code: u8) -> ResultCode {
        match code {
            0 => ResultCode::NoError,
            1 => ResultCode::FormatError,
            2 => ResultCode::ServerFailure,
            3 => ResultCode::NameError,
            4 => ResultCode::NotImplemented,
            5 => ResultCode::Refused,
            other => ResultCode::Other(other),
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Record types this client decodes. Everything else is skipped by length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Ns,
    Cname,
    Ptr,
}

impl RecordType {
    pub fn from_code(code: u16) -> Option<RecordType> {
        match code {
            TYPE_A => Some(RecordType::A),
            TYPE_NS => Some(RecordType::Ns),
            TYPE_CNAME => Some(RecordType::Cname),
            TYPE_PTR => Some(RecordType::Ptr),
            _ => None,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            RecordType::A => TYPE_A,
            RecordType::Ns => TYPE_NS,
            RecordType::Cname => TYPE_CNAME,
            RecordType::Ptr => TYPE_PTR,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            RecordType::A => "A",
            RecordType::Ns => "NS",
            RecordType::Cname => "CNAME",
            RecordType::Ptr => "PTR",
        })
    }
}

/// The 12-byte message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub transaction_id: u16,
    pub flags: u16,
    pub question_rr_count: u16,
    pub answer_rr_count: u16,
    pub authority_rr_count: u16,
    pub additional_rr_count: u16,
}

impl Header {
    /// Standard recursive query header asking one question.
    pub fn query(transaction_id: u16) -> Header {
        Header {
            transaction_id,
            //Set the recursive bit
            flags: FLAG_RD | (u16::from(OPCODE_QUERY) << OPCODE_SHIFT),
            question_rr_count: 1,
            answer_rr_count: 0,
            authority_rr_count: 0,
            additional_rr_count: 0,
        }
    }

    pub fn parse(buf: &[u8]) -> Result<Header, ProtocolViolation> {
        if buf.len() < HEADER_SIZE {
            return Err(ProtocolViolation::TruncatedHeader { len: buf.len() });
        }
        Ok(Header {
            transaction_id: NetworkEndian::read_u16(&buf[0..2]),
            flags: NetworkEndian::read_u16(&buf[2..4]),
            question_rr_count: NetworkEndian::read_u16(&buf[4..6]),
            answer_rr_count: NetworkEndian::read_u16(&buf[6..8]),
            authority_rr_count: NetworkEndian::read_u16(&buf[8..10]),
            additional_rr_count: NetworkEndian::read_u16(&buf[10..12]),
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        NetworkEndian::write_u16(&mut buf[0..2], self.transaction_id);
        NetworkEndian::write_u16(&mut buf[2..4], self.flags);
        NetworkEndian::write_u16(&mut buf[4..6], self.question_rr_count);
        NetworkEndian::write_u16(&mut buf[6..8], self.answer_rr_count);
        NetworkEndian::write_u16(&mut buf[8..10], self.authority_rr_count);
        NetworkEndian::write_u16(&mut buf[10..12], self.additional_rr_count);
        buf
    }

    pub fn is_response(&self) -> bool {
        self.flags & FLAG_QR != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.flags >> OPCODE_SHIFT) & OPCODE_MASK) as u8
    }

    pub fn is_authoritative(&self) -> bool {
        self.flags & FLAG_AA != 0
    }

    pub fn is_truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    pub fn recursion_desired(&self) -> bool {
        self.flags & FLAG_RD != 0
    }

    pub fn recursion_available(&self) -> bool {
        self.flags & FLAG_RA != 0
    }

    pub fn result_code(&self) -> ResultCode {
        ResultCode::from((self.flags & RCODE_MASK) as u8)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "TXID 0x{:04X}, flags 0x{:04X}, questions {}, answers {}, authority {}, additional {}",
            self.transaction_id,
            self.flags,
            self.question_rr_count,
            self.answer_rr_count,
            self.authority_rr_count,
            self.additional_rr_count
        )
    }
}

/// Type and class following a question name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionHeader {
    pub qtype: u16,
    pub qclass: u16,
}

impl QuestionHeader {
    pub fn parse(buf: &[u8], offset: usize) -> Result<QuestionHeader, ProtocolViolation> {
        let fixed = buf
            .get(offset..offset + QUESTION_HEADER_SIZE)
            .ok_or(ProtocolViolation::TruncatedQuestion { offset })?;
        Ok(QuestionHeader {
            qtype: NetworkEndian::read_u16(&fixed[0..2]),
            qclass: NetworkEndian::read_u16(&fixed[2..4]),
        })
    }

    pub fn to_bytes(&self) -> [u8; QUESTION_HEADER_SIZE] {
        let mut buf = [0u8; QUESTION_HEADER_SIZE];
        NetworkEndian::write_u16(&mut buf[0..2], self.qtype);
        NetworkEndian::write_u16(&mut buf[2..4], self.qclass);
        buf
    }
}

/// Fixed part of a resource record following its owner name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub rr_type: u16,
    pub rr_class: u16,
    pub ttl: u32,
    pub length: u16,
}

impl RecordHeader {
    pub fn parse(buf: &[u8], offset: usize) -> Result<RecordHeader, ProtocolViolation> {
        let fixed = buf
            .get(offset..offset + RECORD_HEADER_SIZE)
            .ok_or(ProtocolViolation::TruncatedRecordHeader { offset })?;
        Ok(RecordHeader {
            rr_type: NetworkEndian::read_u16(&fixed[0..2]),
            rr_class: NetworkEndian::read_u16(&fixed[2..4]),
            ttl: NetworkEndian::read_u32(&fixed[4..8]),
            length: NetworkEndian::read_u16(&fixed[8..10]),
        })
    }
}

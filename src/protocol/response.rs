use std::fmt;
use std::io::{self, Write};
use std::net::Ipv4Addr;

use tracing::debug;

use super::name::decode_name;
use super::{
    Header, ProtocolViolation, QuestionHeader, RecordHeader, RecordType, ResultCode, HEADER_SIZE,
    QUESTION_HEADER_SIZE, RECORD_HEADER_SIZE,
};
use crate::error::{Error, Result};

type Walk<T> = std::result::Result<T, ProtocolViolation>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Section::Question => "questions",
            Section::Answer => "answers",
            Section::Authority => "authority",
            Section::Additional => "additional",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub header: QuestionHeader,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    /// NS, CNAME and PTR targets.
    Name(String),
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordData::A(addr) => addr.fmt(f),
            RecordData::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: String,
    pub rtype: RecordType,
    pub header: RecordHeader,
    pub data: RecordData,
}

impl Record {
    pub fn ttl(&self) -> u32 {
        self.header.ttl
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {} TTL = {}",
            self.name, self.rtype, self.data, self.header.ttl
        )
    }
}

/// A validated response with every decodable record pulled out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additional: Vec<Record>,
    /// Well-formed records of types this client does not decode.
    pub skipped: usize,
}

impl Response {
    /// Validates `buf` against the query that carried `sent_id` and walks
    /// every section. The first bounds violation aborts the walk.
    pub fn parse(buf: &[u8], sent_id: u16) -> Result<Response> {
        let header = Header::parse(buf)?;
        Response::from_header(header, buf, sent_id)
    }

    /// Same as [`Response::parse`] for a caller that already holds the
    /// header of `buf`.
    pub fn from_header(header: Header, buf: &[u8], sent_id: u16) -> Result<Response> {
        if header.transaction_id != sent_id {
            return Err(ProtocolViolation::TxidMismatch {
                sent: sent_id,
                received: header.transaction_id,
            }
            .into());
        }

        let result_code = header.result_code();
        if result_code != ResultCode::NoError {
            return Err(Error::ServerFailure(result_code));
        }

        let mut walker = Walker {
            message: buf,
            cursor: HEADER_SIZE,
            skipped: 0,
        };

        let mut questions = Vec::new();
        for _ in 0..header.question_rr_count {
            questions.push(walker.question()?);
        }
        let answers = walker.records(header.answer_rr_count, Section::Answer)?;
        let authority = walker.records(header.authority_rr_count, Section::Authority)?;
        let additional = walker.records(header.additional_rr_count, Section::Additional)?;

        Ok(Response {
            header,
            questions,
            answers,
            authority,
            additional,
            skipped: walker.skipped,
        })
    }

    pub fn records(&self, section: Section) -> &[Record] {
        match section {
            Section::Question => &[],
            Section::Answer => &self.answers,
            Section::Authority => &self.authority,
            Section::Additional => &self.additional,
        }
    }

    /// Writes each section under its banner. Banners follow the header
    /// counts; skipped records get no line.
    pub fn print<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.header.question_rr_count > 0 {
            banner(out, Section::Question)?;
        }
        for question in &self.questions {
            writeln!(
                out,
                "\t{} type {} class {}",
                question.name, question.header.qtype, question.header.qclass
            )?;
        }

        let sections = [
            (Section::Answer, self.header.answer_rr_count),
            (Section::Authority, self.header.authority_rr_count),
            (Section::Additional, self.header.additional_rr_count),
        ];
        for (section, count) in sections {
            if count > 0 {
                banner(out, section)?;
            }
            for record in self.records(section) {
                writeln!(out, "\t{}", record)?;
            }
        }
        Ok(())
    }
}

fn banner<W: Write>(out: &mut W, section: Section) -> io::Result<()> {
    writeln!(out, "------------ [{}] ----------", section.label())
}

struct Walker<'a> {
    message: &'a [u8],
    cursor: usize,
    skipped: usize,
}

impl<'a> Walker<'a> {
    fn ensure_more(&self, section: Section) -> Walk<()> {
        if self.cursor >= self.message.len() {
            return Err(ProtocolViolation::NotEnoughRecords {
                section: section.label(),
            });
        }
        Ok(())
    }

    fn question(&mut self) -> Walk<Question> {
        self.ensure_more(Section::Question)?;

        let (name, consumed) = decode_name(self.message, self.cursor)?;
        self.cursor += consumed;

        let header = QuestionHeader::parse(self.message, self.cursor)?;
        self.cursor += QUESTION_HEADER_SIZE;

        Ok(Question { name, header })
    }

    fn records(&mut self, count: u16, section: Section) -> Walk<Vec<Record>> {
        let mut records = Vec::new();
        for _ in 0..count {
            if let Some(record) = self.record(section)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn record(&mut self, section: Section) -> Walk<Option<Record>> {
        self.ensure_more(section)?;

        let (name, consumed) = decode_name(self.message, self.cursor)?;
        self.cursor += consumed;

        let header = RecordHeader::parse(self.message, self.cursor)?;
        let value_start = self.cursor + RECORD_HEADER_SIZE;
        let value_end = value_start + usize::from(header.length);
        if value_end > self.message.len() {
            return Err(ProtocolViolation::RecordValueBeyondPacket {
                offset: self.cursor,
                length: header.length,
            });
        }

        let rtype = match RecordType::from_code(header.rr_type) {
            Some(rtype) => rtype,
            None => {
                debug!(
                    section = section.label(),
                    rr_type = header.rr_type,
                    length = header.length,
                    "skipping record"
                );
                self.skipped += 1;
                self.cursor = value_end;
                return Ok(None);
            }
        };

        let data = match rtype {
            RecordType::A => {
                if header.length != 4 {
                    return Err(ProtocolViolation::InvalidAddressLength {
                        offset: value_start,
                        length: header.length,
                    });
                }
                let raw = &self.message[value_start..value_end];
                RecordData::A(Ipv4Addr::new(raw[0], raw[1], raw[2], raw[3]))
            }
            RecordType::Ns | RecordType::Cname | RecordType::Ptr => {
                let (target, consumed) = decode_name(self.message, value_start)?;
                if consumed > usize::from(header.length) {
                    return Err(ProtocolViolation::RecordNameBeyondValue {
                        offset: value_start,
                    });
                }
                RecordData::Name(target)
            }
        };
        self.cursor = value_end;

        Ok(Some(Record {
            name,
            rtype,
            header,
            data,
        }))
    }
}

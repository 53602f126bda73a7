use std::net::Ipv4Addr;

use super::{ProtocolViolation, HEADER_SIZE};
use crate::error::{Error, Result};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// Pointer chains of this many hops are treated as a loop.
pub const MAX_JUMPS: usize = 10;

const POINTER_MASK: u8 = 0xC0;
const REVERSE_SUFFIX: &str = ".in-addr.arpa";

//Domain names are sent with "length" separators and are null-terminated
//The domain 'microsoft.com' becomes "0x09microsoft0x03com0x00"
pub fn encode_name(name: &str) -> Result<Vec<u8>> {
    let trimmed = name.strip_suffix('.').unwrap_or(name);
    if trimmed.is_empty() {
        return Err(Error::format(name, "empty name"));
    }

    //One length byte per label, the label bytes, and the null byte
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(trimmed.len() + 2)?;

    for label in trimmed.split('.') {
        if label.is_empty() {
            return Err(Error::format(name, "empty label"));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(Error::format(name, "label longer than 63 bytes"));
        }
        if !label.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(Error::format(name, "label is not printable ASCII"));
        }
        buffer.push(label.len() as u8);
        buffer.extend_from_slice(label.as_bytes());
    }
    buffer.push(0);

    if buffer.len() > MAX_NAME_LEN {
        return Err(Error::format(name, "name longer than 255 bytes"));
    }
    Ok(buffer)
}

/// `192.168.2.1` becomes `1.2.168.192.in-addr.arpa`.
pub fn reverse_name(addr: Ipv4Addr) -> String {
    let [a, b, c, d] = addr.octets();
    format!("{}.{}.{}.{}{}", d, c, b, a, REVERSE_SUFFIX)
}

/// Parses `lookup` as an IPv4 literal and encodes its reverse-lookup name.
/// Returns the dotted form alongside the wire form.
pub fn encode_reverse_name(lookup: &str) -> Result<(String, Vec<u8>)> {
    let addr: Ipv4Addr = lookup
        .parse()
        .map_err(|_| Error::format(lookup, "not an IPv4 address"))?;
    let name = reverse_name(addr);
    let encoded = encode_name(&name)?;
    Ok((name, encoded))
}

/// Decodes the name starting at `offset` in `message`.
///
/// Returns the dot-joined labels and the number of bytes the name occupies
/// at `offset` itself. Once a compression pointer is followed, the bytes read
/// at the pointer target do not count, so the caller can advance its own
/// cursor by the returned length regardless of how many pointers were taken.
///
/// Fails on any read past the end of `message`, on a pointer into the fixed
/// header or past the end, on a reserved label type, and once a chain reaches
/// [`MAX_JUMPS`] hops.
pub fn decode_name(
    message: &[u8],
    offset: usize,
) -> std::result::Result<(String, usize), ProtocolViolation> {
    let mut name = String::new();
    let mut pos = offset;
    let mut consumed = None;
    let mut jumps = 0;

    loop {
        let len_byte = *message
            .get(pos)
            .ok_or(ProtocolViolation::TruncatedName { offset: pos })?;

        match len_byte {
            0 => {
                let consumed = consumed.unwrap_or(pos + 1 - offset);
                return Ok((name, consumed));
            }
            byte if byte & POINTER_MASK == POINTER_MASK => {
                let low = *message
                    .get(pos + 1)
                    .ok_or(ProtocolViolation::TruncatedJumpOffset { offset: pos })?;

                jumps += 1;
                if jumps >= MAX_JUMPS {
                    return Err(ProtocolViolation::JumpLoop { offset: pos });
                }

                let target = (usize::from(byte & !POINTER_MASK) << 8) | usize::from(low);
                if target < HEADER_SIZE {
                    return Err(ProtocolViolation::JumpIntoHeader {
                        offset: pos,
                        target,
                    });
                }
                if target >= message.len() {
                    return Err(ProtocolViolation::JumpBeyondPacket {
                        offset: pos,
                        target,
                    });
                }

                if consumed.is_none() {
                    consumed = Some(pos + 2 - offset);
                }
                pos = target;
            }
            byte if usize::from(byte) > MAX_LABEL_LEN => {
                return Err(ProtocolViolation::InvalidLabelType { offset: pos, byte });
            }
            len => {
                let start = pos + 1;
                let end = start + usize::from(len);
                let label = message
                    .get(start..end)
                    .ok_or(ProtocolViolation::TruncatedName { offset: pos })?;
                if !name.is_empty() {
                    name.push('.');
                }
                push_label(&mut name, label);
                pos = end;
            }
        }
    }
}

/// Printable ASCII goes through as-is, any other byte as `\DDD`.
fn push_label(name: &mut String, label: &[u8]) {
    for &byte in label {
        if byte.is_ascii_graphic() {
            name.push(char::from(byte));
        } else {
            name.push('\\');
            name.push(char::from(b'0' + byte / 100));
            name.push(char::from(b'0' + byte / 10 % 10));
            name.push(char::from(b'0' + byte % 10));
        }
    }
}

use std::net::{Ipv4Addr, UdpSocket};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nslookup::protocol::{ProtocolViolation, ResultCode, HEADER_SIZE};
use nslookup::protocol::response::RecordData;
use nslookup::{Error, QueryKind, Resolver, ResolverConfig};

fn config(port: u16) -> ResolverConfig {
    ResolverConfig {
        port,
        timeout: Duration::from_millis(250),
        max_attempts: 3,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
    }
}

/// Answers the first query it sees with whatever `respond` builds from it.
fn spawn_server<F>(respond: F) -> (u16, JoinHandle<Vec<u8>>)
where
    F: FnOnce(&[u8]) -> Vec<u8> + Send + 'static,
{
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = socket.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let mut buf = [0u8; 512];
        let (len, from) = socket.recv_from(&mut buf).unwrap();
        let query = buf[..len].to_vec();
        socket.send_to(&respond(&query), from).unwrap();
        query
    });
    (port, handle)
}

/// Echoes the query's id and question, then appends `answers`.
fn reply(query: &[u8], flags: u16, answer_count: u16, answers: &[u8]) -> Vec<u8> {
    let mut message = query[..2].to_vec();
    message.extend_from_slice(&flags.to_be_bytes());
    message.extend_from_slice(&[0, 1]);
    message.extend_from_slice(&answer_count.to_be_bytes());
    message.extend_from_slice(&[0, 0, 0, 0]);
    message.extend_from_slice(&query[HEADER_SIZE..]);
    message.extend_from_slice(answers);
    message
}

fn record(rtype: u16, ttl: u32, value: &[u8]) -> Vec<u8> {
    let mut rr = vec![0xC0, 12];
    rr.extend_from_slice(&rtype.to_be_bytes());
    rr.extend_from_slice(&[0, 1]);
    rr.extend_from_slice(&ttl.to_be_bytes());
    rr.extend_from_slice(&(value.len() as u16).to_be_bytes());
    rr.extend_from_slice(value);
    rr
}

#[test]
fn prints_a_record_answer() {
    let (port, server) = spawn_server(|query| {
        reply(query, 0x8180, 1, &record(1, 3600, &[93, 184, 216, 34]))
    });
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    let response = resolver
        .resolve(QueryKind::Forward, "example.com", &mut out)
        .unwrap();
    server.join().unwrap();

    assert_eq!(response.answers.len(), 1);
    assert_eq!(
        response.answers[0].data,
        RecordData::A(Ipv4Addr::new(93, 184, 216, 34))
    );
    assert_eq!(response.answers[0].ttl(), 3600);

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Lookup  : example.com\nQuery   : example.com, type 1, TXID 0x"));
    assert!(text.contains("Attempt 0 with 29 bytes... response in "));
    assert!(text.contains("  succeeded with Rcode = 0\n"));
    assert!(text.contains("\texample.com type 1 class 1\n"));
    assert!(text.ends_with(
        "------------ [answers] ----------\n\texample.com A 93.184.216.34 TTL = 3600\n"
    ));
}

#[test]
fn reverse_lookup_prints_ptr() {
    let target = [6, b'r', b'o', b'u', b't', b'e', b'r', 3, b'l', b'a', b'n', 0];
    let (port, server) =
        spawn_server(move |query| reply(query, 0x8180, 1, &record(12, 60, &target)));
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    resolver
        .resolve(QueryKind::Reverse, "192.168.2.1", &mut out)
        .unwrap();
    let query = server.join().unwrap();

    // 1.2.168.192.in-addr.arpa, type PTR
    assert_eq!(query[HEADER_SIZE], 1);
    assert_eq!(&query[query.len() - 4..], &[0, 12, 0, 1]);

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Query   : 1.2.168.192.in-addr.arpa, type 12, TXID 0x"));
    assert!(text.contains("\t1.2.168.192.in-addr.arpa PTR router.lan TTL = 60\n"));
}

#[test]
fn txid_mismatch_prints_no_records() {
    let (port, server) = spawn_server(|query| {
        let mut message = reply(query, 0x8180, 1, &record(1, 3600, &[10, 0, 0, 1]));
        let id = u16::from_be_bytes([query[0], query[1]]).wrapping_add(1);
        message[..2].copy_from_slice(&id.to_be_bytes());
        message
    });
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    let result = resolver.resolve(QueryKind::Forward, "example.com", &mut out);
    let query = server.join().unwrap();

    match result {
        Err(Error::Protocol(ProtocolViolation::TxidMismatch { sent, received })) => {
            assert_eq!(sent, u16::from_be_bytes([query[0], query[1]]));
            assert_eq!(received, sent.wrapping_add(1));
        }
        other => panic!("unexpected {:?}", other.map(|r| r.answers)),
    }
    let text = String::from_utf8(out).unwrap();
    assert!(!text.contains("[answers]"));
    assert!(!text.contains("10.0.0.1"));
}

#[test]
fn three_timeouts_resend_identical_query() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    server
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = server.local_addr().unwrap().port();
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    let result = resolver.resolve(QueryKind::Forward, "example.com", &mut out);
    assert!(matches!(result, Err(Error::NoReply { attempts: 3 })));

    let mut packets = Vec::new();
    let mut buf = [0u8; 512];
    for _ in 0..3 {
        let (len, _) = server.recv_from(&mut buf).unwrap();
        packets.push(buf[..len].to_vec());
    }
    assert!(packets.iter().all(|p| p == &packets[0]));

    server
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    assert!(server.recv_from(&mut buf).is_err(), "a fourth packet was sent");

    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.matches("timeout in ").count(), 3);
    assert!(text.contains("Attempt 2 with "));
}

#[test]
fn server_failure_is_reported_with_code() {
    let (port, server) = spawn_server(|query| reply(query, 0x8183, 0, &[]));
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    let result = resolver.resolve(QueryKind::Forward, "missing.example", &mut out);
    server.join().unwrap();

    match result {
        Err(Error::ServerFailure(code)) => {
            assert_eq!(code, ResultCode::NameError);
        }
        other => panic!("unexpected {:?}", other.map(|r| r.answers)),
    }
}

#[test]
fn short_reply_is_a_truncated_header() {
    let (port, server) = spawn_server(|query| query[..5].to_vec());
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    let result = resolver.resolve(QueryKind::Forward, "example.com", &mut out);
    server.join().unwrap();

    assert!(matches!(
        result,
        Err(Error::Protocol(ProtocolViolation::TruncatedHeader { len: 5 }))
    ));
}

#[test]
fn bad_hostname_never_touches_the_network() {
    let server = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = server.local_addr().unwrap().port();
    let resolver = Resolver::new(Ipv4Addr::LOCALHOST, &config(port)).unwrap();

    let mut out = Vec::new();
    let result = resolver.resolve(QueryKind::Forward, "bad..name", &mut out);
    assert!(matches!(result, Err(Error::Format { .. })));

    server
        .set_read_timeout(Some(Duration::from_millis(100)))
        .unwrap();
    let mut buf = [0u8; 512];
    assert!(server.recv_from(&mut buf).is_err());
}

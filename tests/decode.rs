mod common;

use common::*;
use dnas::dns::types::DnsRecordType;
use dnas::dns::{CapturedRecord, LinkType, Section, decode_frame, decode_message};
use dnas::error::{DecodeError, MalformedReason};
use std::net::Ipv4Addr;

fn cname_chain() -> Vec<u8> {
    dns_message(
        0x1234,
        true,
        "www.example.com",
        TYPE_A,
        &[
            Answer::cname("edge.example.net", 120),
            Answer::a(Ipv4Addr::new(93, 184, 216, 34), 60),
        ],
    )
}

#[test]
fn header_counts_match_parsed_entries() {
    for n in 0..5u8 {
        let answers: Vec<Answer> = (0..n)
            .map(|i| Answer::a(Ipv4Addr::new(192, 0, 2, i), 30))
            .collect();
        let message = decode_message(&dns_message(7, true, "example.com", TYPE_A, &answers)).unwrap();

        assert_eq!(message.header.qd_count as usize, message.questions.len());
        assert_eq!(message.header.an_count as usize, n as usize);
        assert_eq!(message.records.len(), n as usize);
        assert!(message.records.iter().all(|rr| rr.section == Section::Answer));
    }
}

#[test]
fn every_truncation_is_malformed() {
    let message = cname_chain();
    assert!(decode_message(&message).is_ok());

    for cut in 0..message.len() {
        let err = decode_message(&message[..cut]).unwrap_err();
        assert!(err.is_malformed(), "cut at {cut}: {err:?}");
    }
}

#[test]
fn every_frame_truncation_is_malformed() {
    let frame = response_frame(1, "example.com", TYPE_A, &[Answer::a(RESOLVER, 60)]);
    assert!(decode_frame(LinkType::Ethernet, &frame, 53).is_ok());

    for cut in 0..frame.len() {
        let err = decode_frame(LinkType::Ethernet, &frame[..cut], 53).unwrap_err();
        assert!(err.is_malformed(), "cut at {cut}: {err:?}");
    }
}

#[test]
fn self_referencing_owner_is_a_cycle() {
    let name = encode_name("loop.test");
    // Header, question name, type and class
    let answer_offset = 12 + name.len() + 4;
    let answer = Answer {
        owner: vec![0xC0, answer_offset as u8],
        rtype: TYPE_A,
        ttl: 1,
        rdata: vec![127, 0, 0, 1],
    };
    let message = dns_message(9, true, "loop.test", TYPE_A, &[answer]);

    assert_eq!(
        decode_message(&message).unwrap_err(),
        DecodeError::Malformed(MalformedReason::CompressionCycle)
    );
}

#[test]
fn cname_chain_renders_in_order() {
    let message = decode_message(&cname_chain()).unwrap();
    let rendered: Vec<(String, &str)> = message
        .records
        .iter()
        .map(|rr| (rr.rtype.name(), rr.data.as_str()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            ("CNAME".to_string(), "edge.example.net"),
            ("A".to_string(), "93.184.216.34"),
        ]
    );
    assert_eq!(message.records[0].name, "www.example.com");
}

#[test]
fn test_local_frame_becomes_one_record() {
    let frame = response_frame(0xbeef, "test.local", TYPE_A, &[Answer::a(Ipv4Addr::new(10, 0, 0, 1), 300)]);
    let packet = decode_frame(LinkType::Ethernet, &frame, 53).unwrap();
    assert_eq!(packet.source.to_string(), "10.0.0.1:53");
    assert_eq!(packet.destination.to_string(), "10.0.0.2:40000");

    let record = CapturedRecord::from_packet(packet, ts(), 1).unwrap();
    assert_eq!(record.question.name, "test.local");
    assert_eq!(record.question_name, "test.local");
    assert_eq!(record.question.qtype, DnsRecordType::A);
    assert!(record.response);
    assert_eq!(record.answers.len(), 1);
    assert_eq!(record.answers[0].data, "10.0.0.1");
    assert_eq!(record.answers[0].ttl, 300);
}

#[test]
fn queries_are_recorded_without_answers() {
    let frame = query_frame(2, "example.org", TYPE_AAAA);
    let packet = decode_frame(LinkType::Ethernet, &frame, 53).unwrap();
    let record = CapturedRecord::from_packet(packet, ts(), 1).unwrap();

    assert!(!record.response);
    assert_eq!(record.question.qtype, DnsRecordType::Aaaa);
    assert!(record.answers.is_empty());
}

#[test]
fn other_ports_are_not_dns() {
    let payload = dns_message(3, false, "example.com", TYPE_A, &[]);
    let frame = ethernet_udp(CLIENT, 40000, RESOLVER, 5353, &payload);

    assert!(matches!(
        decode_frame(LinkType::Ethernet, &frame, 53),
        Err(DecodeError::UnsupportedTransport(_))
    ));
    assert!(decode_frame(LinkType::Ethernet, &frame, 5353).is_ok());
}

#[test]
fn raw_link_starts_at_the_ip_header() {
    let frame = query_frame(4, "example.com", TYPE_A);
    // Drop the 14-byte Ethernet header
    let packet = decode_frame(LinkType::Raw, &frame[14..], 53).unwrap();
    assert_eq!(packet.message.questions[0].name, "example.com");
}

#[test]
fn vlan_tagged_frames_are_unwrapped() {
    let plain = query_frame(5, "example.com", TYPE_A);
    let mut tagged = plain[..12].to_vec();
    tagged.extend_from_slice(&[0x81, 0x00, 0x00, 0x64]);
    tagged.extend_from_slice(&plain[12..]);

    let packet = decode_frame(LinkType::Ethernet, &tagged, 53).unwrap();
    assert_eq!(packet.message.header.id, 5);
}

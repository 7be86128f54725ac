#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::net::Ipv4Addr;

pub const TYPE_A: u16 = 1;
pub const TYPE_CNAME: u16 = 5;
pub const TYPE_TXT: u16 = 16;
pub const TYPE_AAAA: u16 = 28;
pub const TYPE_OPT: u16 = 41;
pub const CLASS_IN: u16 = 1;

/// Pointer to the question name, which always starts right after the header.
pub const QUESTION_PTR: [u8; 2] = [0xC0, 0x0C];

pub fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
}

pub fn encode_name(name: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for label in name.split('.').filter(|l| !l.is_empty()) {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out
}

pub struct Answer {
    /// Encoded owner name, usually `QUESTION_PTR`
    pub owner: Vec<u8>,
    pub rtype: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl Answer {
    pub fn a(ip: Ipv4Addr, ttl: u32) -> Self {
        Self {
            owner: QUESTION_PTR.to_vec(),
            rtype: TYPE_A,
            ttl,
            rdata: ip.octets().to_vec(),
        }
    }

    pub fn cname(target: &str, ttl: u32) -> Self {
        Self {
            owner: QUESTION_PTR.to_vec(),
            rtype: TYPE_CNAME,
            ttl,
            rdata: encode_name(target),
        }
    }
}

/// DNS message with one question and `answers` in the answer section.
pub fn dns_message(id: u16, response: bool, name: &str, qtype: u16, answers: &[Answer]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&id.to_be_bytes());
    let flags: u16 = if response { 0x8180 } else { 0x0100 };
    out.extend_from_slice(&flags.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(answers.len() as u16).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());

    out.extend_from_slice(&encode_name(name));
    out.extend_from_slice(&qtype.to_be_bytes());
    out.extend_from_slice(&CLASS_IN.to_be_bytes());

    for answer in answers {
        out.extend_from_slice(&answer.owner);
        out.extend_from_slice(&answer.rtype.to_be_bytes());
        out.extend_from_slice(&CLASS_IN.to_be_bytes());
        out.extend_from_slice(&answer.ttl.to_be_bytes());
        out.extend_from_slice(&(answer.rdata.len() as u16).to_be_bytes());
        out.extend_from_slice(&answer.rdata);
    }
    out
}

/// Ethernet II / IPv4 / UDP frame around `payload`.
pub fn ethernet_udp(
    src: Ipv4Addr,
    src_port: u16,
    dst: Ipv4Addr,
    dst_port: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut frame = Vec::new();
    frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x01]);
    frame.extend_from_slice(&[0x02, 0, 0, 0, 0, 0x02]);
    frame.extend_from_slice(&0x0800u16.to_be_bytes());

    let udp_len = 8 + payload.len();
    let total_len = 20 + udp_len;
    frame.push(0x45);
    frame.push(0);
    frame.extend_from_slice(&(total_len as u16).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    // Don't fragment
    frame.extend_from_slice(&0x4000u16.to_be_bytes());
    frame.push(64);
    frame.push(17);
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(&src.octets());
    frame.extend_from_slice(&dst.octets());

    frame.extend_from_slice(&src_port.to_be_bytes());
    frame.extend_from_slice(&dst_port.to_be_bytes());
    frame.extend_from_slice(&(udp_len as u16).to_be_bytes());
    frame.extend_from_slice(&[0, 0]);
    frame.extend_from_slice(payload);
    frame
}

pub const CLIENT: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub const RESOLVER: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);

/// Query from `CLIENT` to `RESOLVER` on port 53.
pub fn query_frame(id: u16, name: &str, qtype: u16) -> Vec<u8> {
    ethernet_udp(CLIENT, 40000, RESOLVER, 53, &dns_message(id, false, name, qtype, &[]))
}

/// Response from `RESOLVER` back to `CLIENT`.
pub fn response_frame(id: u16, name: &str, qtype: u16, answers: &[Answer]) -> Vec<u8> {
    ethernet_udp(RESOLVER, 53, CLIENT, 40000, &dns_message(id, true, name, qtype, answers))
}

use super::types::{DnsClass, DnsRecordType};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;

/// One frame as handed over by the capture layer.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Bytes,
    pub timestamp: DateTime<Utc>,
    /// Bytes actually captured (snapshot length applied)
    pub caplen: u32,
    /// Length of the frame on the wire
    pub len: u32,
}

impl RawFrame {
    pub fn new(data: impl Into<Bytes>, timestamp: DateTime<Utc>) -> Self {
        let data = data.into();
        let caplen = u32::try_from(data.len()).unwrap_or(u32::MAX);
        Self {
            data,
            timestamp,
            caplen,
            len: caplen,
        }
    }
}

/// Decoded DNS header (RFC 1035 Section 4.1.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DnsHeader {
    pub id: u16,
    pub response: bool,
    pub opcode: u8,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub rcode: u8,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl DnsHeader {
    pub fn record_count(&self) -> usize {
        usize::from(self.an_count) + usize::from(self.ns_count) + usize::from(self.ar_count)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub name: String,
    #[serde(rename = "type")]
    pub qtype: DnsRecordType,
    pub class: DnsClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Answer,
    Authority,
    Additional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub rtype: DnsRecordType,
    pub class: DnsClass,
    pub ttl: u32,
    #[serde(skip)]
    pub rdata: Bytes,
    /// Type-specific rendering of `rdata`
    pub data: String,
    pub section: Section,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub header: DnsHeader,
    pub questions: Vec<Question>,
    /// Answer, authority and additional sections in wire order
    pub records: Vec<ResourceRecord>,
}

/// A DNS message together with the UDP endpoints it travelled between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsPacket {
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub message: DnsMessage,
}

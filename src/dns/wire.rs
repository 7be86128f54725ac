use super::message::{DnsHeader, DnsMessage, DnsPacket, Question, ResourceRecord, Section};
use super::types::{DnsClass, DnsRecordType};
use crate::error::{DecodeError, MalformedReason};
use bytes::Bytes;
use std::fmt::Write as _;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86DD;
const ETHERTYPE_VLAN: u16 = 0x8100;
const ETHERTYPE_QINQ: u16 = 0x88A8;
const IP_PROTO_UDP: u8 = 17;

const DNS_HEADER_LEN: usize = 12;
const MAX_NAME_LEN: usize = 255;
/// Smallest possible question: root name + QTYPE + QCLASS
const MIN_QUESTION_LEN: usize = 5;
/// Smallest possible RR: root name + TYPE + CLASS + TTL + RDLENGTH
const MIN_RECORD_LEN: usize = 11;

/// Link-layer framing of captured packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// DLT_EN10MB, optionally 802.1Q / 802.1ad tagged
    Ethernet,
    /// DLT_LINUX_SLL, what the `any` pseudo-device produces
    LinuxSll,
    /// DLT_RAW, IP header first
    Raw,
    /// DLT_NULL, 4-byte host-order address family (BSD loopback)
    Null,
}

/// Decode one captured frame into a DNS packet.
///
/// Packet structure (layers):
/// 1. Link header (Ethernet, Linux cooked, BSD loopback or none)
/// 2. IP Header (20+ bytes for IPv4, 40 bytes for IPv6)
/// 3. UDP Header (8 bytes)
/// 4. DNS Message (variable length)
///
/// Only datagrams with `port` as source or destination are accepted; anything
/// else is reported as `UnsupportedTransport`, which callers treat as filter
/// leakage rather than corruption.
pub fn decode_frame(link: LinkType, data: &[u8], port: u16) -> Result<DnsPacket, DecodeError> {
    let (ethertype, ip) = strip_link(link, data)?;

    let (src_ip, dst_ip, udp) = match ethertype {
        ETHERTYPE_IPV4 => parse_ipv4(ip)?,
        ETHERTYPE_IPV6 => parse_ipv6(ip)?,
        _ => return Err(DecodeError::UnsupportedTransport("not an IP packet")),
    };

    let (src_port, dst_port, payload) = parse_udp(udp)?;
    if src_port != port && dst_port != port {
        return Err(DecodeError::UnsupportedTransport("port does not match filter"));
    }

    let message = decode_message(payload)?;

    Ok(DnsPacket {
        source: SocketAddr::new(src_ip, src_port),
        destination: SocketAddr::new(dst_ip, dst_port),
        message,
    })
}

/// Returns the network-layer protocol and the bytes that follow the link header.
fn strip_link(link: LinkType, data: &[u8]) -> Result<(u16, &[u8]), DecodeError> {
    match link {
        LinkType::Ethernet => {
            // [0-5] destination MAC, [6-11] source MAC, [12-13] EtherType
            let mut offset = 12;
            loop {
                let ethertype = read_u16(data, offset)?;
                offset += 2;
                if ethertype == ETHERTYPE_VLAN || ethertype == ETHERTYPE_QINQ {
                    // 2 bytes TCI, then the inner EtherType
                    offset += 2;
                    continue;
                }
                return Ok((ethertype, slice_from(data, offset)?));
            }
        }
        LinkType::LinuxSll => {
            // 16-byte cooked header, protocol in the last two bytes
            let protocol = read_u16(data, 14)?;
            Ok((protocol, slice_from(data, 16)?))
        }
        LinkType::Raw => {
            let first = *data.first().ok_or(MalformedReason::Truncated)?;
            match first >> 4 {
                4 => Ok((ETHERTYPE_IPV4, data)),
                6 => Ok((ETHERTYPE_IPV6, data)),
                _ => Err(DecodeError::UnsupportedTransport("not an IP packet")),
            }
        }
        LinkType::Null => {
            let family = data.get(..4).ok_or(MalformedReason::Truncated)?;
            // Written in the capturing host's byte order; AF_INET is 2 everywhere,
            // AF_INET6 varies (10, 24, 28, 30)
            let family = if family[0] != 0 { family[0] } else { family[3] };
            let ethertype = match family {
                2 => ETHERTYPE_IPV4,
                10 | 24 | 28 | 30 => ETHERTYPE_IPV6,
                _ => return Err(DecodeError::UnsupportedTransport("not an IP packet")),
            };
            Ok((ethertype, slice_from(data, 4)?))
        }
    }
}

/// Parse IPv4 header (RFC 791), returning addresses and the UDP segment.
///
/// Fragments are rejected: without reassembly only the first fragment would
/// carry the UDP header and the DNS message would be cut short.
fn parse_ipv4(data: &[u8]) -> Result<(IpAddr, IpAddr, &[u8]), DecodeError> {
    if data.len() < 20 {
        return Err(MalformedReason::Truncated.into());
    }
    if data[0] >> 4 != 4 {
        return Err(DecodeError::UnsupportedTransport("bad IPv4 version"));
    }

    // IHL is counted in 32-bit words
    let ihl = usize::from(data[0] & 0x0F) * 4;
    if ihl < 20 || data.len() < ihl {
        return Err(MalformedReason::Truncated.into());
    }

    if data[9] != IP_PROTO_UDP {
        return Err(DecodeError::UnsupportedTransport("not UDP"));
    }

    let frag = u16::from_be_bytes([data[6], data[7]]);
    if frag & 0x2000 != 0 || frag & 0x1FFF != 0 {
        return Err(DecodeError::UnsupportedTransport("fragmented datagram"));
    }

    let total_len = usize::from(u16::from_be_bytes([data[2], data[3]]));
    let end = if total_len >= ihl {
        total_len.min(data.len())
    } else {
        data.len()
    };

    let src = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
    let dst = Ipv4Addr::new(data[16], data[17], data[18], data[19]);

    Ok((IpAddr::V4(src), IpAddr::V4(dst), &data[ihl..end]))
}

/// Parse IPv6 header (RFC 8200). Extension headers are not walked; only a
/// UDP next header is accepted.
fn parse_ipv6(data: &[u8]) -> Result<(IpAddr, IpAddr, &[u8]), DecodeError> {
    if data.len() < 40 {
        return Err(MalformedReason::Truncated.into());
    }
    if data[0] >> 4 != 6 {
        return Err(DecodeError::UnsupportedTransport("bad IPv6 version"));
    }
    if data[6] != IP_PROTO_UDP {
        return Err(DecodeError::UnsupportedTransport("not UDP"));
    }

    let payload_len = usize::from(u16::from_be_bytes([data[4], data[5]]));
    let end = (40 + payload_len).min(data.len());

    let mut src = [0u8; 16];
    let mut dst = [0u8; 16];
    src.copy_from_slice(&data[8..24]);
    dst.copy_from_slice(&data[24..40]);

    Ok((
        IpAddr::V6(Ipv6Addr::from(src)),
        IpAddr::V6(Ipv6Addr::from(dst)),
        &data[40..end],
    ))
}

/// Parse UDP header (RFC 768): source port, destination port, payload.
fn parse_udp(data: &[u8]) -> Result<(u16, u16, &[u8]), DecodeError> {
    if data.len() < 8 {
        return Err(MalformedReason::Truncated.into());
    }
    let src_port = u16::from_be_bytes([data[0], data[1]]);
    let dst_port = u16::from_be_bytes([data[2], data[3]]);

    // The length field trims Ethernet padding; a bogus value falls back to
    // whatever was captured.
    let udp_len = usize::from(u16::from_be_bytes([data[4], data[5]]));
    let end = if udp_len >= 8 {
        udp_len.min(data.len())
    } else {
        data.len()
    };

    Ok((src_port, dst_port, &data[8..end]))
}

/// Parse DNS message (RFC 1035 Section 4.1)
///
/// ```text
///     +---------------------+
///     |        Header       |  12 bytes
///     +---------------------+
///     |       Question      |  QDCOUNT entries
///     +---------------------+
///     |        Answer       |  ANCOUNT RRs
///     +---------------------+
///     |      Authority      |  NSCOUNT RRs
///     +---------------------+
///     |      Additional     |  ARCOUNT RRs
///     +---------------------+
/// ```
///
/// Every entry the header announces must parse, otherwise the whole message
/// is rejected. Bytes after the last announced record are ignored.
pub fn decode_message(data: &[u8]) -> Result<DnsMessage, DecodeError> {
    let header = parse_header(data)?;

    if header.qd_count == 0 {
        return Err(MalformedReason::NoQuestion.into());
    }

    // Reject impossible counts before allocating for them
    let body = data.len() - DNS_HEADER_LEN;
    let min_needed = usize::from(header.qd_count) * MIN_QUESTION_LEN
        + header.record_count() * MIN_RECORD_LEN;
    if min_needed > body {
        return Err(MalformedReason::CountMismatch.into());
    }

    let mut offset = DNS_HEADER_LEN;

    let mut questions = Vec::with_capacity(usize::from(header.qd_count));
    for _ in 0..header.qd_count {
        questions.push(parse_question(data, &mut offset)?);
    }

    let sections = [
        (Section::Answer, header.an_count),
        (Section::Authority, header.ns_count),
        (Section::Additional, header.ar_count),
    ];
    let mut records = Vec::with_capacity(header.record_count());
    for (section, count) in sections {
        for _ in 0..count {
            records.push(parse_record(data, &mut offset, section)?);
        }
    }

    Ok(DnsMessage {
        header,
        questions,
        records,
    })
}

/// DNS Header Format (12 bytes):
/// ```text
///  0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |           QDCOUNT / ANCOUNT / NSCOUNT / ARCOUNT |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
fn parse_header(data: &[u8]) -> Result<DnsHeader, MalformedReason> {
    if data.len() < DNS_HEADER_LEN {
        return Err(MalformedReason::Truncated);
    }
    let flags = u16::from_be_bytes([data[2], data[3]]);

    Ok(DnsHeader {
        id: u16::from_be_bytes([data[0], data[1]]),
        response: flags & 0x8000 != 0,
        opcode: ((flags >> 11) & 0x0F) as u8,
        authoritative: flags & 0x0400 != 0,
        truncated: flags & 0x0200 != 0,
        recursion_desired: flags & 0x0100 != 0,
        recursion_available: flags & 0x0080 != 0,
        rcode: (flags & 0x000F) as u8,
        qd_count: u16::from_be_bytes([data[4], data[5]]),
        an_count: u16::from_be_bytes([data[6], data[7]]),
        ns_count: u16::from_be_bytes([data[8], data[9]]),
        ar_count: u16::from_be_bytes([data[10], data[11]]),
    })
}

fn parse_question(data: &[u8], offset: &mut usize) -> Result<Question, MalformedReason> {
    let name = parse_domain_name(data, offset)?;
    let qtype = read_u16(data, *offset)?;
    let qclass = read_u16(data, *offset + 2)?;
    *offset += 4;

    Ok(Question {
        name,
        qtype: DnsRecordType::from_u16(qtype),
        class: DnsClass::from_u16(qclass),
    })
}

/// Resource Record (RR) Format (RFC 1035 Section 4.1.3):
///
/// ```text
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     /                      NAME                     /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TYPE                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                     CLASS                     |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                      TTL                      |
///     |                                               |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///     |                   RDLENGTH                    |
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--|
///     /                     RDATA                     /
///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
fn parse_record(
    data: &[u8],
    offset: &mut usize,
    section: Section,
) -> Result<ResourceRecord, MalformedReason> {
    let name = parse_domain_name(data, offset)?;

    let rtype = DnsRecordType::from_u16(read_u16(data, *offset)?);
    let class = DnsClass::from_u16(read_u16(data, *offset + 2)?);
    let ttl = read_u32(data, *offset + 4)?;
    let rdlength = usize::from(read_u16(data, *offset + 8)?);
    *offset += 10;

    let start = *offset;
    let end = start + rdlength;
    let rdata = data.get(start..end).ok_or(MalformedReason::Truncated)?;
    let rendered = render_rdata(data, rtype, start, end)?;
    *offset = end;

    Ok(ResourceRecord {
        name,
        rtype,
        class,
        ttl,
        rdata: Bytes::copy_from_slice(rdata),
        data: rendered,
        section,
    })
}

/// Render RDATA for display and storage. Names inside RDATA may use
/// compression pointers into the whole message, so `data` is the full DNS
/// message and `start..end` the RDATA window.
fn render_rdata(
    data: &[u8],
    rtype: DnsRecordType,
    start: usize,
    end: usize,
) -> Result<String, MalformedReason> {
    let rdata = &data[start..end];

    let rendered = match rtype {
        DnsRecordType::A if rdata.len() == 4 => {
            Ipv4Addr::new(rdata[0], rdata[1], rdata[2], rdata[3]).to_string()
        }
        DnsRecordType::Aaaa if rdata.len() == 16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(rdata);
            Ipv6Addr::from(octets).to_string()
        }
        DnsRecordType::Cname | DnsRecordType::Ns | DnsRecordType::Ptr => {
            let mut cursor = start;
            let name = parse_domain_name(data, &mut cursor)?;
            ensure_within(cursor, end)?;
            name
        }
        DnsRecordType::Mx if rdata.len() >= 3 => {
            let preference = read_u16(data, start)?;
            let mut cursor = start + 2;
            let exchange = parse_domain_name(data, &mut cursor)?;
            ensure_within(cursor, end)?;
            format!("{preference} {exchange}")
        }
        DnsRecordType::Srv if rdata.len() >= 7 => {
            let priority = read_u16(data, start)?;
            let weight = read_u16(data, start + 2)?;
            let port = read_u16(data, start + 4)?;
            let mut cursor = start + 6;
            let target = parse_domain_name(data, &mut cursor)?;
            ensure_within(cursor, end)?;
            format!("{priority} {weight} {port} {target}")
        }
        DnsRecordType::Soa => {
            let mut cursor = start;
            let mname = parse_domain_name(data, &mut cursor)?;
            let rname = parse_domain_name(data, &mut cursor)?;
            let mut numbers = [0u32; 5];
            for number in &mut numbers {
                *number = read_u32(data, cursor)?;
                cursor += 4;
            }
            ensure_within(cursor, end)?;
            let [serial, refresh, retry, expire, minimum] = numbers;
            format!("{mname} {rname} {serial} {refresh} {retry} {expire} {minimum}")
        }
        DnsRecordType::Txt => render_txt(rdata)?,
        _ => to_hex(rdata),
    };

    Ok(rendered)
}

/// TXT RDATA is one or more <length><bytes> character-strings.
fn render_txt(rdata: &[u8]) -> Result<String, MalformedReason> {
    let mut parts = Vec::new();
    let mut cursor = 0;
    while cursor < rdata.len() {
        let len = usize::from(rdata[cursor]);
        let chunk = rdata
            .get(cursor + 1..cursor + 1 + len)
            .ok_or(MalformedReason::Truncated)?;
        parts.push(format!("\"{}\"", String::from_utf8_lossy(chunk).escape_debug()));
        cursor += 1 + len;
    }
    Ok(parts.join(" "))
}

/// Parse DNS domain name with compression support (RFC 1035 Section 4.1.4)
///
/// A name is a run of labels, each a length octet (0-63) followed by that
/// many octets, ending with a zero octet. A label whose top two bits are `11` is a
/// pointer: the remaining 14 bits are an offset from the start of the message
/// where the rest of the name continues.
///
/// ```text
///  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///  | 1  1|                OFFSET                   |
///  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// Every pointer must land strictly before the label run it was found in.
/// Offsets therefore decrease on each hop, which rules out cycles and bounds
/// the number of hops by the message length.
///
/// On return `offset` points just past the name as it appears at the original
/// position (after the first pointer, if one was followed).
pub fn parse_domain_name(data: &[u8], offset: &mut usize) -> Result<String, MalformedReason> {
    let mut domain: Vec<u8> = Vec::new();
    let mut pos = *offset;
    let mut run_start = pos;
    let mut resume: Option<usize> = None;
    // Wire length of the uncompressed name, terminator included
    let mut wire_len = 1;

    loop {
        let len = usize::from(*data.get(pos).ok_or(MalformedReason::Truncated)?);

        match len & 0xC0 {
            0x00 if len == 0 => {
                pos += 1;
                break;
            }
            0x00 => {
                wire_len += 1 + len;
                if wire_len > MAX_NAME_LEN {
                    return Err(MalformedReason::NameTooLong);
                }

                let label = data
                    .get(pos + 1..pos + 1 + len)
                    .ok_or(MalformedReason::Truncated)?;
                if !domain.is_empty() {
                    domain.push(b'.');
                }
                domain.extend_from_slice(label);
                pos += 1 + len;
            }
            0xC0 => {
                let low = usize::from(*data.get(pos + 1).ok_or(MalformedReason::Truncated)?);
                let target = ((len & 0x3F) << 8) | low;
                if target >= run_start {
                    return Err(MalformedReason::CompressionCycle);
                }
                if resume.is_none() {
                    resume = Some(pos + 2);
                }
                pos = target;
                run_start = target;
            }
            _ => return Err(MalformedReason::BadLabelType),
        }
    }

    *offset = resume.unwrap_or(pos);

    if domain.is_empty() {
        return Ok(".".to_string());
    }
    Ok(String::from_utf8_lossy(&domain).into_owned())
}

fn ensure_within(cursor: usize, end: usize) -> Result<(), MalformedReason> {
    if cursor > end {
        return Err(MalformedReason::Truncated);
    }
    Ok(())
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, MalformedReason> {
    let bytes = data
        .get(offset..offset + 2)
        .ok_or(MalformedReason::Truncated)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, MalformedReason> {
    let bytes = data
        .get(offset..offset + 4)
        .ok_or(MalformedReason::Truncated)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn slice_from(data: &[u8], offset: usize) -> Result<&[u8], MalformedReason> {
    data.get(offset..).ok_or(MalformedReason::Truncated)
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Header with the given counts followed by `body`.
    fn message(qd: u16, an: u16, body: &[u8]) -> Vec<u8> {
        let mut msg = vec![0x12, 0x34, 0x81, 0x80];
        msg.extend_from_slice(&qd.to_be_bytes());
        msg.extend_from_slice(&an.to_be_bytes());
        msg.extend_from_slice(&[0, 0, 0, 0]);
        msg.extend_from_slice(body);
        msg
    }

    #[test]
    fn reads_plain_name() {
        let data = [3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0];
        let mut offset = 0;
        assert_eq!(parse_domain_name(&data, &mut offset).unwrap(), "www.example.com");
        assert_eq!(offset, data.len());
    }

    #[test]
    fn follows_backward_pointer_and_resumes_after_it() {
        // "example.com" at 0, then "ftp" + pointer to 0 at 13
        let mut data = vec![7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0];
        data.extend_from_slice(&[3, b'f', b't', b'p', 0xC0, 0x00, 0xAA]);
        let mut offset = 13;
        assert_eq!(parse_domain_name(&data, &mut offset).unwrap(), "ftp.example.com");
        assert_eq!(offset, 19);
    }

    #[test]
    fn rejects_self_pointer() {
        let data = [0xC0, 0x00];
        let mut offset = 0;
        assert_eq!(
            parse_domain_name(&data, &mut offset),
            Err(MalformedReason::CompressionCycle)
        );
    }

    #[test]
    fn rejects_forward_pointer() {
        let data = [0xC0, 0x02, 0];
        let mut offset = 0;
        assert_eq!(
            parse_domain_name(&data, &mut offset),
            Err(MalformedReason::CompressionCycle)
        );
    }

    #[test]
    fn rejects_two_pointer_loop() {
        // 0: "a" -> 5, 5: "b" -> 0, entered at 5
        let data = [1, b'a', 0xC0, 0x05, 0, 1, b'b', 0xC0, 0x00];
        let mut offset = 5;
        assert_eq!(
            parse_domain_name(&data, &mut offset),
            Err(MalformedReason::CompressionCycle)
        );
    }

    #[test]
    fn rejects_reserved_label_type_and_long_name() {
        // 64 sets the 01 label-type bits
        let mut data = vec![64];
        data.extend_from_slice(&[b'a'; 64]);
        data.push(0);
        assert_eq!(
            parse_domain_name(&data, &mut 0),
            Err(MalformedReason::BadLabelType)
        );

        let mut long = Vec::new();
        for _ in 0..5 {
            long.push(63);
            long.extend_from_slice(&[b'a'; 63]);
        }
        long.push(0);
        assert_eq!(
            parse_domain_name(&long, &mut 0),
            Err(MalformedReason::NameTooLong)
        );
    }

    #[test]
    fn root_name_renders_as_dot() {
        assert_eq!(parse_domain_name(&[0], &mut 0).unwrap(), ".");
    }

    #[test]
    fn impossible_counts_are_rejected_early() {
        let msg = message(1, 500, &[0, 0, 1, 0, 1]);
        assert_eq!(
            decode_message(&msg),
            Err(DecodeError::Malformed(MalformedReason::CountMismatch))
        );
    }

    #[test]
    fn message_without_question_is_rejected() {
        let msg = message(0, 0, &[]);
        assert_eq!(
            decode_message(&msg),
            Err(DecodeError::Malformed(MalformedReason::NoQuestion))
        );
    }

    #[test]
    fn renders_mx_and_txt() {
        // question: root A IN
        let mut body = vec![0, 0, 1, 0, 1];
        // MX: root owner, ttl 60, rdlength 5 = preference + "m."
        body.extend_from_slice(&[0, 0, 15, 0, 1, 0, 0, 0, 60, 0, 5, 0, 10, 1, b'm', 0]);
        let decoded = decode_message(&message(1, 1, &body)).unwrap();
        assert_eq!(decoded.records[0].data, "10 m");
        assert_eq!(decoded.records[0].ttl, 60);

        let txt = render_txt(&[5, b'h', b'e', b'l', b'l', b'o', 2, b'o', b'k']).unwrap();
        assert_eq!(txt, "\"hello\" \"ok\"");
        assert_eq!(render_txt(&[9, b'x']), Err(MalformedReason::Truncated));
    }

    #[test]
    fn unknown_rdata_is_hex() {
        let mut body = vec![0, 0, 1, 0, 1];
        body.extend_from_slice(&[0, 0, 99, 0, 1, 0, 0, 0, 1, 0, 3, 0xde, 0xad, 0x01]);
        let decoded = decode_message(&message(1, 1, &body)).unwrap();
        assert_eq!(decoded.records[0].data, "dead01");
        assert_eq!(decoded.records[0].rtype, DnsRecordType::Unknown(99));
    }

    #[test]
    fn non_ip_ethertype_is_unsupported() {
        let mut frame = vec![0u8; 12];
        frame.extend_from_slice(&[0x08, 0x06]);
        frame.extend_from_slice(&[0u8; 28]);
        assert!(matches!(
            decode_frame(LinkType::Ethernet, &frame, 53),
            Err(DecodeError::UnsupportedTransport(_))
        ));
    }
}

use super::message::{DnsPacket, Question, ResourceRecord};
use super::types::DnsRecordType;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

pub type ClientId = i64;

/// The host running the monitor for one process lifetime.
///
/// Built once at startup; the storage layer assigns the id when it persists
/// the session row, after which the value is only ever shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub hostname: String,
    pub ip: Option<IpAddr>,
    pub interface: String,
    pub mac: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(hostname: String, ip: Option<IpAddr>, interface: String, mac: Option<String>) -> Self {
        Self {
            id: 0,
            hostname,
            ip,
            interface,
            mac,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(self, id: ClientId) -> Self {
        Self { id, ..self }
    }

    pub fn ip_string(&self) -> String {
        self.ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// One decoded DNS question plus its records, tagged with capture time and
/// the session that saw it. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedRecord {
    pub timestamp: DateTime<Utc>,
    pub client_id: ClientId,
    /// DNS transaction id
    pub id: u16,
    pub response: bool,
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub question: Question,
    pub answers: Vec<ResourceRecord>,
    /// Copy of `question.name` used by the storage and search layers
    #[serde(skip)]
    pub question_name: String,
}

impl CapturedRecord {
    /// Keeps the first question; EDNS OPT pseudo-records carry no data worth
    /// recording and are left out of the answer list.
    pub fn from_packet(
        packet: DnsPacket,
        timestamp: DateTime<Utc>,
        client_id: ClientId,
    ) -> Option<Self> {
        let DnsPacket {
            source,
            destination,
            message,
        } = packet;

        let question = message.questions.into_iter().next()?;
        let answers = message
            .records
            .into_iter()
            .filter(|rr| rr.rtype != DnsRecordType::Opt)
            .collect();

        Some(Self {
            timestamp,
            client_id,
            id: message.header.id,
            response: message.header.response,
            source,
            destination,
            question_name: question.name.clone(),
            question,
            answers,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Console form: one line per record.
impl fmt::Display for CapturedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = DateTime::<Local>::from(self.timestamp);
        let kind = if self.response { "response" } else { "query" };
        write!(
            f,
            "{} {} > {} {kind} #{:04x} {} {}",
            local.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.source,
            self.destination,
            self.id,
            self.question.qtype,
            self.question.name,
        )?;

        if !self.answers.is_empty() {
            f.write_str(" =>")?;
            write_answers(f, self.answers.iter().map(|rr| (rr.rtype.name(), rr.ttl, rr.data.as_str())))?;
        }
        Ok(())
    }
}

/// Shared rendering of an answer list, used for live and stored records.
pub(crate) fn write_answers<'a, I>(f: &mut fmt::Formatter<'_>, answers: I) -> fmt::Result
where
    I: Iterator<Item = (String, u32, &'a str)>,
{
    for (i, (rtype, ttl, data)) in answers.enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, " {rtype} {data} ({ttl}s)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::message::{DnsHeader, DnsMessage, Section};
    use crate::dns::types::DnsClass;
    use bytes::Bytes;

    fn packet() -> DnsPacket {
        DnsPacket {
            source: "10.0.0.53:53".parse().unwrap(),
            destination: "10.0.0.5:40000".parse().unwrap(),
            message: DnsMessage {
                header: DnsHeader {
                    id: 0xbeef,
                    response: true,
                    qd_count: 1,
                    an_count: 1,
                    ar_count: 1,
                    ..DnsHeader::default()
                },
                questions: vec![Question {
                    name: "test.local".to_string(),
                    qtype: DnsRecordType::A,
                    class: DnsClass::In,
                }],
                records: vec![
                    ResourceRecord {
                        name: "test.local".to_string(),
                        rtype: DnsRecordType::A,
                        class: DnsClass::In,
                        ttl: 300,
                        rdata: Bytes::from_static(&[10, 0, 0, 1]),
                        data: "10.0.0.1".to_string(),
                        section: Section::Answer,
                    },
                    ResourceRecord {
                        name: ".".to_string(),
                        rtype: DnsRecordType::Opt,
                        class: DnsClass::Unknown(1232),
                        ttl: 0,
                        rdata: Bytes::new(),
                        data: String::new(),
                        section: Section::Additional,
                    },
                ],
            },
        }
    }

    #[test]
    fn record_drops_opt_and_copies_question_name() {
        let record = CapturedRecord::from_packet(packet(), Utc::now(), 7).unwrap();
        assert_eq!(record.question_name, "test.local");
        assert_eq!(record.client_id, 7);
        assert_eq!(record.answers.len(), 1);
        assert_eq!(record.answers[0].data, "10.0.0.1");
    }

    #[test]
    fn json_has_expected_shape() {
        let record = CapturedRecord::from_packet(packet(), Utc::now(), 7).unwrap();
        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();

        assert_eq!(value["client_id"], 7);
        assert_eq!(value["question"]["name"], "test.local");
        assert_eq!(value["question"]["type"], "A");
        assert_eq!(value["answers"][0]["ttl"], 300);
        assert_eq!(value["answers"][0]["data"], "10.0.0.1");
        assert_eq!(value["answers"][0]["section"], "answer");
        assert!(value.get("question_name").is_none());
    }

    #[test]
    fn console_line_mentions_question_and_answer() {
        let record = CapturedRecord::from_packet(packet(), Utc::now(), 7).unwrap();
        let line = record.to_string();
        assert!(line.contains("response #beef A test.local"));
        assert!(line.ends_with("=> A 10.0.0.1 (300s)"));
    }
}

use serde::{Serialize, Serializer};
use std::fmt;

/// DNS Record Types (RFC 1035 Section 3.2.2, RFC 3596)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsRecordType {
    /// A record: IPv4 address (32 bits)
    A,
    /// NS record: Authoritative name server
    Ns,
    /// CNAME record: Canonical name for an alias
    Cname,
    /// SOA record: Start of authority
    Soa,
    /// PTR record: Domain name pointer
    Ptr,
    /// MX record: Mail exchange
    Mx,
    /// TXT record: Text strings
    Txt,
    /// AAAA record: IPv6 address (128 bits) - RFC 3596
    Aaaa,
    /// SRV record: Service location - RFC 2782
    Srv,
    /// OPT pseudo-record: EDNS(0) - RFC 6891
    Opt,
    /// HTTPS record: HTTPS binding - RFC 9460
    Https,
    /// ANY query (QTYPE only)
    Any,
    /// Unknown or unsupported record type
    Unknown(u16),
}

impl DnsRecordType {
    /// Convert wire format u16 to `DnsRecordType`
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::A,
            2 => Self::Ns,
            5 => Self::Cname,
            6 => Self::Soa,
            12 => Self::Ptr,
            15 => Self::Mx,
            16 => Self::Txt,
            28 => Self::Aaaa,
            33 => Self::Srv,
            41 => Self::Opt,
            65 => Self::Https,
            255 => Self::Any,
            n => Self::Unknown(n),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::A => 1,
            Self::Ns => 2,
            Self::Cname => 5,
            Self::Soa => 6,
            Self::Ptr => 12,
            Self::Mx => 15,
            Self::Txt => 16,
            Self::Aaaa => 28,
            Self::Srv => 33,
            Self::Opt => 41,
            Self::Https => 65,
            Self::Any => 255,
            Self::Unknown(n) => n,
        }
    }

    /// Get human-readable name for the record type
    pub fn name(self) -> String {
        match self {
            Self::A => "A".to_string(),
            Self::Ns => "NS".to_string(),
            Self::Cname => "CNAME".to_string(),
            Self::Soa => "SOA".to_string(),
            Self::Ptr => "PTR".to_string(),
            Self::Mx => "MX".to_string(),
            Self::Txt => "TXT".to_string(),
            Self::Aaaa => "AAAA".to_string(),
            Self::Srv => "SRV".to_string(),
            Self::Opt => "OPT".to_string(),
            Self::Https => "HTTPS".to_string(),
            Self::Any => "ANY".to_string(),
            Self::Unknown(n) => format!("TYPE{n}"),
        }
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for DnsRecordType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

/// DNS Classes (RFC 1035 Section 3.2.4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DnsClass {
    In,
    Cs,
    Ch,
    Hs,
    Any,
    Unknown(u16),
}

impl DnsClass {
    pub fn from_u16(value: u16) -> Self {
        match value {
            1 => Self::In,
            2 => Self::Cs,
            3 => Self::Ch,
            4 => Self::Hs,
            255 => Self::Any,
            n => Self::Unknown(n),
        }
    }

    pub fn name(self) -> String {
        match self {
            Self::In => "IN".to_string(),
            Self::Cs => "CS".to_string(),
            Self::Ch => "CH".to_string(),
            Self::Hs => "HS".to_string(),
            Self::Any => "ANY".to_string(),
            Self::Unknown(n) => format!("CLASS{n}"),
        }
    }
}

impl fmt::Display for DnsClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for DnsClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_types_keep_their_code() {
        for code in [1u16, 2, 5, 6, 12, 15, 16, 28, 33, 41, 65, 255] {
            assert_eq!(DnsRecordType::from_u16(code).to_u16(), code);
        }
    }

    #[test]
    fn unknown_type_falls_back_to_numeric_name() {
        assert_eq!(DnsRecordType::from_u16(99).name(), "TYPE99");
        assert_eq!(DnsClass::from_u16(42).name(), "CLASS42");
    }
}

use thiserror::Error;

/// Reason a DNS payload was rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    /// A read would run past the end of the captured slice
    Truncated,
    /// Header counts disagree with the entries that could be parsed
    CountMismatch,
    /// A decoded name longer than 255 octets in wire form
    NameTooLong,
    /// A compression pointer that loops or points forward
    CompressionCycle,
    /// Label type bits 01 / 10 (extended / reserved)
    BadLabelType,
    /// Message carries no question entry
    NoQuestion,
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::Truncated => "truncated",
            Self::CountMismatch => "section count mismatch",
            Self::NameTooLong => "name longer than 255 octets",
            Self::CompressionCycle => "compression pointer cycle",
            Self::BadLabelType => "unsupported label type",
            Self::NoQuestion => "no question",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed DNS packet: {0}")]
    Malformed(MalformedReason),

    #[error("not a UDP DNS payload: {0}")]
    UnsupportedTransport(&'static str),
}

impl DecodeError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl From<MalformedReason> for DecodeError {
    fn from(reason: MalformedReason) -> Self {
        Self::Malformed(reason)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Only one database output plugin can be selected")]
    ConflictingBackends,

    #[error("Interface {0} not found")]
    UnknownInterface(String),

    #[error("No suitable network interface found")]
    NoInterface,

    #[error("A database password is required for {0} (use --db-password or DNAS_DB_PASSWORD, `none` for empty)")]
    MissingPassword(&'static str),

    #[error("Query mode needs a storage backend (--sqlite3, --mysql or --postgres)")]
    NoQueryBackend,

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot open capture on {interface}: {source}")]
    Open {
        interface: String,
        #[source]
        source: pcap::Error,
    },

    #[error("cannot apply capture filter `{filter}`: {source}")]
    Filter {
        filter: String,
        #[source]
        source: pcap::Error,
    },

    #[error("unsupported link type {linktype} on {interface}")]
    UnsupportedLink { interface: String, linktype: i32 },

    #[error("capture failed: {0}")]
    Read(#[from] pcap::Error),

    #[error("capture source ended")]
    EndOfStream,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database connection failed: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema setup failed: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("failed to persist record: {0}")]
    Persist(#[source] sqlx::Error),

    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),

    #[error("storage connection already closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid search pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

mod message;
mod record;
pub mod types;
pub mod wire;

pub use message::{DnsHeader, DnsMessage, DnsPacket, Question, RawFrame, ResourceRecord, Section};
pub(crate) use record::write_answers;
pub use record::{CapturedRecord, Client, ClientId};
pub use wire::{LinkType, decode_frame, decode_message};

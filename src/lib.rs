//! Passive DNS traffic recorder: captures UDP DNS on an interface, prints it,
//! optionally logs it as NDJSON and persists it to SQLite, MySQL or
//! PostgreSQL, and searches what was persisted.

pub mod app;
pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod output;
pub mod pcap;
pub mod query;
pub mod shutdown;
pub mod storage;

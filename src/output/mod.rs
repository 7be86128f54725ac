mod console;
mod json_log;

pub use console::{Console, hexdump};
pub use json_log::{JsonLog, JsonLogHandle};

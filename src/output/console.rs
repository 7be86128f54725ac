use crate::dns::{CapturedRecord, Client, RawFrame};
use std::fmt::Write as _;
use std::io::{self, Write};

const BYTES_PER_LINE: usize = 16;

/// Record lines on stdout, optionally followed by a hexdump of the frame.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    pub quiet: bool,
    pub hexdump: bool,
}

impl Console {
    pub fn new(quiet: bool, hexdump: bool) -> Self {
        Self { quiet, hexdump }
    }

    /// Print one record to stdout. Errors are returned so the caller can stop
    /// printing once stdout is gone.
    pub fn print(&self, record: &CapturedRecord, frame: &RawFrame) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.write_to(&mut io::stdout().lock(), record, frame)
    }

    pub fn write_to<W: Write>(
        &self,
        out: &mut W,
        record: &CapturedRecord,
        frame: &RawFrame,
    ) -> io::Result<()> {
        writeln!(out, "{record}")?;
        if self.hexdump {
            writeln!(out, "{}", hexdump(&frame.data))?;
        }
        Ok(())
    }

    pub fn banner(&self, client: &Client) {
        if self.quiet {
            return;
        }
        println!(
            "\n {} ({}) - {}\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION")
        );
        println!(" Hostname: {}", client.hostname);
        println!(
            " Interface: {} ({})",
            client.interface,
            client.mac.as_deref().unwrap_or("-")
        );
        println!(" IP Address: {}\n", client.ip_string());
    }
}

/// Canonical hex + ASCII dump, 16 bytes per line.
pub fn hexdump(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 4 + 16);

    for (line, chunk) in data.chunks(BYTES_PER_LINE).enumerate() {
        let _ = write!(out, "{:08x} ", line * BYTES_PER_LINE);
        for i in 0..BYTES_PER_LINE {
            if i == 8 {
                out.push(' ');
            }
            match chunk.get(i) {
                Some(byte) => {
                    let _ = write!(out, " {byte:02x}");
                }
                None => out.push_str("   "),
            }
        }
        out.push_str("  |");
        for &byte in chunk {
            out.push(if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '.'
            });
        }
        out.push_str("|\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DnsPacket, decode_message};
    use chrono::Utc;

    fn record() -> (CapturedRecord, RawFrame) {
        // Query for `a`, type A, class IN
        let message = [
            0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0, 1, b'a', 0, 0, 1, 0, 1,
        ];
        let packet = DnsPacket {
            source: "10.0.0.2:40000".parse().unwrap(),
            destination: "10.0.0.1:53".parse().unwrap(),
            message: decode_message(&message).unwrap(),
        };
        let record = CapturedRecord::from_packet(packet, Utc::now(), 1).unwrap();
        (record, RawFrame::new(message.to_vec(), Utc::now()))
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn record_line_then_hexdump() {
        let (record, frame) = record();
        let mut out = Vec::new();
        Console::new(false, true).write_to(&mut out, &record, &frame).unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with("query #1234 A a"));
        assert!(lines.next().unwrap().starts_with("00000000  12 34 01 00"));
    }

    #[test]
    fn closed_stdout_is_reported() {
        let (record, frame) = record();
        let err = Console::new(false, false)
            .write_to(&mut ClosedPipe, &record, &frame)
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn hexdump_pads_short_lines() {
        let dump = hexdump(b"dns\x00");
        assert_eq!(
            dump,
            "00000000  64 6e 73 00                                       |dns.|\n"
        );
    }

    #[test]
    fn hexdump_numbers_lines_by_offset() {
        let dump = hexdump(&[0u8; 20]);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("00000010 "));
    }
}

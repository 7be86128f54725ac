use crate::dns::{CapturedRecord, ClientId, LinkType, RawFrame, decode_frame};
use crate::error::{CaptureError, ConfigError, DecodeError};
use crate::output::{Console, JsonLogHandle};
use crate::storage::QueueSender;
use anyhow::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use pcap::{Active, Capture, Device, Error, Linktype};
use std::io;
use std::panic::{AssertUnwindSafe, catch_unwind};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SNAPLEN: i32 = 65536;
const READ_TIMEOUT_MS: i32 = 500;

pub struct CaptureLoader;

impl CaptureLoader {
    pub fn list_interfaces() -> Result<Vec<Device>> {
        Ok(Device::list()?)
    }

    pub fn select_default_interface() -> Result<String> {
        let devices = Device::list()?;

        for device in &devices {
            if device.name == "any" {
                continue;
            }
            if !device.flags.is_loopback() && device.flags.is_up() && device.flags.is_running() {
                return Ok(device.name.clone());
            }
        }

        for device in &devices {
            if device.name != "any" && device.flags.is_up() {
                return Ok(device.name.clone());
            }
        }

        Err(ConfigError::NoInterface.into())
    }

    /// Find the capture device called `interface`.
    pub fn find(interface: &str) -> Result<Device> {
        let device = Device::list()?
            .into_iter()
            .find(|d| d.name == interface)
            .ok_or_else(|| ConfigError::UnknownInterface(interface.to_string()))?;
        Ok(device)
    }

    /// Open a live capture on `device` restricted to UDP traffic on `port`.
    pub fn open(device: Device, port: u16) -> Result<PcapSource, CaptureError> {
        let interface = device.name.clone();
        info!("Opening capture on interface: {interface}");

        let open_err = |source| CaptureError::Open {
            interface: interface.clone(),
            source,
        };

        let mut cap = Capture::from_device(device)
            .map_err(open_err)?
            .promisc(true)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .immediate_mode(true)
            .open()
            .map_err(open_err)?;

        let filter = format!("udp port {port}");
        cap.filter(&filter, true)
            .map_err(|source| CaptureError::Filter {
                filter: filter.clone(),
                source,
            })?;

        let link = link_type(cap.get_datalink()).ok_or_else(|| CaptureError::UnsupportedLink {
            interface: interface.clone(),
            linktype: cap.get_datalink().0,
        })?;

        info!("Capture started on interface: {interface} (filter `{filter}`, {link:?})");
        Ok(PcapSource { cap, link })
    }
}

fn link_type(linktype: Linktype) -> Option<LinkType> {
    if linktype == Linktype::ETHERNET {
        Some(LinkType::Ethernet)
    } else if linktype == Linktype::LINUX_SLL {
        Some(LinkType::LinuxSll)
    } else if linktype == Linktype::RAW || linktype == Linktype::IPV4 || linktype == Linktype::IPV6 {
        Some(LinkType::Raw)
    } else if linktype == Linktype::NULL || linktype == Linktype::LOOP {
        Some(LinkType::Null)
    } else {
        None
    }
}

/// Anything the capture loop can pull frames from.
pub trait FrameSource: Send {
    fn link_type(&self) -> LinkType;

    /// Next frame, `Ok(None)` when the read timeout expired without traffic.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, CaptureError>;

    /// (received, dropped) as reported by the capture layer, if it keeps any.
    fn stats(&mut self) -> Option<(u32, u32)> {
        None
    }
}

pub struct PcapSource {
    cap: Capture<Active>,
    link: LinkType,
}

impl FrameSource for PcapSource {
    fn link_type(&self) -> LinkType {
        self.link
    }

    fn next_frame(&mut self) -> Result<Option<RawFrame>, CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => {
                let ts = packet.header.ts;
                Ok(Some(RawFrame {
                    data: Bytes::copy_from_slice(packet.data),
                    timestamp: capture_time(i64::from(ts.tv_sec), i64::from(ts.tv_usec)),
                    caplen: packet.header.caplen,
                    len: packet.header.len,
                }))
            }
            // Timeout is expected, loop back to check the stop flag
            Err(Error::TimeoutExpired) => Ok(None),
            Err(Error::NoMorePackets) => Err(CaptureError::EndOfStream),
            Err(e) => Err(CaptureError::Read(e)),
        }
    }

    fn stats(&mut self) -> Option<(u32, u32)> {
        self.cap.stats().ok().map(|s| (s.received, s.dropped))
    }
}

/// Timestamp of a pcap header. Microseconds outside `0..1_000_000` are
/// dropped; a seconds value chrono cannot represent falls back to now.
fn capture_time(tv_sec: i64, tv_usec: i64) -> DateTime<Utc> {
    let nanos = u32::try_from(tv_usec)
        .ok()
        .filter(|usec| *usec < 1_000_000)
        .map_or(0, |usec| usec * 1000);
    DateTime::<Utc>::from_timestamp(tv_sec, nanos).unwrap_or_else(Utc::now)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Open,
    Running,
    Draining,
    Closed,
}

/// Where decoded records go. Each sink is optional except the console, which
/// stays silent in quiet mode.
pub struct Sinks {
    pub console: Console,
    pub json: Option<JsonLogHandle>,
    pub queue: Option<QueueSender>,
    pub client_id: ClientId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: u64,
    pub records: u64,
    pub malformed: u64,
    /// Frames that were not UDP DNS on the filtered port
    pub skipped: u64,
    pub enqueue_failures: u64,
    pub panics: u64,
    pub pcap_received: Option<u32>,
    pub pcap_dropped: Option<u32>,
}

#[derive(Debug)]
pub struct CaptureReport {
    pub stats: CaptureStats,
    pub state: SessionState,
    /// `Ok` when the loop stopped because it was cancelled
    pub result: Result<(), CaptureError>,
}

/// Drives one frame source from `Open` to `Closed`.
pub struct CaptureSession<S: FrameSource> {
    source: S,
    port: u16,
    state: SessionState,
    stats: CaptureStats,
    /// Cleared once stdout is closed by the reader
    console_open: bool,
}

impl<S: FrameSource + 'static> CaptureSession<S> {
    /// Wrap an already opened source; opening is the `Idle -> Open` step.
    pub fn new(source: S, port: u16) -> Self {
        Self {
            source,
            port,
            state: SessionState::Open,
            stats: CaptureStats::default(),
            console_open: true,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the pull loop on a blocking thread.
    pub fn spawn(self, sinks: Sinks, cancel: CancellationToken) -> JoinHandle<CaptureReport> {
        tokio::task::spawn_blocking(move || self.run(sinks, cancel))
    }

    /// Pull frames until `cancel` fires or the source fails. The token is
    /// checked between frames, so a frame already pulled is always finished.
    pub fn run(mut self, sinks: Sinks, cancel: CancellationToken) -> CaptureReport {
        self.state = SessionState::Running;

        let result = loop {
            if cancel.is_cancelled() {
                break Ok(());
            }

            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    self.stats.frames += 1;
                    let outcome = catch_unwind(AssertUnwindSafe(|| self.handle_frame(&frame, &sinks)));
                    if outcome.is_err() {
                        self.stats.panics += 1;
                        error!(
                            "Capture loop recovered from a panic while handling a {} byte frame. \
                             Please report this issue.",
                            frame.caplen
                        );
                    }
                }
                Ok(None) => continue,
                Err(e) => break Err(e),
            }
        };

        self.state = SessionState::Draining;
        // Releases the producer ends so the JSON log and the queue can drain
        drop(sinks);

        if let Some((received, dropped)) = self.source.stats() {
            self.stats.pcap_received = Some(received);
            self.stats.pcap_dropped = Some(dropped);
        }
        let CaptureSession { source, stats, .. } = self;
        drop(source);

        info!(
            "Packet capture terminated: {} frames, {} records, {} malformed, {} skipped",
            stats.frames, stats.records, stats.malformed, stats.skipped
        );

        CaptureReport {
            stats,
            state: SessionState::Closed,
            result,
        }
    }

    fn handle_frame(&mut self, frame: &RawFrame, sinks: &Sinks) {
        let packet = match decode_frame(self.source.link_type(), &frame.data, self.port) {
            Ok(packet) => packet,
            Err(DecodeError::UnsupportedTransport(reason)) => {
                self.stats.skipped += 1;
                debug!("Ignoring frame: {reason}");
                return;
            }
            Err(e) => {
                self.stats.malformed += 1;
                debug!("Skipping frame: {e}");
                return;
            }
        };

        let Some(record) = CapturedRecord::from_packet(packet, frame.timestamp, sinks.client_id)
        else {
            self.stats.malformed += 1;
            return;
        };
        self.stats.records += 1;

        if let Some(json) = &sinks.json {
            json.write(&record);
        }

        if self.console_open
            && let Err(e) = sinks.console.print(&record, frame)
        {
            if e.kind() == io::ErrorKind::BrokenPipe {
                self.console_open = false;
                warn!("stdout closed, no longer printing records");
            } else {
                debug!("Cannot print record: {e}");
            }
        }

        if let Some(queue) = &sinks.queue
            && let Err(record) = queue.enqueue_blocking(record)
        {
            self.stats.enqueue_failures += 1;
            warn!("Storage writer stopped, dropping record for {}", record.question_name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn pcap_timestamps_keep_microseconds() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap()
            + chrono::Duration::microseconds(250_000);
        assert_eq!(capture_time(1_714_552_200, 250_000), expected);
    }

    #[test]
    fn out_of_range_microseconds_are_dropped() {
        let whole = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(capture_time(1_714_552_200, -5), whole);
        assert_eq!(capture_time(1_714_552_200, 1_000_000), whole);
    }
}

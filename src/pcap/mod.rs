mod capture;
mod interface;

pub use capture::{
    CaptureLoader, CaptureReport, CaptureSession, CaptureStats, FrameSource, PcapSource,
    SessionState, Sinks,
};
pub use interface::local_client;

//! Packet capture library for ringdump
//!
//! This crate provides the capture pipeline behind the ringdump tool:
//! a single-writer loop pulling packets from a capture source into a
//! pcap-format file, with periodic statistics, an optional capture
//! duration limit, and graceful shutdown coordination.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//! use ringdump_capture::{
//!     CaptureDurationGuard, CapturePipeline, CaptureSource, PcapFileSink,
//!     PcapSource, PeriodicReporter, ShutdownCoordinator, SourceConfig,
//!     StatsCounter,
//! };
//!
//! # fn main() -> ringdump_core::Result<()> {
//! let mut source = PcapSource::open("eth0", &SourceConfig::default())?;
//! source.activate()?;
//! let sink = PcapFileSink::open("dump.pcap", pcap::Linktype::ETHERNET)?;
//!
//! let stats = StatsCounter::new();
//! let reporter = PeriodicReporter::new(stats.clone(), Duration::from_secs(1));
//! let coordinator = ShutdownCoordinator::new(reporter.clone());
//!
//! let mut pipeline = CapturePipeline::new(source, sink, stats, coordinator)
//!     .with_duration_guard(CaptureDurationGuard::new(60));
//! let summary = pipeline.run()?;
//! println!("captured {} packets", summary.packets);
//! # Ok(())
//! # }
//! ```

pub mod guard;
pub mod interface;
pub mod pipeline;
pub mod reporter;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod stats;

// Re-export main types
pub use guard::{CaptureDurationGuard, Verdict};
pub use interface::{default_interface, get_interface, list_interfaces, InterfaceInfo};
pub use pipeline::{CapturePipeline, PipelineSummary, StopReason, WIRE_FRAMING_OVERHEAD};
pub use reporter::{PeriodicReporter, StatsReport};
pub use shutdown::{ShutdownCoordinator, ShutdownFlag, ShutdownState};
pub use sink::{PacketSink, PcapFileSink};
pub use source::{CaptureSource, Direction, PcapSource, SourceConfig, SourceStats};
pub use stats::{StatsCounter, StatsSnapshot};

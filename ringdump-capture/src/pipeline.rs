//! The capture loop: source to sink, single writer

use std::sync::Arc;
use std::thread;
use tracing::{debug, info};

use ringdump_core::{PacketRecord, Result};

use crate::guard::{CaptureDurationGuard, Verdict};
use crate::shutdown::{ShutdownCoordinator, ShutdownFlag};
use crate::sink::PacketSink;
use crate::source::CaptureSource;
use crate::stats::StatsCounter;

/// Per-packet framing bytes not delivered by the capture source:
/// 8 preamble + 4 CRC + 12 inter-frame gap. Byte totals approximate wire
/// occupancy, not just captured bytes.
pub const WIRE_FRAMING_OVERHEAD: u64 = 24;

/// Default receive buffer length when no snaplen is configured
const DEFAULT_BUFFER_LEN: usize = 65535;

/// Why the capture loop exited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The shutdown flag was observed
    Shutdown,
    /// A packet timestamp fell past the capture deadline
    DeadlineExceeded,
}

/// Counters accumulated over one `run()`
#[derive(Debug, Clone, Copy)]
pub struct PipelineSummary {
    /// Packets written to the sink
    pub packets: u64,
    /// Bytes accounted, including framing overhead
    pub bytes: u64,
    /// Receive attempts that returned no data
    pub empty_polls: u64,
    /// Transient receive errors that were retried
    pub receive_errors: u64,
    /// What ended the loop
    pub stop_reason: StopReason,
}

/// The bounded single-writer capture loop.
///
/// Owns the capture source, the output sink and one reusable receive buffer
/// for its whole lifetime; nothing else writes to either. The loop only
/// terminates through the shutdown flag or the duration guard; a single
/// failed receive is retried, never escalated.
pub struct CapturePipeline<S: CaptureSource, K: PacketSink> {
    source: S,
    sink: K,
    stats: StatsCounter,
    coordinator: Arc<ShutdownCoordinator>,
    shutdown: ShutdownFlag,
    guard: CaptureDurationGuard,
    wait_for_packet: bool,
    buf: Vec<u8>,
}

impl<S: CaptureSource, K: PacketSink> CapturePipeline<S, K> {
    /// Build a pipeline with an unlimited capture window and a blocking
    /// receive policy.
    pub fn new(
        source: S,
        sink: K,
        stats: StatsCounter,
        coordinator: Arc<ShutdownCoordinator>,
    ) -> Self {
        let shutdown = coordinator.flag().clone();
        Self {
            source,
            sink,
            stats,
            coordinator,
            shutdown,
            guard: CaptureDurationGuard::unlimited(),
            wait_for_packet: true,
            buf: vec![0; DEFAULT_BUFFER_LEN],
        }
    }

    /// Enforce a maximum capture window
    pub fn with_duration_guard(mut self, guard: CaptureDurationGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Blocking receive (`true`, the default) or busy-poll with a yield
    /// between empty polls (`false`).
    pub fn with_wait_for_packet(mut self, wait_for_packet: bool) -> Self {
        self.wait_for_packet = wait_for_packet;
        self
    }

    /// Size the reusable receive buffer to the configured capture length
    pub fn with_buffer_len(mut self, len: usize) -> Self {
        self.buf = vec![0; len.max(1)];
        self
    }

    /// Run the capture loop until shutdown or deadline.
    ///
    /// Every accepted packet is written to the sink and then counted as one
    /// packet and `captured_len + WIRE_FRAMING_OVERHEAD` bytes. Sink write
    /// failures escalate; receive failures do not.
    pub fn run(&mut self) -> Result<PipelineSummary> {
        let mut packets: u64 = 0;
        let mut bytes: u64 = 0;
        let mut empty_polls: u64 = 0;
        let mut receive_errors: u64 = 0;

        let stop_reason = loop {
            if self.shutdown.raised() {
                break StopReason::Shutdown;
            }

            match self.source.receive(&mut self.buf) {
                Ok(Some(header)) => {
                    // A signal may have landed while the receive blocked
                    if self.shutdown.raised() {
                        break StopReason::Shutdown;
                    }
                    if self.guard.check(header.ts_sec) == Verdict::Stop {
                        // Deadline stops route through the coordinator so
                        // the final stats flush still happens exactly once
                        self.coordinator.trigger();
                        break StopReason::DeadlineExceeded;
                    }

                    let payload = &self.buf[..header.captured_len as usize];
                    self.sink.write_record(&PacketRecord::new(header, payload))?;

                    let wire_bytes = u64::from(header.captured_len) + WIRE_FRAMING_OVERHEAD;
                    self.stats.record(1, wire_bytes);
                    packets += 1;
                    bytes += wire_bytes;
                    self.refresh_drops();
                }
                Ok(None) => {
                    // Idle links must still publish current source drops,
                    // or reports fired between packets go stale
                    self.refresh_drops();
                    empty_polls += 1;
                    if !self.wait_for_packet {
                        thread::yield_now();
                    }
                }
                Err(e) => {
                    // Transient: log, optionally yield, retry
                    receive_errors += 1;
                    debug!("receive error (retrying): {e}");
                    self.refresh_drops();
                    if !self.wait_for_packet {
                        thread::yield_now();
                    }
                }
            }
        };

        self.sink.flush()?;
        info!(packets, bytes, ?stop_reason, "capture loop finished");

        Ok(PipelineSummary {
            packets,
            bytes,
            empty_polls,
            receive_errors,
            stop_reason,
        })
    }

    /// Publish the source's current drop count after every receive attempt,
    /// whatever its outcome. Stats queries that fail are ignored; the next
    /// attempt retries.
    fn refresh_drops(&mut self) {
        if let Ok(source_stats) = self.source.stats() {
            self.stats.set_drops(source_stats.dropped);
        }
    }
}

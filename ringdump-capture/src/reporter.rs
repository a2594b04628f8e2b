//! Periodic capture statistics reporting

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::info;

use ringdump_core::Result;

use crate::shutdown::ShutdownFlag;
use crate::stats::{StatsCounter, StatsSnapshot};

/// How often the reporter thread re-checks the shutdown flag while armed
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// One emitted stats line: deltas since the previous firing plus totals.
#[derive(Debug, Clone, Copy)]
pub struct StatsReport {
    /// Line number, starting at 1
    pub sequence: u64,
    /// Packets accepted since the previous firing
    pub interval_packets: u64,
    /// Bytes accounted since the previous firing
    pub interval_bytes: u64,
    /// Source drops since the previous firing
    pub interval_drops: u64,
    /// Cumulative totals at the time of this firing
    pub totals: StatsSnapshot,
}

#[derive(Debug)]
struct ReportState {
    sequence: u64,
    last: StatsSnapshot,
}

/// Timer-driven stats line emitter.
///
/// A worker thread re-arms itself after every firing until shutdown is
/// signaled; the shutdown path itself then invokes exactly one final flush.
#[derive(Debug)]
pub struct PeriodicReporter {
    stats: StatsCounter,
    interval: Duration,
    shutdown: ShutdownFlag,
    state: Mutex<ReportState>,
    final_fired: AtomicBool,
}

impl PeriodicReporter {
    /// Create a reporter over the given counters, firing every `interval`.
    ///
    /// The reporter owns the shutdown flag that silences it; the
    /// coordinator shares the same flag.
    pub fn new(stats: StatsCounter, interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            stats,
            interval,
            shutdown: ShutdownFlag::new(),
            state: Mutex::new(ReportState {
                sequence: 0,
                last: StatsSnapshot::default(),
            }),
            final_fired: AtomicBool::new(false),
        })
    }

    /// The configured firing interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// The shutdown flag that silences periodic firing
    pub fn shutdown_flag(&self) -> &ShutdownFlag {
        &self.shutdown
    }

    /// Number of lines emitted so far
    pub fn sequence(&self) -> u64 {
        self.state.lock().sequence
    }

    /// Emit one stats line now.
    ///
    /// Returns `None` once shutdown has been requested or the final flush
    /// has happened; only `final_flush` may emit after the flag is up.
    pub fn fire(&self) -> Option<StatsReport> {
        if self.shutdown.raised() || self.final_fired.load(Ordering::SeqCst) {
            return None;
        }
        Some(self.emit())
    }

    /// The one-shot flush run by the shutdown path.
    ///
    /// The first call emits a last line and permanently disarms the
    /// reporter; every later call is a no-op.
    pub fn final_flush(&self) -> Option<StatsReport> {
        if self.final_fired.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.emit())
    }

    fn emit(&self) -> StatsReport {
        let snapshot = self.stats.snapshot();
        let mut state = self.state.lock();
        state.sequence += 1;

        let report = StatsReport {
            sequence: state.sequence,
            interval_packets: snapshot.total_packets - state.last.total_packets,
            interval_bytes: snapshot.total_bytes - state.last.total_bytes,
            interval_drops: snapshot.total_drops - state.last.total_drops,
            totals: snapshot,
        };
        state.last = snapshot;
        drop(state);

        info!(
            "{} sec pkts {} drop {} bytes {} | pkts {} bytes {} drop {}",
            report.sequence,
            report.interval_packets,
            report.interval_drops,
            report.interval_bytes,
            report.totals.total_packets,
            report.totals.total_bytes,
            report.totals.total_drops,
        );
        report
    }

    /// Start the self-rescheduling reporter thread.
    ///
    /// The thread exits as soon as the shutdown flag is raised, without
    /// firing; the final line is the shutdown path's to emit.
    pub fn spawn(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let reporter = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("ringdump-stats".to_string())
            .spawn(move || loop {
                let armed_until = Instant::now() + reporter.interval;
                loop {
                    if reporter.shutdown.raised() {
                        return;
                    }
                    let now = Instant::now();
                    if now >= armed_until {
                        break;
                    }
                    thread::sleep(WAIT_SLICE.min(armed_until - now));
                }
                reporter.fire();
            })?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reporter_with_stats() -> (Arc<PeriodicReporter>, StatsCounter) {
        let stats = StatsCounter::new();
        let reporter = PeriodicReporter::new(stats.clone(), Duration::from_secs(1));
        (reporter, stats)
    }

    #[test]
    fn test_first_fire_reports_totals_as_deltas() {
        let (reporter, stats) = reporter_with_stats();
        stats.record(5, 500);
        stats.set_drops(2);

        let report = reporter.fire().unwrap();
        assert_eq!(report.sequence, 1);
        assert_eq!(report.interval_packets, 5);
        assert_eq!(report.interval_bytes, 500);
        assert_eq!(report.interval_drops, 2);
        assert_eq!(report.totals.total_packets, 5);
    }

    #[test]
    fn test_deltas_match_cumulative_difference() {
        let (reporter, stats) = reporter_with_stats();

        stats.record(3, 300);
        let first = reporter.fire().unwrap();

        stats.record(7, 700);
        stats.set_drops(4);
        let second = reporter.fire().unwrap();

        assert_eq!(second.sequence, 2);
        assert_eq!(
            second.interval_packets,
            second.totals.total_packets - first.totals.total_packets
        );
        assert_eq!(second.interval_packets, 7);
        assert_eq!(second.interval_bytes, 700);
        assert_eq!(second.interval_drops, 4);
    }

    #[test]
    fn test_idle_interval_reports_zero_deltas() {
        let (reporter, stats) = reporter_with_stats();
        stats.record(10, 1000);
        reporter.fire().unwrap();

        let report = reporter.fire().unwrap();
        assert_eq!(report.interval_packets, 0);
        assert_eq!(report.interval_bytes, 0);
        assert_eq!(report.totals.total_packets, 10);
    }

    #[test]
    fn test_final_flush_happens_once() {
        let (reporter, stats) = reporter_with_stats();
        stats.record(1, 100);

        assert!(reporter.final_flush().is_some());
        assert!(reporter.final_flush().is_none());
        assert_eq!(reporter.sequence(), 1);
    }

    #[test]
    fn test_no_fire_after_final_flush() {
        let (reporter, _stats) = reporter_with_stats();
        reporter.final_flush();
        assert!(reporter.fire().is_none());
        assert_eq!(reporter.sequence(), 1);
    }

    #[test]
    fn test_no_periodic_fire_after_shutdown_raised() {
        // A timer firing that loses the race with shutdown must stay
        // silent; only the final flush emits once the flag is up.
        let (reporter, stats) = reporter_with_stats();
        stats.record(2, 200);
        reporter.shutdown_flag().raise();

        assert!(reporter.fire().is_none());
        assert_eq!(reporter.sequence(), 0);

        assert!(reporter.final_flush().is_some());
        assert!(reporter.fire().is_none());
        assert_eq!(reporter.sequence(), 1);
    }

    #[test]
    fn test_spawned_reporter_exits_on_shutdown() {
        let (reporter, _stats) = reporter_with_stats();
        let handle = reporter.spawn().unwrap();

        reporter.shutdown_flag().raise();
        handle.join().unwrap();
        // The thread must not have fired on its way out
        assert_eq!(reporter.sequence(), 0);
    }
}

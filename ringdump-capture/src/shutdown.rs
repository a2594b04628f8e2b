//! Shutdown signaling and coordination

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tracing::info;

use crate::reporter::PeriodicReporter;

/// Write-once-true shutdown signal, shared by clone.
///
/// Raised at most once, by the signal handler or by duration expiry, and
/// never cleared. The pipeline polls it after every receive attempt.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    flag: Arc<AtomicBool>,
}

impl ShutdownFlag {
    /// Create a new, unraised flag
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Raise the flag
    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested
    pub fn raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Process lifecycle state as seen by the coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Capture is running
    Running,
    /// Shutdown requested; the pipeline has yet to observe the flag and exit
    ShuttingDown,
    /// Pipeline exited and resources were released
    Stopped,
}

const STATE_RUNNING: u8 = 0;
const STATE_SHUTTING_DOWN: u8 = 1;
const STATE_STOPPED: u8 = 2;

/// Single-fire shutdown sequencer.
///
/// `trigger` may be invoked concurrently from the signal-handler thread and
/// from the pipeline itself (duration expiry); the state CAS guarantees the
/// shutdown sequence runs exactly once.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: AtomicU8,
    flag: ShutdownFlag,
    reporter: Arc<PeriodicReporter>,
}

impl ShutdownCoordinator {
    /// Create a coordinator sharing the reporter's shutdown flag
    pub fn new(reporter: Arc<PeriodicReporter>) -> Arc<Self> {
        Arc::new(Self {
            state: AtomicU8::new(STATE_RUNNING),
            flag: reporter.shutdown_flag().clone(),
            reporter,
        })
    }

    /// The shared shutdown flag
    pub fn flag(&self) -> &ShutdownFlag {
        &self.flag
    }

    /// Current lifecycle state
    pub fn state(&self) -> ShutdownState {
        match self.state.load(Ordering::SeqCst) {
            STATE_RUNNING => ShutdownState::Running,
            STATE_SHUTTING_DOWN => ShutdownState::ShuttingDown,
            _ => ShutdownState::Stopped,
        }
    }

    /// Request shutdown. Idempotent: only the first call raises the flag
    /// and runs the reporter's final flush.
    pub fn trigger(&self) {
        if self
            .state
            .compare_exchange(
                STATE_RUNNING,
                STATE_SHUTTING_DOWN,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
        {
            info!("shutdown requested, leaving...");
            self.flag.raise();
            self.reporter.final_flush();
        }
    }

    /// Record that the pipeline has exited and resources were released.
    ///
    /// Only valid after `trigger`; there is no way back to `Running`.
    pub fn mark_stopped(&self) {
        let _ = self.state.compare_exchange(
            STATE_SHUTTING_DOWN,
            STATE_STOPPED,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatsCounter;
    use std::thread;
    use std::time::Duration;

    fn coordinator() -> Arc<ShutdownCoordinator> {
        let reporter = PeriodicReporter::new(StatsCounter::new(), Duration::from_secs(1));
        ShutdownCoordinator::new(reporter)
    }

    #[test]
    fn test_flag_starts_unraised() {
        let flag = ShutdownFlag::new();
        assert!(!flag.raised());
        flag.raise();
        assert!(flag.raised());
    }

    #[test]
    fn test_flag_clone_shares_state() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();
        flag.raise();
        assert!(other.raised());
    }

    #[test]
    fn test_trigger_runs_sequence_once() {
        let reporter = PeriodicReporter::new(StatsCounter::new(), Duration::from_secs(1));
        let coordinator = ShutdownCoordinator::new(reporter.clone());

        coordinator.trigger();
        coordinator.trigger();
        coordinator.trigger();

        assert!(coordinator.flag().raised());
        assert_eq!(coordinator.state(), ShutdownState::ShuttingDown);
        // Exactly one final flush, no matter how many triggers
        assert_eq!(reporter.sequence(), 1);
    }

    #[test]
    fn test_concurrent_triggers_fire_once() {
        let reporter = PeriodicReporter::new(StatsCounter::new(), Duration::from_secs(1));
        let coordinator = ShutdownCoordinator::new(reporter.clone());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                thread::spawn(move || coordinator.trigger())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(reporter.sequence(), 1);
        assert_eq!(coordinator.state(), ShutdownState::ShuttingDown);
    }

    #[test]
    fn test_state_machine_forward_only() {
        let coordinator = coordinator();
        assert_eq!(coordinator.state(), ShutdownState::Running);

        // Stopped before shutdown is a no-op
        coordinator.mark_stopped();
        assert_eq!(coordinator.state(), ShutdownState::Running);

        coordinator.trigger();
        assert_eq!(coordinator.state(), ShutdownState::ShuttingDown);

        coordinator.mark_stopped();
        assert_eq!(coordinator.state(), ShutdownState::Stopped);

        // A late trigger cannot resurrect the pipeline
        coordinator.trigger();
        assert_eq!(coordinator.state(), ShutdownState::Stopped);
    }
}

//! Capture duration enforcement

use tracing::info;

/// Decision returned by [`CaptureDurationGuard::check`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep capturing
    Continue,
    /// The capture window has closed; stop without writing this packet
    Stop,
}

/// Tracks an optional maximum capture window.
///
/// The deadline is anchored to the capture timestamp of the *first observed
/// packet*, not to process start. On an idle link the window therefore only
/// starts counting once traffic actually arrives.
#[derive(Debug)]
pub struct CaptureDurationGuard {
    /// Configured window in seconds; `None` means unlimited
    limit_secs: Option<u64>,
    /// Derived on the first check, set at most once
    deadline: Option<u64>,
}

impl CaptureDurationGuard {
    /// Configure the guard. A duration of zero or less means unlimited.
    pub fn new(duration_secs: i64) -> Self {
        Self {
            limit_secs: u64::try_from(duration_secs).ok().filter(|&d| d > 0),
            deadline: None,
        }
    }

    /// A guard that never stops the capture
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Whether a positive duration is configured
    pub fn is_limited(&self) -> bool {
        self.limit_secs.is_some()
    }

    /// The derived deadline, once the first packet has been observed
    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Decide whether a packet with the given capture timestamp is still
    /// inside the capture window.
    pub fn check(&mut self, ts_sec: u64) -> Verdict {
        let Some(limit) = self.limit_secs else {
            return Verdict::Continue;
        };

        let deadline = *self.deadline.get_or_insert_with(|| {
            let deadline = ts_sec.saturating_add(limit);
            info!(deadline, "capture deadline set");
            deadline
        });

        if ts_sec > deadline {
            Verdict::Stop
        } else {
            Verdict::Continue
        }
    }
}

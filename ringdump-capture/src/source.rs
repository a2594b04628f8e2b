//! Capture source abstraction and the pcap-backed implementation

use pcap::{Active, Capture, Device};
use tracing::{debug, info};

use ringdump_core::{Error, RecordHeader, Result};

/// Default snapshot length (maximum bytes per packet)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Default bounded read timeout (milliseconds).
///
/// This bound is also what keeps shutdown latency at one receive call on an
/// idle link: a blocking receive returns empty after at most this long, and
/// the pipeline re-checks the shutdown flag.
const DEFAULT_TIMEOUT_MS: i32 = 1000;

/// Which traffic a capture session observes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Received and transmitted traffic
    #[default]
    RxAndTx,
    /// Received traffic only
    RxOnly,
    /// Transmitted traffic only
    TxOnly,
}

impl From<Direction> for pcap::Direction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::RxAndTx => pcap::Direction::InOut,
            Direction::RxOnly => pcap::Direction::In,
            Direction::TxOnly => pcap::Direction::Out,
        }
    }
}

/// Counters maintained by the capture source itself
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceStats {
    /// Packets seen by the source
    pub received: u64,
    /// Packets dropped by the source for lack of buffer space
    pub dropped: u64,
    /// Packets dropped by the network interface or its driver
    pub if_dropped: u64,
}

/// Configuration for opening a capture source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Bounded read timeout in milliseconds
    pub read_timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Deliver packets immediately instead of batching
    pub immediate_mode: bool,
    /// Capture buffer size (0 = platform default)
    pub buffer_size: i32,
    /// Poll without blocking; the consumer yields between empty polls
    pub nonblocking: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            immediate_mode: true,
            buffer_size: 0,
            nonblocking: false,
        }
    }
}

/// A source of packet records.
///
/// `receive` fills the caller's buffer and returns the record metadata;
/// `Ok(None)` means no data was pending within the source's own bound
/// (read timeout when blocking, immediately when non-blocking). Closing is
/// RAII: dropping the source releases the handle.
pub trait CaptureSource {
    /// Restrict the session to the given traffic direction
    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    /// Install a packet filter expression. Rejection is fatal at setup time.
    fn set_filter(&mut self, expression: &str) -> Result<()>;

    /// Finish setup and start delivering packets
    fn activate(&mut self) -> Result<()>;

    /// Pull the next packet into `buf`, returning its metadata.
    ///
    /// The payload occupies `buf[..header.captured_len]` until the next
    /// call reuses the buffer.
    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<RecordHeader>>;

    /// The source's own drop/receive counters
    fn stats(&mut self) -> Result<SourceStats>;
}

/// Live capture over a network device via pcap
pub struct PcapSource {
    device: String,
    capture: Option<Capture<Active>>,
    nonblocking: bool,
}

impl PcapSource {
    /// Open a capture handle on `device` with the given configuration.
    ///
    /// The handle is open but not yet tuned; call `set_filter`,
    /// `set_direction` and finally `activate` before receiving.
    pub fn open(device: &str, config: &SourceConfig) -> Result<Self> {
        debug!(device, snaplen = config.snaplen, "opening capture");

        let mut inactive = Capture::from_device(Device::from(device))
            .map_err(|e| Error::Capture(format!("failed to create capture on '{device}': {e}")))?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.read_timeout_ms)
            .immediate_mode(config.immediate_mode);

        if config.buffer_size > 0 {
            inactive = inactive.buffer_size(config.buffer_size);
        }

        let capture = inactive
            .open()
            .map_err(|e| Error::Capture(format!("failed to open '{device}': {e}")))?;

        info!(device, "capture opened");
        Ok(Self {
            device: device.to_string(),
            capture: Some(capture),
            nonblocking: config.nonblocking,
        })
    }

    /// The device this source captures from
    pub fn device(&self) -> &str {
        &self.device
    }

    /// The link type of the underlying capture
    pub fn link_type(&self) -> Result<pcap::Linktype> {
        Ok(self
            .capture
            .as_ref()
            .ok_or_else(|| Error::Capture("capture handle is closed".to_string()))?
            .get_datalink())
    }

    fn capture(&mut self) -> Result<&mut Capture<Active>> {
        self.capture
            .as_mut()
            .ok_or_else(|| Error::Capture("capture handle is closed".to_string()))
    }
}

impl CaptureSource for PcapSource {
    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.capture()?
            .direction(direction.into())
            .map_err(|e| Error::Capture(format!("failed to set direction: {e}")))?;
        debug!(?direction, "capture direction set");
        Ok(())
    }

    fn set_filter(&mut self, expression: &str) -> Result<()> {
        self.capture()?
            .filter(expression, true)
            .map_err(|e| Error::Filter(format!("'{expression}' rejected: {e}")))?;
        info!(filter = expression, "packet filter installed");
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        if self.nonblocking {
            let capture = self
                .capture
                .take()
                .ok_or_else(|| Error::Capture("capture handle is closed".to_string()))?;
            let capture = capture
                .setnonblock()
                .map_err(|e| Error::Capture(format!("failed to enter non-blocking mode: {e}")))?;
            self.capture = Some(capture);
        }
        info!(device = %self.device, "capture enabled");
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<Option<RecordHeader>> {
        match self.capture()?.next_packet() {
            Ok(packet) => {
                let copied = packet.data.len().min(buf.len());
                buf[..copied].copy_from_slice(&packet.data[..copied]);
                Ok(Some(RecordHeader {
                    ts_sec: packet.header.ts.tv_sec.max(0) as u64,
                    ts_usec: packet.header.ts.tv_usec.max(0) as u32,
                    captured_len: copied as u32,
                    original_len: packet.header.len,
                }))
            }
            Err(pcap::Error::TimeoutExpired) => Ok(None),
            Err(e) => Err(Error::Capture(format!("receive failed: {e}"))),
        }
    }

    fn stats(&mut self) -> Result<SourceStats> {
        let stat = self
            .capture()?
            .stats()
            .map_err(|e| Error::Capture(format!("failed to read source stats: {e}")))?;
        Ok(SourceStats {
            received: stat.received as u64,
            dropped: stat.dropped as u64,
            if_dropped: stat.if_dropped as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_default() {
        let config = SourceConfig::default();
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.read_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.promiscuous);
        assert!(config.immediate_mode);
        assert!(!config.nonblocking);
    }

    #[test]
    fn test_direction_mapping() {
        assert!(matches!(
            pcap::Direction::from(Direction::RxOnly),
            pcap::Direction::In
        ));
        assert!(matches!(
            pcap::Direction::from(Direction::TxOnly),
            pcap::Direction::Out
        ));
        assert!(matches!(
            pcap::Direction::from(Direction::RxAndTx),
            pcap::Direction::InOut
        ));
    }

    #[test]
    fn test_open_unknown_device_fails() {
        let result = PcapSource::open("no_such_device_xyz", &SourceConfig::default());
        assert!(result.is_err());
    }
}

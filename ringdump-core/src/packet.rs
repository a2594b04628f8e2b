//! Packet record types

/// Capture metadata for a single packet, as delivered by the capture source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Capture timestamp, seconds part
    pub ts_sec: u64,
    /// Capture timestamp, microseconds part
    pub ts_usec: u32,
    /// Bytes actually captured (bounded by snaplen)
    pub captured_len: u32,
    /// Original on-wire length (may exceed `captured_len` when truncated)
    pub original_len: u32,
}

/// A captured packet: header plus payload borrowed from the capture buffer.
///
/// Produced once by the capture source and consumed once by the pipeline;
/// the payload slice is only valid until the next receive call reuses the
/// buffer.
#[derive(Debug, Clone, Copy)]
pub struct PacketRecord<'a> {
    /// Capture metadata
    pub header: RecordHeader,
    /// Captured payload bytes, `header.captured_len` long
    pub payload: &'a [u8],
}

impl<'a> PacketRecord<'a> {
    /// Create a record from a header and its payload slice
    pub fn new(header: RecordHeader, payload: &'a [u8]) -> Self {
        debug_assert_eq!(header.captured_len as usize, payload.len());
        Self { header, payload }
    }

    /// Captured payload length in bytes
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Check if the record carries no payload
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Whether the payload was truncated to the snapshot length
    pub fn is_truncated(&self) -> bool {
        self.header.captured_len < self.header.original_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(caplen: u32, origlen: u32) -> RecordHeader {
        RecordHeader {
            ts_sec: 1700000000,
            ts_usec: 250_000,
            captured_len: caplen,
            original_len: origlen,
        }
    }

    #[test]
    fn test_record_basics() {
        let payload = [0u8; 64];
        let record = PacketRecord::new(header(64, 64), &payload);
        assert_eq!(record.len(), 64);
        assert!(!record.is_empty());
        assert!(!record.is_truncated());
    }

    #[test]
    fn test_truncated_record() {
        let payload = [0u8; 128];
        let record = PacketRecord::new(header(128, 1514), &payload);
        assert!(record.is_truncated());
        assert_eq!(record.header.original_len, 1514);
    }
}

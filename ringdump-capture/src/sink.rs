//! Output sinks for captured packets

use std::path::{Path, PathBuf};

use pcap::{Capture, Linktype};
use tracing::info;

use ringdump_core::{Error, PacketRecord, Result};

/// A destination for packet records.
///
/// The pipeline is the sink's only writer; a sink is owned and mutated by
/// exactly one capture loop. Closing is RAII: dropping the sink flushes and
/// releases the file.
pub trait PacketSink {
    /// Append one record
    fn write_record(&mut self, record: &PacketRecord<'_>) -> Result<()>;

    /// Push buffered records to stable storage
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// pcap-format file writer.
///
/// Produces the standard pcap container (global header, then per-record
/// timestamp seconds/microseconds, captured length, original length and
/// payload), readable by existing pcap tooling.
pub struct PcapFileSink {
    savefile: pcap::Savefile,
    path: PathBuf,
}

impl PcapFileSink {
    /// Create the dump file at `path` for the given link type
    pub fn open<P: AsRef<Path>>(path: P, link_type: Linktype) -> Result<Self> {
        let path = path.as_ref();
        let dead = Capture::dead(link_type)
            .map_err(|e| Error::Sink(format!("failed to prepare pcap writer: {e}")))?;
        let savefile = dead
            .savefile(path)
            .map_err(|e| Error::Sink(format!("failed to open '{}': {e}", path.display())))?;

        info!(path = %path.display(), "dump file opened");
        Ok(Self {
            savefile,
            path: path.to_path_buf(),
        })
    }

    /// The dump file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PacketSink for PcapFileSink {
    fn write_record(&mut self, record: &PacketRecord<'_>) -> Result<()> {
        let header = pcap::PacketHeader {
            ts: libc::timeval {
                tv_sec: record.header.ts_sec as libc::time_t,
                tv_usec: record.header.ts_usec as libc::suseconds_t,
            },
            caplen: record.header.captured_len,
            len: record.header.original_len,
        };
        self.savefile.write(&pcap::Packet::new(&header, record.payload));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.savefile
            .flush()
            .map_err(|e| Error::Sink(format!("failed to flush '{}': {e}", self.path.display())))
    }
}

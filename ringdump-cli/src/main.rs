//! ringdump: capture packets from a network interface into a pcap file

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ringdump_capture::{
    get_interface, list_interfaces, CaptureDurationGuard, CapturePipeline, CaptureSource,
    PcapFileSink, PcapSource, PeriodicReporter, ShutdownCoordinator, SourceConfig, StatsCounter,
};
use ringdump_cli::Cli;
use ringdump_core::{Error, Result};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if cli.list_interfaces {
        for iface in list_interfaces()? {
            if iface.is_capture_capable() {
                println!(
                    "{}\t{}",
                    iface.name,
                    iface.mac.as_deref().unwrap_or("--:--:--:--:--:--"),
                );
            }
        }
        return Ok(());
    }

    let device = cli
        .interface
        .ok_or_else(|| Error::config("a capture interface is required (-i)"))?;
    let output = cli
        .output
        .ok_or_else(|| Error::config("a dump file path is required (-w)"))?;

    let iface = get_interface(&device)?;
    if !iface.is_up {
        return Err(Error::Interface(format!("interface '{device}' is not up")));
    }
    info!(
        device = %iface.name,
        mac = iface.mac.as_deref().unwrap_or("unknown"),
        "capturing from device"
    );

    let config = SourceConfig {
        snaplen: cli.snaplen,
        nonblocking: cli.active_wait,
        ..SourceConfig::default()
    };
    let mut source = PcapSource::open(&device, &config)?;
    if let Some(filter) = &cli.filter {
        source.set_filter(filter)?;
    }
    source.set_direction(cli.direction.into())?;
    source.activate()?;

    // The dump file must open before the pipeline ever runs; failure here
    // aborts with the capture handle released by drop.
    let link_type = source.link_type()?;
    let sink = PcapFileSink::open(&output, link_type)?;

    let stats = StatsCounter::new();
    let reporter = PeriodicReporter::new(
        stats.clone(),
        Duration::from_secs(cli.stats_interval.max(1)),
    );
    let coordinator = ShutdownCoordinator::new(reporter.clone());

    // SIGINT and SIGTERM both request the same idempotent shutdown
    {
        let coordinator = Arc::clone(&coordinator);
        ctrlc::set_handler(move || coordinator.trigger())
            .map_err(|e| Error::config(format!("failed to install signal handler: {e}")))?;
    }

    let reporter_thread = reporter.spawn()?;

    let mut pipeline = CapturePipeline::new(source, sink, stats.clone(), Arc::clone(&coordinator))
        .with_duration_guard(CaptureDurationGuard::new(cli.duration))
        .with_wait_for_packet(!cli.active_wait)
        .with_buffer_len(cli.snaplen.max(64) as usize);
    let summary = pipeline.run()?;

    // A deadline stop has already triggered; a signal arriving now lands in
    // the same idempotent path.
    coordinator.trigger();
    if reporter_thread.join().is_err() {
        warn!("stats reporter thread panicked");
    }
    drop(pipeline); // releases the capture handle and the dump file
    coordinator.mark_stopped();

    let totals = stats.snapshot();
    info!(
        packets = totals.total_packets,
        bytes = totals.total_bytes,
        drops = totals.total_drops,
        stop_reason = ?summary.stop_reason,
        dump = %output.display(),
        "capture stopped"
    );
    Ok(())
}

//! espmon-host - Main entry point
//!
//! Collects CPU and GPU telemetry in the background and answers the display's
//! requests over a serial port until interrupted.

use anyhow::Context;
use clap::Parser;
use espmon_host_lib::core::{Config, MetricStore, SerialConfig};
use espmon_host_lib::hardware::{Collector, SystemProvider};
use espmon_host_lib::protocol::{
    available_ports, choose_port, probe_port, LogCrateSink, ProtocolServer, SerialSession,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delay before looking for the display again after the link drops
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Parser)]
#[command(name = "espmon-host", version, about = "Serve PC telemetry to a serial display")]
struct Args {
    /// Serial port to use (overrides the config file)
    #[arg(short, long)]
    port: Option<String>,

    /// Sensor refresh interval in milliseconds
    #[arg(long)]
    refresh_ms: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_ports {
        for port in available_ports().context("Failed to list serial ports")? {
            println!("{}", port);
        }
        return Ok(());
    }

    log::info!("Starting espmon-host v{}", env!("CARGO_PKG_VERSION"));

    // Load or create configuration
    let loaded = match &args.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let mut config = loaded.unwrap_or_else(|e| {
        log::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    if let Some(port) = args.port {
        config.serial.port = Some(port);
    }
    if let Some(refresh_ms) = args.refresh_ms {
        config.general.refresh_rate_ms = refresh_ms;
    }

    let provider = SystemProvider::detect(&config.sensors)
        .context("Failed to initialize hardware sensors")?;
    log::info!("Detected {} hardware nodes", provider.node_count());

    let store = Arc::new(MetricStore::new());
    let collector = Collector::new(Box::new(provider), Arc::clone(&store));
    let shutdown = Arc::new(AtomicBool::new(false));

    let collecting = tokio::spawn(collection_loop(collector, config.general.refresh_rate_ms));

    let serving = {
        let store = Arc::clone(&store);
        let shutdown = Arc::clone(&shutdown);
        let serial = config.serial.clone();
        let poll_interval = Duration::from_millis(config.general.poll_interval_ms);
        tokio::task::spawn_blocking(move || serial_loop(store, serial, poll_interval, &shutdown))
    };

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    log::info!("Shutting down");

    shutdown.store(true, Ordering::Relaxed);
    collecting.abort();
    serving.await.context("Serial task panicked")?;

    Ok(())
}

/// Background task that refreshes the metric store on every tick
async fn collection_loop(mut collector: Collector, refresh_ms: u64) {
    log::info!(
        "Collecting from {} every {}ms",
        collector.provider_name(),
        refresh_ms
    );

    let mut interval = tokio::time::interval(Duration::from_millis(refresh_ms.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        if let Err(e) = collector.refresh() {
            log::warn!("Sensor refresh failed, keeping previous values: {}", e);
        }
    }
}

/// Find the display, serve it until the link drops, and start over
fn serial_loop(
    store: Arc<MetricStore>,
    serial: SerialConfig,
    poll_interval: Duration,
    shutdown: &AtomicBool,
) {
    let mut server = ProtocolServer::new(store, Box::new(LogCrateSink));

    while !shutdown.load(Ordering::Relaxed) {
        match connect(&serial) {
            Ok(Some(session)) => {
                server.open(session);
                if let Err(e) = server.run(shutdown, poll_interval) {
                    log::warn!("Serial link lost: {}", e);
                }
                server.close();
            }
            Ok(None) => log::debug!("No serial ports available"),
            Err(e) => log::warn!("Failed to open serial port: {}", e),
        }

        if !shutdown.load(Ordering::Relaxed) {
            std::thread::sleep(RECONNECT_DELAY);
        }
    }
}

fn connect(serial: &SerialConfig) -> espmon_host_lib::core::Result<Option<SerialSession>> {
    let ports = available_ports()?;
    let Some(name) = choose_port(&ports, serial.port.as_deref(), |name| probe_port(name, serial))
    else {
        return Ok(None);
    };
    SerialSession::open(&name, serial).map(Some)
}

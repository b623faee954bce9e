//! espmon-host - Demo CLI
//!
//! Runs the collector for a few ticks without a serial link and prints what the
//! display would receive.

use clap::Parser;
use espmon_host_lib::core::{Config, MetricSnapshot, MetricStore, Part};
use espmon_host_lib::hardware::mock::MockProvider;
use espmon_host_lib::hardware::{Collector, SensorProvider, SystemProvider};
use espmon_host_lib::protocol::{Command, Telegram};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "espmon-demo", about = "Print collected metrics and the telegrams built from them")]
struct Args {
    /// Number of collection ticks to run
    #[arg(short, long, default_value_t = 10)]
    ticks: u32,

    /// Print each snapshot as a JSON line instead of a table
    #[arg(long)]
    json: bool,

    /// Use scripted sensor values instead of the real hardware
    #[arg(long)]
    mock: bool,
}

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::default();

    let provider: Box<dyn SensorProvider> = if args.mock {
        Box::new(MockProvider::desktop())
    } else {
        match SystemProvider::detect(&config.sensors) {
            Ok(provider) => Box::new(provider),
            Err(e) => {
                eprintln!("No hardware sensors: {}", e);
                eprintln!("Using scripted values instead...");
                Box::new(MockProvider::desktop())
            }
        }
    };

    let store = Arc::new(MetricStore::new());
    let mut collector = Collector::new(provider, Arc::clone(&store));

    if !args.json {
        println!("==============================================");
        println!("   espmon-host - Demo CLI ({})", collector.provider_name());
        println!("==============================================\n");
    }

    for tick in 1..=args.ticks {
        if let Err(e) = collector.refresh() {
            eprintln!("Refresh failed: {}", e);
        }

        let snapshot = store.snapshot();
        if args.json {
            match serde_json::to_string(snapshot.as_ref()) {
                Ok(line) => println!("{}", line),
                Err(e) => eprintln!("Failed to serialize snapshot: {}", e),
            }
        } else {
            print_table(tick, &snapshot);
        }

        if tick < args.ticks {
            thread::sleep(Duration::from_millis(config.general.refresh_rate_ms));
        }
    }

    if !args.json {
        let snapshot = store.snapshot();
        println!("=== Telegrams ===\n");
        for command in [Command::Basic, Command::Extended] {
            let telegram = Telegram::build(command, &snapshot);
            println!("  {:<9} {:?}", command.as_str(), telegram.values());
            println!("            {}", hex(&telegram.encode()));
        }
        println!();
    }
}

fn print_table(tick: u32, snapshot: &MetricSnapshot) {
    println!("--- tick {} ---", tick);
    for part in Part::ALL {
        let Some(metrics) = snapshot.part(part) else {
            continue;
        };
        for (metric, value) in metrics {
            println!("  {:<7} {:<26} {:>9.1}", part, metric, value);
        }
    }
    println!();
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

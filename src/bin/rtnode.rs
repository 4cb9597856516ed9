use clap::{App, Arg};
use colored::*;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};

use rtnode::node::{Node, NodeConfig};
use rtnode::report::{NodeReport, ReportWriter};

const REPORT_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("rtnode")
        .version("0.1.0")
        .author("Embedded Systems Engineering Team")
        .about("Real-time node simulator - periodic sensor sampling and packet validation with soft-deadline monitoring")
        .arg(
            Arg::with_name("sensor-period-ms")
                .long("sensor-period-ms")
                .value_name("MS")
                .help("Sensor task period in milliseconds")
                .takes_value(true)
                .default_value("100"),
        )
        .arg(
            Arg::with_name("network-period-ms")
                .long("network-period-ms")
                .value_name("MS")
                .help("Network task period in milliseconds")
                .takes_value(true)
                .default_value("10"),
        )
        .arg(
            Arg::with_name("deadline-ticks")
                .long("deadline-ticks")
                .value_name("TICKS")
                .help("Soft-deadline threshold for both tasks, in ticks")
                .takes_value(true)
                .default_value("5"),
        )
        .arg(
            Arg::with_name("duration-secs")
                .long("duration-secs")
                .value_name("SECS")
                .help("Stop after this many seconds (0 = run until interrupted)")
                .takes_value(true)
                .default_value("0"),
        )
        .arg(
            Arg::with_name("no-jitter")
                .long("no-jitter")
                .help("Disable the injected execution jitter"),
        )
        .get_matches();

    let sensor_period_ms: u64 = matches.value_of("sensor-period-ms").unwrap_or("100").parse()?;
    let network_period_ms: u64 = matches.value_of("network-period-ms").unwrap_or("10").parse()?;
    let deadline_ticks: u64 = matches.value_of("deadline-ticks").unwrap_or("5").parse()?;
    let duration_secs: u64 = matches.value_of("duration-secs").unwrap_or("0").parse()?;
    let jitter_enabled = !matches.is_present("no-jitter");

    let mut config = NodeConfig::default();
    config.sensor.period = Duration::from_millis(sensor_period_ms);
    config.sensor.lock_wait = Duration::from_millis(sensor_period_ms / 2);
    config.sensor.deadline_ticks = deadline_ticks;
    config.sensor.jitter.enabled = jitter_enabled;
    config.network.period = Duration::from_millis(network_period_ms);
    config.network.deadline_ticks = deadline_ticks;
    config.network.jitter.enabled = jitter_enabled;

    println!("{}", "rtnode - real-time node simulator".bold());
    println!(
        "   sensor task:  period {} ms, deadline {} ticks",
        sensor_period_ms, deadline_ticks
    );
    println!(
        "   network task: period {} ms, deadline {} ticks",
        network_period_ms, deadline_ticks
    );
    if !jitter_enabled {
        println!("   jitter injection: {}", "disabled".yellow());
    }

    let node = match Node::new(config) {
        Ok(node) => node,
        Err(e) => {
            tracing::error!("node setup failed: {}", e);
            return Err(e.into());
        }
    };
    let handle = node.spawn();

    let mut writer = ReportWriter::new();
    let mut report_interval = time::interval(REPORT_PERIOD);
    // First interval tick completes immediately; skip the empty report.
    report_interval.tick().await;

    let run_deadline = if duration_secs > 0 {
        Some(time::Instant::now() + Duration::from_secs(duration_secs))
    } else {
        None
    };

    loop {
        tokio::select! {
            _ = report_interval.tick() => {
                let report = handle.report();
                match writer.render_json(&report) {
                    Ok(line) => info!(target: "rtnode::report", "{}", line),
                    Err(e) => warn!("status report dropped: {}", e),
                }

                if let Some(end) = run_deadline {
                    if time::Instant::now() >= end {
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "interrupt received, shutting down".yellow());
                break;
            }
        }
    }

    let report = handle.shutdown().await;
    print_summary(&report);

    Ok(())
}

fn print_summary(report: &NodeReport) {
    println!();
    println!("{}", "final summary".bold());
    println!("   uptime: {} ticks", report.uptime_ticks);

    let sensor = &report.sensor;
    println!(
        "   sensor:  {} cycles, {} updates, {} skipped, {}",
        sensor.cycles,
        sensor.updates,
        sensor.updates_skipped,
        miss_label(sensor.deadline_misses)
    );

    let network = &report.network;
    println!(
        "   network: {} cycles, {} accepted ({} MQTT), {} rejected, {}",
        network.cycles,
        network.frames_accepted,
        network.mqtt_frames,
        network.frames_rejected,
        miss_label(network.deadline_misses)
    );
}

fn miss_label(misses: u64) -> ColoredString {
    if misses == 0 {
        "0 deadline misses".green()
    } else {
        format!("{} deadline misses", misses).red()
    }
}

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use gps_speedometer_rs::geodesic::DistanceSolver;
use gps_speedometer_rs::live_status::format_moving_time;
use gps_speedometer_rs::pipeline::{MovementRule, PipelineConfig};
use gps_speedometer_rs::replay::{parse_records, replay};

#[derive(Parser, Debug)]
#[command(about = "Replay a recorded JSON-lines track through the speedometer pipeline")]
struct Args {
    /// Track to replay (reads stdin when omitted)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Update period the track was recorded at (ms)
    #[arg(long, default_value = "1000")]
    period: u64,

    /// Use haversine instead of Vincenty
    #[arg(long, default_value_t = false)]
    haversine: bool,

    /// Count a fix as moved when either coordinate changes
    #[arg(long, default_value_t = false)]
    either_axis: bool,

    /// Ignore accel records (GPS-only pipeline)
    #[arg(long, default_value_t = false)]
    no_motion_gate: bool,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let records = match &args.log {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            parse_records(BufReader::new(file))?
        }
        None => parse_records(io::stdin().lock())?,
    };

    let config = PipelineConfig {
        update_period: Duration::from_millis(args.period),
        solver: if args.haversine {
            DistanceSolver::Haversine
        } else {
            DistanceSolver::Vincenty
        },
        movement_rule: if args.either_axis {
            MovementRule::EitherAxis
        } else {
            MovementRule::BothAxes
        },
    };
    let summary = replay(&records, config, !args.no_motion_gate)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("=== Replay ===");
    println!("Fixes: {} ({} without a fix)", summary.fixes, summary.no_fix);
    println!("Accel samples: {}", summary.accel_samples);
    println!(
        "Segments: {} accepted, {} rejected, {} locked",
        summary.accepted, summary.rejected, summary.locked
    );
    println!("Full stops: {}", summary.stops);
    println!("Solver failures: {}", summary.solver_failures);
    println!("Distance: {:.2} m", summary.distance_m);
    println!("Moving time: {}", format_moving_time(summary.moving_time_seconds));
    println!("Max speed: {:.1} km/h", summary.max_speed_kmh);
    println!("Final speed: {:.1} km/h", summary.final_speed_kmh);
    println!("Altitude: {:.1} m", summary.altitude_m);

    Ok(())
}

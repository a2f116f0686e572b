use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;

use gps_speedometer_rs::geodesic::DistanceSolver;
use gps_speedometer_rs::live_status::format_moving_time;
use gps_speedometer_rs::pipeline::MovementRule;
use gps_speedometer_rs::runtime;
use gps_speedometer_rs::settings::{Settings, SourceKind};
use gps_speedometer_rs::types::UnitSystem;

#[derive(Parser, Debug)]
#[command(name = "speedometer")]
#[command(about = "GPS speedometer - smoothed speed, distance and moving time from raw fixes", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until Ctrl-C)
    #[arg(value_name = "SECONDS")]
    duration: Option<u64>,

    /// TOML settings file; its unit_system is re-read while running
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Update period in milliseconds
    #[arg(long, value_name = "MS")]
    period: Option<u64>,

    /// Display units (metric, imperial)
    #[arg(long)]
    units: Option<UnitSystem>,

    /// Distance solver (vincenty, haversine)
    #[arg(long, value_parser = parse_solver)]
    solver: Option<DistanceSolver>,

    /// Count a fix as moved when either coordinate changes
    #[arg(long)]
    either_axis: bool,

    /// GPS only: don't use the accelerometer to hold distance after a stop
    #[arg(long)]
    no_motion_gate: bool,

    /// Fix source
    #[arg(long, value_enum)]
    source: Option<SourceKind>,

    /// Write the live status JSON here on every refresh
    #[arg(long, value_name = "FILE")]
    status: Option<PathBuf>,

    /// Don't print the instrument line
    #[arg(long, short)]
    quiet: bool,
}

fn parse_solver(value: &str) -> std::result::Result<DistanceSolver, String> {
    match value.to_ascii_lowercase().as_str() {
        "vincenty" => Ok(DistanceSolver::Vincenty),
        "haversine" => Ok(DistanceSolver::Haversine),
        other => Err(format!("unknown solver '{other}' (expected vincenty or haversine)")),
    }
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(duration) = self.duration {
            settings.duration_secs = duration;
        }
        if let Some(period) = self.period {
            settings.update_period_ms = period;
        }
        if let Some(units) = self.units {
            settings.unit_system = units;
        }
        if let Some(solver) = self.solver {
            settings.solver = solver;
        }
        if self.either_axis {
            settings.movement_rule = MovementRule::EitherAxis;
        }
        if self.no_motion_gate {
            settings.motion_gate = false;
        }
        if let Some(source) = self.source {
            settings.source = source;
        }
        if let Some(status) = &self.status {
            settings.status_path = Some(status.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())
        .with_context(|| format!("loading settings from {:?}", args.config))?;
    args.apply(&mut settings);
    settings.validate()?;

    println!("[{}] GPS Speedometer Starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", settings.duration_secs);
    println!("  Update period: {} ms", settings.update_period_ms);
    println!("  Units: {}", settings.unit_system);
    println!("  Solver: {:?}", settings.solver);
    println!("  Motion gate: {}", settings.motion_gate);
    println!("  Source: {:?}", settings.source);

    let status = runtime::run(settings, args.config.clone(), args.quiet).await?;

    println!("\n=== Final Stats ===");
    println!("Ticks: {} ({} accepted segments, {} solver failures)", status.ticks, status.accepted_segments, status.solver_failures);
    println!("Distance: {:.2} {}", status.distance, status.distance_unit);
    println!("Speed: {:.1} {}", status.speed, status.speed_unit);
    println!("Altitude: {:.1} {}", status.altitude, status.altitude_unit);
    println!("Moving time: {}", format_moving_time(status.moving_time_seconds));

    Ok(())
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}

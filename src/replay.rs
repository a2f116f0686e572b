//! Offline replay of a recorded track.
//!
//! A track is JSON lines, one record per line, in the order they happened:
//!
//! ```text
//! {"type":"accel","timestamp_ms":1000,"x":0.01,"y":0.02,"z":9.81}
//! {"type":"fix","latitude":52.2297,"longitude":21.0122,"altitude":110.0}
//! ```
//!
//! Every `fix` record is one pipeline tick; `accel` records between them feed
//! the motion gate. There is no clock involved, so a replay is deterministic.

use serde::{Deserialize, Serialize};
use std::io::BufRead;

use crate::error::{Result, SpeedometerError};
use crate::motion_gate::MotionGate;
use crate::pipeline::{LocationCalculator, PipelineConfig, TickCounters, TickOutcome};
use crate::types::{AccelData, Fix, UnitSystem};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReplayRecord {
    Fix(Fix),
    Accel(AccelData),
}

/// Read a JSON-lines track. Blank lines are skipped.
pub fn parse_records<R: BufRead>(reader: R) -> Result<Vec<ReplayRecord>> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SpeedometerError::Replay(format!("line {}: {e}", index + 1)))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| SpeedometerError::Replay(format!("line {}: {e}", index + 1)))?;
        records.push(record);
    }
    Ok(records)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub fixes: u64,
    pub accel_samples: u64,
    pub no_fix: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub locked: u64,
    pub stops: u64,
    pub solver_failures: u64,
    pub distance_m: f64,
    pub moving_time_seconds: i64,
    pub final_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub altitude_m: f64,
    pub counters: TickCounters,
}

impl ReplaySummary {
    fn record(&mut self, outcome: TickOutcome) {
        match outcome {
            TickOutcome::NoFix => self.no_fix += 1,
            TickOutcome::Accepted { .. } => self.accepted += 1,
            TickOutcome::Rejected { .. } => self.rejected += 1,
            TickOutcome::Locked { .. } => self.locked += 1,
            TickOutcome::SolverFailed => self.solver_failures += 1,
            TickOutcome::Stopped => self.stops += 1,
            TickOutcome::Baseline | TickOutcome::Stationary { .. } => {}
        }
    }
}

/// Run `records` through a fresh pipeline. With `gated` the accel records
/// drive the stop-lock; without it they're counted and ignored.
pub fn replay(records: &[ReplayRecord], config: PipelineConfig, gated: bool) -> Result<ReplaySummary> {
    let mut calculator = LocationCalculator::new(config)?;
    let mut gate = MotionGate::new();
    let flag = gate.flag();
    let mut summary = ReplaySummary::default();

    for record in records {
        match record {
            ReplayRecord::Accel(sample) => {
                summary.accel_samples += 1;
                if gated {
                    gate.on_accel(sample);
                }
            }
            ReplayRecord::Fix(fix) => {
                summary.fixes += 1;
                let motion = gated.then(|| flag.get());
                let outcome = calculator.tick(*fix, motion);
                log::trace!("fix {}: {outcome:?}", summary.fixes);
                summary.record(outcome);
                summary.max_speed_kmh = summary
                    .max_speed_kmh
                    .max(calculator.speed(UnitSystem::Metric));
            }
        }
    }

    summary.distance_m = calculator.distance_total(UnitSystem::Metric);
    summary.moving_time_seconds = calculator.moving_time();
    summary.final_speed_kmh = calculator.speed(UnitSystem::Metric);
    summary.altitude_m = calculator.altitude(UnitSystem::Metric);
    summary.counters = calculator.counters();
    Ok(summary)
}

/// Only the fixes of a track, for driving a [`crate::sources::ReplayFixSource`].
pub fn fixes(records: &[ReplayRecord]) -> Vec<Fix> {
    records
        .iter()
        .filter_map(|record| match record {
            ReplayRecord::Fix(fix) => Some(*fix),
            ReplayRecord::Accel(_) => None,
        })
        .collect()
}

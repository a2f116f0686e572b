use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::motion_gate::MotionSnapshot;
use crate::pipeline::{Readings, TickCounters};
use crate::types::UnitSystem;

/// What the instrument shows, dumped as JSON for anything else that wants it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub unit_system: UnitSystem,
    pub speed: f64,
    pub speed_unit: String,
    pub distance: f64,
    pub distance_unit: String,
    pub altitude: f64,
    pub altitude_unit: String,
    pub moving_time_seconds: i64,
    pub stop_lock: bool,
    // GPS data
    pub gps_lat: f64,
    pub gps_lon: f64,
    pub gps_alt: f64,
    pub gps_accuracy: f64,
    // Accelerometer
    pub motion_gate_enabled: bool,
    pub accel_axes: [f32; 3],
    pub accelerating: bool,
    pub accel_silent: bool,
    // Counters
    pub ticks: u64,
    pub accepted_segments: u64,
    pub solver_failures: u64,
    pub uptime_seconds: u64,
}

impl LiveStatus {
    pub fn new(readings: &Readings, counters: TickCounters) -> Self {
        let unit = readings.unit_system;
        let fix = readings.last_fix.unwrap_or_default();
        Self {
            timestamp: current_timestamp(),
            unit_system: unit,
            speed: readings.speed,
            speed_unit: unit.speed_label().to_string(),
            distance: readings.distance,
            distance_unit: unit.distance_label().to_string(),
            altitude: readings.altitude,
            altitude_unit: unit.altitude_label().to_string(),
            moving_time_seconds: readings.moving_time_seconds,
            stop_lock: readings.stop_lock,
            gps_lat: fix.latitude,
            gps_lon: fix.longitude,
            gps_alt: fix.altitude,
            gps_accuracy: 0.0,
            motion_gate_enabled: false,
            accel_axes: [0.0; 3],
            accelerating: false,
            accel_silent: false,
            ticks: counters.ticks,
            accepted_segments: counters.accepted_segments,
            solver_failures: counters.solver_failures,
            uptime_seconds: 0,
        }
    }

    pub fn with_motion(mut self, snapshot: MotionSnapshot, silent: bool) -> Self {
        self.motion_gate_enabled = true;
        self.accel_axes = snapshot.axes;
        self.accelerating = snapshot.is_accelerating;
        self.accel_silent = silent;
        self
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Moving time as H:MM:SS
pub fn format_moving_time(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}:{:02}", seconds / 3600, (seconds / 60) % 60, seconds % 60)
}

pub fn current_timestamp() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

//! Where fixes and accelerometer samples come from.
//!
//! Fix sources answer "what is the last known fix" on demand and hand out
//! [`Fix::UNAVAILABLE`] when they have nothing. Live sources are refreshed by
//! a background task into a [`LastKnownFix`] cell so a tick never waits on
//! the location provider.

use serde::Deserialize;
use serde_json::Value;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

use crate::error::{Result, SpeedometerError};
use crate::types::{AccelData, Fix};

/// Sample source contract: last known fix on demand.
pub trait FixSource: Send {
    /// Last known fix, or [`Fix::UNAVAILABLE`]
    fn get_fix(&mut self) -> Fix;

    /// Horizontal accuracy of that fix in meters, 0 when unknown
    fn accuracy(&self) -> f64 {
        0.0
    }
}

/// Last known fix, written by a provider task and read by the tick.
#[derive(Clone, Debug, Default)]
pub struct LastKnownFix {
    inner: Arc<Mutex<Option<(Fix, f64)>>>,
}

impl LastKnownFix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, fix: Fix, accuracy: f64) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some((fix, accuracy));
        }
    }

    pub fn get(&self) -> Option<(Fix, f64)> {
        self.inner.lock().ok().and_then(|slot| *slot)
    }
}

impl FixSource for LastKnownFix {
    fn get_fix(&mut self) -> Fix {
        self.get().map(|(fix, _)| fix).unwrap_or(Fix::UNAVAILABLE)
    }

    fn accuracy(&self) -> f64 {
        self.get().map(|(_, accuracy)| accuracy).unwrap_or(0.0)
    }
}

/// Synthetic drive: a few seconds without a fix, parked, a straight leg at
/// ~12 m/s, parked again. Repeats.
#[derive(Debug)]
pub struct MockFixSource {
    calls: u64,
    position: (f64, f64),
}

impl MockFixSource {
    const WARMUP: u64 = 2;
    const PARKED: u64 = 8;
    const DRIVING: u64 = 30;
    const START: (f64, f64) = (52.2297, 21.0122);
    /// ~12 m per second north-east at this latitude
    const STEP_DEG: (f64, f64) = (0.000076, 0.000124);

    pub fn new() -> Self {
        Self {
            calls: 0,
            position: Self::START,
        }
    }
}

impl Default for MockFixSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FixSource for MockFixSource {
    fn get_fix(&mut self) -> Fix {
        let seq = self.calls;
        self.calls += 1;

        if seq < Self::WARMUP {
            return Fix::UNAVAILABLE;
        }

        let cycle = (seq - Self::WARMUP) % (2 * Self::PARKED + Self::DRIVING);
        if cycle >= Self::PARKED && cycle < Self::PARKED + Self::DRIVING {
            // a little lateral wobble so neither axis repeats exactly
            let wobble = (seq as f64 * 0.7).sin() * 0.000002;
            self.position.0 += Self::STEP_DEG.0 + wobble;
            self.position.1 += Self::STEP_DEG.1 - wobble;
        }

        let altitude = 110.0 + (seq as f64 * 0.05).sin() * 3.0;
        Fix::new(self.position.0, self.position.1, altitude)
    }

    fn accuracy(&self) -> f64 {
        if self.calls <= Self::WARMUP {
            0.0
        } else {
            4.0 + (self.calls as f64 * 0.1).sin()
        }
    }
}

/// Recorded fixes served in order, then the last one forever.
#[derive(Debug, Default)]
pub struct ReplayFixSource {
    fixes: Vec<Fix>,
    next: usize,
}

impl ReplayFixSource {
    pub fn new(fixes: Vec<Fix>) -> Self {
        Self { fixes, next: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.fixes.len().saturating_sub(self.next)
    }
}

impl FixSource for ReplayFixSource {
    fn get_fix(&mut self) -> Fix {
        if self.fixes.is_empty() {
            return Fix::UNAVAILABLE;
        }
        let index = self.next.min(self.fixes.len() - 1);
        self.next = (self.next + 1).min(self.fixes.len());
        self.fixes[index]
    }
}

#[derive(Debug, Deserialize)]
struct TermuxLocation {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: Option<f64>,
    #[serde(default)]
    accuracy: Option<f64>,
}

/// Parse `termux-location` JSON output into a fix and its accuracy
pub fn parse_termux_location(output: &str) -> Result<(Fix, f64)> {
    let location: TermuxLocation = serde_json::from_str(output.trim())
        .map_err(|e| SpeedometerError::SourceUnavailable(format!("bad location output: {e}")))?;
    Ok((
        Fix::new(
            location.latitude,
            location.longitude,
            location.altitude.unwrap_or(0.0),
        ),
        location.accuracy.unwrap_or(0.0),
    ))
}

fn read_termux_location() -> Result<(Fix, f64)> {
    let output = Command::new("termux-location")
        .arg("-p")
        .arg("gps")
        .arg("-r")
        .arg("last")
        .output()
        .map_err(|e| SpeedometerError::SourceUnavailable(format!("termux-location: {e}")))?;
    parse_termux_location(&String::from_utf8_lossy(&output.stdout))
}

/// Poll `termux-location` into `cell` until the cell is the only owner left.
pub async fn termux_location_loop(cell: LastKnownFix, period: Duration) {
    let mut interval = interval(period);
    let mut fixes = 0u64;

    loop {
        interval.tick().await;
        if Arc::strong_count(&cell.inner) == 1 {
            log::debug!("[gps] no readers left after {fixes} fixes");
            break;
        }

        match tokio::task::spawn_blocking(read_termux_location).await {
            Ok(Ok((fix, accuracy))) => {
                cell.update(fix, accuracy);
                fixes += 1;
            }
            Ok(Err(e)) => log::debug!("[gps] {e}"),
            Err(e) => {
                log::warn!("[gps] location reader panicked: {e}");
                break;
            }
        }
    }
}

/// Produce accelerometer samples every `period`, from `termux-sensor` when
/// available and a mock vibration model otherwise.
pub async fn accel_loop(tx: Sender<AccelData>, period: Duration, use_sensor: bool) {
    let mut interval = interval(period);
    let mut sample_count = 0u64;
    let mut sensor_ok = use_sensor;

    loop {
        interval.tick().await;

        let accel = if sensor_ok {
            match tokio::task::spawn_blocking(read_accelerometer).await {
                Ok(Some(data)) => data,
                _ => {
                    log::warn!("[accel] termux-sensor unavailable, falling back to mock data");
                    sensor_ok = false;
                    mock_accel_data()
                }
            }
        } else {
            mock_accel_data()
        };

        match tx.try_send(accel) {
            Ok(_) => {
                sample_count += 1;
                if sample_count % 500 == 0 {
                    log::debug!("[accel] {sample_count} samples");
                }
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("[accel] channel closed after {sample_count} samples");
                break;
            }
            Err(TrySendError::Full(_)) => {
                // consumer is behind, drop this sample
            }
        }
    }
}

fn read_accelerometer() -> Option<AccelData> {
    let output = Command::new("termux-sensor")
        .arg("-s")
        .arg("accelerometer")
        .arg("-n")
        .arg("1")
        .output()
        .ok()?;
    parse_accel_output(&String::from_utf8_lossy(&output.stdout), now_ms())
}

/// `termux-sensor` prints `{"<sensor name>": {"values": [x, y, z]}}`
pub fn parse_accel_output(output: &str, timestamp_ms: i64) -> Option<AccelData> {
    let json: Value = serde_json::from_str(output.trim()).ok()?;
    let values = json
        .as_object()?
        .values()
        .find_map(|sensor| sensor.get("values"))?
        .as_array()?;
    if values.len() < 3 {
        return None;
    }

    let axis = |i: usize| values[i].as_f64().map(|v| v as f32);
    Some(AccelData::new(axis(0)?, axis(1)?, axis(2)?, timestamp_ms))
}

fn mock_accel_data() -> AccelData {
    use std::f64::consts::PI;
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let t = COUNTER.fetch_add(1, Ordering::Relaxed) as f64 * 0.02;

    // road vibration, plus a pull-away surge every ~23 s
    let surge = if t % 23.0 < 1.5 { (t * 2.0 * PI).sin() * 2.5 } else { 0.0 };
    AccelData::new(
        ((t * 2.0 * PI).sin() * 0.05 + surge) as f32,
        ((t * 2.0 * PI).cos() * 0.03) as f32,
        (9.81 + (t * PI).sin() * 0.02) as f32,
        now_ms(),
    )
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

//! Accelerometer-driven "are we accelerating" signal.
//!
//! A crude single-pole jerk detector: every ≥100 ms the change in the summed
//! axes is scaled by elapsed time and compared against a fixed threshold.
//! It is not a fused estimate and doesn't try to be. The result lands in a
//! [`MotionFlag`] shared with the update pipeline; that flag is the only
//! coupling between the two.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::types::AccelData;

/// Minimum spacing between processed samples (ms)
const MIN_SAMPLE_SPACING_MS: i64 = 100;
/// Jerk score above which we call it acceleration
const ACCELERATION_THRESHOLD: f32 = 20.0;
const JERK_SCALE: f32 = 10_000.0;

/// Single boolean shared between the sensor task (writer) and the tick task
/// (reader). Defaults to `false` until a sample says otherwise.
#[derive(Clone, Debug, Default)]
pub struct MotionFlag(Arc<AtomicBool>);

impl MotionFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, accelerating: bool) {
        self.0.store(accelerating, Ordering::Release);
    }
}

/// Motion evidence available to the update pipeline.
#[derive(Clone, Debug, Default)]
pub enum MotionHint {
    /// GPS only: no stop-lock
    #[default]
    None,
    /// Accelerometer-assisted: stop-lock released by the shared flag
    SensorBased(MotionFlag),
}

impl MotionHint {
    /// `None` for the GPS-only variant, otherwise the current flag value
    pub fn current(&self) -> Option<bool> {
        match self {
            MotionHint::None => None,
            MotionHint::SensorBased(flag) => Some(flag.get()),
        }
    }

    pub fn is_gated(&self) -> bool {
        matches!(self, MotionHint::SensorBased(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionGateState {
    pub current_axes: [f32; 3],
    pub previous_axes: [f32; 3],
    /// Time of the last *processed* sample (ms)
    pub last_sample_time: i64,
    pub is_accelerating: bool,
}

/// Copy of the gate state for display
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionSnapshot {
    pub axes: [f32; 3],
    pub is_accelerating: bool,
}

impl fmt::Display for MotionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "x: {:.6} y: {:.6} z: {:.6} acc: {}",
            self.axes[0], self.axes[1], self.axes[2], self.is_accelerating
        )
    }
}

/// Owned by the sensor side. Call [`MotionGate::on_sample`] for every
/// accelerometer event; hand [`MotionGate::hint`] to the pipeline.
#[derive(Debug, Default)]
pub struct MotionGate {
    state: MotionGateState,
    flag: MotionFlag,
    last_seen_ms: Option<i64>,
}

impl MotionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(&self) -> MotionFlag {
        self.flag.clone()
    }

    pub fn hint(&self) -> MotionHint {
        MotionHint::SensorBased(self.flag.clone())
    }

    /// Feed one accelerometer sample taken at `now_ms`.
    ///
    /// Returns true if the sample was far enough from the previous processed
    /// one to re-evaluate the flag.
    pub fn on_sample(&mut self, axes: [f32; 3], now_ms: i64) -> bool {
        self.state.current_axes = axes;
        self.last_seen_ms = Some(now_ms);

        let elapsed_ms = now_ms - self.state.last_sample_time;
        if elapsed_ms < MIN_SAMPLE_SPACING_MS {
            return false;
        }
        self.state.last_sample_time = now_ms;

        let current: f32 = self.state.current_axes.iter().sum();
        let previous: f32 = self.state.previous_axes.iter().sum();
        let jerk = (current - previous).abs() / elapsed_ms as f32 * JERK_SCALE;

        let accelerating = jerk > ACCELERATION_THRESHOLD;
        if accelerating != self.state.is_accelerating {
            log::debug!("motion gate: accelerating={accelerating} (jerk {jerk:.1})");
        }
        self.state.is_accelerating = accelerating;
        self.flag.set(accelerating);
        self.state.previous_axes = self.state.current_axes;
        true
    }

    pub fn on_accel(&mut self, sample: &AccelData) -> bool {
        self.on_sample(sample.axes(), sample.timestamp_ms)
    }

    pub fn is_accelerating(&self) -> bool {
        self.state.is_accelerating
    }

    pub fn state(&self) -> &MotionGateState {
        &self.state
    }

    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            axes: self.state.current_axes,
            is_accelerating: self.state.is_accelerating,
        }
    }

    /// No sample at all, or none within `threshold_ms` of `now_ms`.
    pub fn is_silent(&self, now_ms: i64, threshold_ms: i64) -> bool {
        self.last_seen_ms
            .map(|seen| now_ms - seen > threshold_ms)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_not_accelerating() {
        let gate = MotionGate::new();
        assert!(!gate.is_accelerating());
        assert!(!gate.flag().get());
        assert_eq!(gate.hint().current(), Some(false));
        assert_eq!(MotionHint::None.current(), None);
    }

    #[test]
    fn test_jerk_over_threshold_sets_flag() {
        let mut gate = MotionGate::new();
        let flag = gate.flag();

        assert!(gate.on_sample([0.0, 0.0, 9.81], 1_000));
        // 9.81 over 1000 ms -> ~98, well above 20
        assert!(flag.get());

        // steady reading 200 ms later: no change in the sum
        assert!(gate.on_sample([0.0, 0.0, 9.81], 1_200));
        assert!(!flag.get());

        // +0.5 over 200 ms -> 25
        assert!(gate.on_sample([0.5, 0.0, 9.81], 1_400));
        assert!(flag.get());
    }

    #[test]
    fn test_small_change_stays_below_threshold() {
        let mut gate = MotionGate::new();
        gate.on_sample([0.1, 0.2, 9.8], 1_000);
        // 0.3 over 200 ms -> 15
        gate.on_sample([0.4, 0.2, 9.8], 1_200);
        assert!(!gate.is_accelerating());
    }

    #[test]
    fn test_samples_closer_than_100ms_are_not_processed() {
        let mut gate = MotionGate::new();
        gate.on_sample([0.0, 0.0, 9.81], 1_000);
        gate.on_sample([0.0, 0.0, 9.81], 1_200);
        assert!(!gate.is_accelerating());

        assert!(!gate.on_sample([5.0, 5.0, 9.81], 1_250));
        assert!(!gate.is_accelerating());
        assert_eq!(gate.state().last_sample_time, 1_200);
        // the latest axes are still visible for display
        assert_eq!(gate.snapshot().axes, [5.0, 5.0, 9.81]);

        // exactly 100 ms later it's evaluated against the last processed axes
        assert!(gate.on_sample([5.0, 5.0, 9.81], 1_300));
        assert!(gate.is_accelerating());
    }

    #[test]
    fn test_flag_is_shared_across_clones() {
        let gate = MotionGate::new();
        let hint = gate.hint();
        gate.flag().set(true);
        assert_eq!(hint.current(), Some(true));
    }

    #[test]
    fn test_silence_detection() {
        let mut gate = MotionGate::new();
        assert!(gate.is_silent(10_000, 5_000));
        gate.on_sample([0.0, 0.0, 9.81], 10_000);
        assert!(!gate.is_silent(14_000, 5_000));
        assert!(gate.is_silent(15_001, 5_000));
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = MotionSnapshot {
            axes: [0.5, -1.0, 9.75],
            is_accelerating: true,
        };
        assert_eq!(
            snapshot.to_string(),
            "x: 0.500000 y: -1.000000 z: 9.750000 acc: true"
        );
    }
}

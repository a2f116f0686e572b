//! Update pipeline: one raw fix in, smoothed speed / distance / moving time /
//! altitude out.
//!
//! Each tick compares the incoming fix against the last accepted baseline:
//!
//! - moved: solve the segment length, fold it into the 2-sample speed window,
//!   and credit it to the totals if it is longer than 0.4 m and no stop-lock
//!   is held. The baseline always advances and the altitude goes into the
//!   4-sample altitude window.
//! - unchanged: count the tick. Four in a row force the speed to zero and,
//!   when motion gating is active, arm the stop-lock. The lock is released
//!   only by the accelerometer reporting acceleration on a later move.
//!
//! The pipeline is not reentrant; the owner runs ticks strictly one after
//! another.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, SpeedometerError};
use crate::geodesic::DistanceSolver;
use crate::smoothing::WindowAverager;
use crate::types::{Fix, UnitSystem};

/// Segments at or below this length are GPS jitter (m)
pub const SEGMENT_THRESHOLD_M: f64 = 0.4;
/// Consecutive unchanged fixes that mean a full stop
pub const STATIONARY_TICKS_TO_STOP: u32 = 4;
/// Averaged speeds under 1 km/h are shown as zero (m/s)
pub const MIN_DISPLAY_SPEED_MS: f64 = 1.0 / 3.6;

const SPEED_WINDOW: usize = 2;
const ALTITUDE_WINDOW: usize = 4;

const MS_TO_KMH: f64 = 3.6;
const MS_TO_MPH: f64 = 2.2369362912;
/// Imperial distance readout is in thousands of feet
const M_TO_KFT: f64 = 0.0032808399;
const M_TO_FT: f64 = 3.2808399;

pub const DEFAULT_UPDATE_PERIOD: Duration = Duration::from_millis(1000);

/// What counts as "the fix moved".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementRule {
    /// Latitude and longitude must both differ from the baseline
    #[default]
    BothAxes,
    /// Either coordinate differing is enough
    EitherAxis,
}

impl MovementRule {
    pub fn has_moved(self, baseline: (f64, f64), fix: &Fix) -> bool {
        let lat_changed = fix.latitude != baseline.0;
        let lon_changed = fix.longitude != baseline.1;
        match self {
            MovementRule::BothAxes => lat_changed && lon_changed,
            MovementRule::EitherAxis => lat_changed || lon_changed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PipelineConfig {
    /// Scheduler period. Fixed for a run: it is the speed divisor.
    pub update_period: Duration,
    pub solver: DistanceSolver,
    pub movement_rule: MovementRule,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            update_period: DEFAULT_UPDATE_PERIOD,
            solver: DistanceSolver::Vincenty,
            movement_rule: MovementRule::BothAxes,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.update_period.is_zero() {
            return Err(SpeedometerError::InvalidConfig(
                "update period must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Mutable state of the pipeline. Only [`LocationCalculator::tick`] writes it.
#[derive(Clone, Debug)]
pub struct PipelineState {
    /// Horizontal position of the last accepted fix, `None` before the first
    pub baseline: Option<(f64, f64)>,
    pub altitude_window: WindowAverager,
    pub avg_altitude: f64,
    pub prev_avg_altitude: f64,
    pub speed_window: WindowAverager,
    /// m/s, never negative
    pub avg_speed: f64,
    pub stationary_tick_count: u32,
    pub last_segment_distance: f64,
    /// m, never decreases
    pub distance_accumulated: f64,
    /// Credited one period per accepted segment
    pub moving_time: Duration,
    pub stop_lock: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            baseline: None,
            altitude_window: WindowAverager::new(ALTITUDE_WINDOW),
            avg_altitude: 0.0,
            prev_avg_altitude: 0.0,
            speed_window: WindowAverager::new(SPEED_WINDOW),
            avg_speed: 0.0,
            stationary_tick_count: 0,
            last_segment_distance: 0.0,
            distance_accumulated: 0.0,
            moving_time: Duration::ZERO,
            stop_lock: false,
        }
    }
}

/// What a single tick did. Mostly useful for logging and replay stats.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    /// Source had nothing; state untouched
    NoFix,
    /// First usable fix became the baseline
    Baseline,
    /// Segment credited to distance and moving time
    Accepted { segment_m: f64 },
    /// Segment too short to be real movement
    Rejected { segment_m: f64 },
    /// Segment held back by the stop-lock
    Locked { segment_m: f64 },
    /// Solver didn't converge; nothing accumulated this tick
    SolverFailed,
    /// Fix unchanged, `count` ticks in a row so far
    Stationary { count: u32 },
    /// Fourth unchanged fix: speed forced to zero
    Stopped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TickCounters {
    pub ticks: u64,
    pub accepted_segments: u64,
    pub solver_failures: u64,
}

/// Everything a display needs, in display units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Readings {
    pub unit_system: UnitSystem,
    pub speed: f64,
    pub distance: f64,
    pub altitude: f64,
    pub moving_time_seconds: i64,
    pub stop_lock: bool,
    pub last_fix: Option<Fix>,
}

/// Turns a stream of raw fixes into speedometer readings.
#[derive(Clone, Debug)]
pub struct LocationCalculator {
    config: PipelineConfig,
    state: PipelineState,
    last_fix: Option<Fix>,
    counters: TickCounters,
}

impl Default for LocationCalculator {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            state: PipelineState::default(),
            last_fix: None,
            counters: TickCounters::default(),
        }
    }
}

impl LocationCalculator {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    /// Process one fix.
    ///
    /// `motion` is `None` for the GPS-only variant, or the accelerometer's
    /// current "accelerating" flag for the gated one.
    pub fn tick(&mut self, fix: Fix, motion: Option<bool>) -> TickOutcome {
        self.counters.ticks += 1;

        if fix.is_unavailable() {
            return TickOutcome::NoFix;
        }
        self.last_fix = Some(fix);

        let Some(baseline) = self.state.baseline else {
            log::info!("baseline fix ({:.6}, {:.6})", fix.latitude, fix.longitude);
            self.state.baseline = Some((fix.latitude, fix.longitude));
            return TickOutcome::Baseline;
        };

        if !self.config.movement_rule.has_moved(baseline, &fix) {
            return self.stationary_tick(motion.is_some());
        }
        self.state.stationary_tick_count = 0;

        let segment = self.config.solver.segment_distance(
            baseline.0,
            baseline.1,
            fix.latitude,
            fix.longitude,
            (self.state.prev_avg_altitude, self.state.avg_altitude),
        );
        self.state.last_segment_distance = segment;

        let outcome = if segment.is_nan() {
            log::warn!(
                "distance solver did not converge ({:.6}, {:.6}) -> ({:.6}, {:.6}), skipping segment",
                baseline.0,
                baseline.1,
                fix.latitude,
                fix.longitude
            );
            self.counters.solver_failures += 1;
            TickOutcome::SolverFailed
        } else {
            self.update_speed(segment);

            if self.state.stop_lock && motion == Some(true) {
                log::info!("stop-lock released by accelerometer");
                self.state.stop_lock = false;
            }

            if self.state.stop_lock {
                TickOutcome::Locked { segment_m: segment }
            } else if segment > SEGMENT_THRESHOLD_M {
                self.state.distance_accumulated += segment;
                self.state.moving_time += self.config.update_period;
                self.counters.accepted_segments += 1;
                log::debug!(
                    "segment {:.2} m accepted, total {:.2} m",
                    segment,
                    self.state.distance_accumulated
                );
                TickOutcome::Accepted { segment_m: segment }
            } else {
                TickOutcome::Rejected { segment_m: segment }
            }
        };

        self.state.baseline = Some((fix.latitude, fix.longitude));
        self.update_altitude(fix.altitude);
        outcome
    }

    fn stationary_tick(&mut self, gated: bool) -> TickOutcome {
        self.state.stationary_tick_count += 1;
        if self.state.stationary_tick_count < STATIONARY_TICKS_TO_STOP {
            return TickOutcome::Stationary {
                count: self.state.stationary_tick_count,
            };
        }

        self.state.avg_speed = 0.0;
        self.state.stationary_tick_count = 0;
        if gated && !self.state.stop_lock {
            log::info!("full stop, stop-lock armed");
            self.state.stop_lock = true;
        }
        TickOutcome::Stopped
    }

    fn update_speed(&mut self, segment: f64) {
        let sample = segment / self.config.update_period.as_secs_f64();
        if let Some(avg) = self.state.speed_window.push(sample) {
            self.state.avg_speed = avg;
        }
        if self.state.avg_speed < MIN_DISPLAY_SPEED_MS {
            self.state.avg_speed = 0.0;
        }
    }

    fn update_altitude(&mut self, altitude: f64) {
        if let Some(avg) = self.state.altitude_window.push(altitude) {
            self.state.prev_avg_altitude = self.state.avg_altitude;
            self.state.avg_altitude = avg;
        }
    }

    /// km/h for metric, mph for imperial
    pub fn speed(&self, unit_system: UnitSystem) -> f64 {
        match unit_system {
            UnitSystem::Metric => self.state.avg_speed * MS_TO_KMH,
            UnitSystem::Imperial => self.state.avg_speed * MS_TO_MPH,
        }
    }

    /// Meters for metric, thousands of feet for imperial
    pub fn distance_total(&self, unit_system: UnitSystem) -> f64 {
        match unit_system {
            UnitSystem::Metric => self.state.distance_accumulated,
            UnitSystem::Imperial => self.state.distance_accumulated * M_TO_KFT,
        }
    }

    /// Whole seconds spent moving
    pub fn moving_time(&self) -> i64 {
        self.state.moving_time.as_secs() as i64
    }

    /// Last completed altitude average, meters or feet
    pub fn altitude(&self, unit_system: UnitSystem) -> f64 {
        match unit_system {
            UnitSystem::Metric => self.state.avg_altitude,
            UnitSystem::Imperial => self.state.avg_altitude * M_TO_FT,
        }
    }

    pub fn is_stop_locked(&self) -> bool {
        self.state.stop_lock
    }

    pub fn last_fix(&self) -> Option<Fix> {
        self.last_fix
    }

    pub fn counters(&self) -> TickCounters {
        self.counters
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn readings(&self, unit_system: UnitSystem) -> Readings {
        Readings {
            unit_system,
            speed: self.speed(unit_system),
            distance: self.distance_total(unit_system),
            altitude: self.altitude(unit_system),
            moving_time_seconds: self.moving_time(),
            stop_lock: self.state.stop_lock,
            last_fix: self.last_fix,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    const GATED_IDLE: Option<bool> = Some(false);

    fn either_axis() -> LocationCalculator {
        LocationCalculator::new(PipelineConfig {
            movement_rule: MovementRule::EitherAxis,
            ..PipelineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_accessors_before_first_tick() {
        let calc = LocationCalculator::default();
        assert_eq!(calc.speed(UnitSystem::Metric), 0.0);
        assert_eq!(calc.speed(UnitSystem::Imperial), 0.0);
        assert_eq!(calc.distance_total(UnitSystem::Metric), 0.0);
        assert_eq!(calc.altitude(UnitSystem::Metric), 0.0);
        assert_eq!(calc.moving_time(), 0);
        assert!(calc.last_fix().is_none());
    }

    #[test]
    fn test_zero_period_rejected() {
        let result = LocationCalculator::new(PipelineConfig {
            update_period: Duration::ZERO,
            ..PipelineConfig::default()
        });
        assert!(matches!(result, Err(SpeedometerError::InvalidConfig(_))));
    }

    #[test]
    fn test_no_fix_is_absorbed() {
        let mut calc = LocationCalculator::default();
        assert_eq!(calc.tick(Fix::UNAVAILABLE, None), TickOutcome::NoFix);
        assert!(calc.state().baseline.is_none());

        assert_eq!(calc.tick(Fix::new(52.0, 21.0, 100.0), None), TickOutcome::Baseline);
        // losing the fix later doesn't produce a jump to (0, 0)
        assert_eq!(calc.tick(Fix::UNAVAILABLE, None), TickOutcome::NoFix);
        assert_eq!(calc.state().baseline, Some((52.0, 21.0)));
        assert_eq!(calc.distance_total(UnitSystem::Metric), 0.0);
        assert_eq!(calc.counters().ticks, 3);
    }

    #[test]
    fn test_end_to_end_first_move() {
        for motion in [None, GATED_IDLE] {
            let mut calc = either_axis();
            let start = Fix::new(52.0, 21.0, 100.0);

            assert_eq!(calc.tick(start, motion), TickOutcome::Baseline);
            for count in 1..=3 {
                assert_eq!(calc.tick(start, motion), TickOutcome::Stationary { count });
            }
            assert_eq!(calc.state().avg_speed, 0.0);
            assert_eq!(calc.state().distance_accumulated, 0.0);
            assert!(!calc.is_stop_locked());

            let outcome = calc.tick(Fix::new(52.0010, 21.0, 100.0), motion);
            match outcome {
                TickOutcome::Accepted { segment_m } => {
                    assert_abs_diff_eq!(segment_m, 111.3, epsilon = 0.1)
                }
                other => panic!("expected accepted segment, got {other:?}"),
            }
            assert_abs_diff_eq!(calc.distance_total(UnitSystem::Metric), 111.3, epsilon = 0.1);
            assert_eq!(calc.moving_time(), 1);
            assert_eq!(calc.state().stationary_tick_count, 0);
        }
    }

    #[test]
    fn test_both_axes_rule_treats_meridian_move_as_stationary() {
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(52.0, 21.0, 100.0), None);
        assert_eq!(
            calc.tick(Fix::new(52.001, 21.0, 100.0), None),
            TickOutcome::Stationary { count: 1 }
        );
        assert!(matches!(
            calc.tick(Fix::new(52.001, 21.000001, 100.0), None),
            TickOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn test_jitter_never_accumulates() {
        let mut calc = LocationCalculator::default();
        // ~0.08 m per tick, moving in both axes
        for i in 0..=100 {
            let step = i as f64 * 6e-7;
            let outcome = calc.tick(Fix::new(52.0 + step, 21.0 + step, 100.0), None);
            if i > 0 {
                assert!(matches!(outcome, TickOutcome::Rejected { .. }), "{outcome:?}");
            }
        }
        assert_eq!(calc.state().distance_accumulated, 0.0);
        assert_eq!(calc.moving_time(), 0);
        assert_eq!(calc.state().avg_speed, 0.0);
    }

    #[test]
    fn test_four_unchanged_ticks_stop_and_lock() {
        let mut calc = LocationCalculator::default();
        let mut lat = 52.0;
        let mut lon = 21.0;
        calc.tick(Fix::new(lat, lon, 100.0), GATED_IDLE);

        // ~13 m per tick -> 13 m/s once the speed window fills
        for _ in 0..4 {
            lat += 0.0001;
            lon += 0.0001;
            calc.tick(Fix::new(lat, lon, 100.0), GATED_IDLE);
        }
        assert!(calc.state().avg_speed > 10.0);

        let parked = Fix::new(lat, lon, 100.0);
        for count in 1..=3 {
            assert_eq!(calc.tick(parked, GATED_IDLE), TickOutcome::Stationary { count });
            assert!(calc.state().avg_speed > 10.0);
        }
        assert_eq!(calc.tick(parked, GATED_IDLE), TickOutcome::Stopped);
        assert_eq!(calc.state().avg_speed, 0.0);
        assert_eq!(calc.state().stationary_tick_count, 0);
        assert!(calc.is_stop_locked());
    }

    #[test]
    fn test_gps_only_variant_never_locks() {
        let mut calc = LocationCalculator::default();
        let fix = Fix::new(52.0, 21.0, 100.0);
        calc.tick(fix, None);
        for _ in 0..8 {
            calc.tick(fix, None);
        }
        assert!(!calc.is_stop_locked());

        assert!(matches!(
            calc.tick(Fix::new(52.0001, 21.0001, 100.0), None),
            TickOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn test_stop_lock_holds_until_acceleration() {
        let mut calc = LocationCalculator::default();
        let fix = Fix::new(52.0, 21.0, 100.0);
        calc.tick(fix, GATED_IDLE);
        for _ in 0..4 {
            calc.tick(fix, GATED_IDLE);
        }
        assert!(calc.is_stop_locked());

        // drift without accelerometer evidence is held back
        let drift = Fix::new(52.0001, 21.0001, 100.0);
        assert!(matches!(calc.tick(drift, GATED_IDLE), TickOutcome::Locked { .. }));
        assert_eq!(calc.distance_total(UnitSystem::Metric), 0.0);
        assert_eq!(calc.moving_time(), 0);
        // the baseline still follows the fix
        assert_eq!(calc.state().baseline, Some((52.0001, 21.0001)));

        let moving = Fix::new(52.0002, 21.0002, 100.0);
        match calc.tick(moving, Some(true)) {
            TickOutcome::Accepted { segment_m } => {
                assert_relative_eq!(calc.distance_total(UnitSystem::Metric), segment_m)
            }
            other => panic!("expected accepted segment, got {other:?}"),
        }
        assert!(!calc.is_stop_locked());
        assert_eq!(calc.moving_time(), 1);
    }

    #[test]
    fn test_speed_window_and_floor() {
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(52.0, 21.0, 0.0), None);

        // first sample only fills the window
        calc.tick(Fix::new(52.0001, 21.0001, 0.0), None);
        assert_eq!(calc.state().avg_speed, 0.0);
        let first = calc.state().last_segment_distance;

        calc.tick(Fix::new(52.0002, 21.0002, 0.0), None);
        let second = calc.state().last_segment_distance;
        assert_relative_eq!(calc.state().avg_speed, (first + second) / 2.0, max_relative = 1e-12);
        assert_eq!(calc.state().speed_window.len(), 0);

        // two slow hops average below 1 km/h and are floored to zero
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(52.0, 21.0, 0.0), None);
        calc.tick(Fix::new(52.000001, 21.000001, 0.0), None);
        calc.tick(Fix::new(52.000002, 21.000002, 0.0), None);
        assert_eq!(calc.state().avg_speed, 0.0);
    }

    #[test]
    fn test_speed_divisor_uses_period() {
        let mut calc = LocationCalculator::new(PipelineConfig {
            update_period: Duration::from_millis(2000),
            ..PipelineConfig::default()
        })
        .unwrap();
        calc.tick(Fix::new(52.0, 21.0, 0.0), None);
        calc.tick(Fix::new(52.0001, 21.0001, 0.0), None);
        let first = calc.state().last_segment_distance;
        calc.tick(Fix::new(52.0002, 21.0002, 0.0), None);
        let second = calc.state().last_segment_distance;

        assert_relative_eq!(calc.state().avg_speed, (first + second) / 4.0, max_relative = 1e-12);
        assert_eq!(calc.moving_time(), 4);
    }

    #[test]
    fn test_altitude_window() {
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(52.0, 21.0, 500.0), None);

        let altitudes = [100.0, 102.0, 98.0, 104.0, 200.0, 200.0, 200.0, 200.0];
        for (i, altitude) in altitudes.iter().enumerate() {
            let step = (i + 1) as f64 * 0.0001;
            calc.tick(Fix::new(52.0 + step, 21.0 + step, *altitude), None);
            if i == 2 {
                assert_eq!(calc.altitude(UnitSystem::Metric), 0.0);
            }
        }
        assert_eq!(calc.state().prev_avg_altitude, 101.0);
        assert_eq!(calc.altitude(UnitSystem::Metric), 200.0);
        assert_abs_diff_eq!(calc.altitude(UnitSystem::Imperial), 656.16798, epsilon = 1e-6);
    }

    #[test]
    fn test_solver_failure_leaves_totals_alone() {
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(0.0, -90.0, 0.0), None);
        calc.tick(Fix::new(0.0001, -89.9999, 0.0), None);
        calc.tick(Fix::new(0.0, -90.0, 0.0), None);
        let before = calc.distance_total(UnitSystem::Metric);
        let moving_before = calc.moving_time();
        assert!(before > 0.0);

        // nearly antipodal hop: Vincenty gives up
        let outcome = calc.tick(Fix::new(0.5, 89.5, 0.0), None);
        assert_eq!(outcome, TickOutcome::SolverFailed);
        assert!(calc.state().last_segment_distance.is_nan());
        assert_eq!(calc.counters().solver_failures, 1);

        assert_eq!(calc.distance_total(UnitSystem::Metric), before);
        assert_eq!(calc.moving_time(), moving_before);
        assert!(calc.state().avg_speed.is_finite());
        assert!(calc.state().avg_speed >= 0.0);

        // the next ordinary hop is measured from the new baseline
        assert!(matches!(
            calc.tick(Fix::new(0.5001, 89.5001, 0.0), None),
            TickOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn test_haversine_solver_selectable() {
        let mut calc = LocationCalculator::new(PipelineConfig {
            solver: DistanceSolver::Haversine,
            ..PipelineConfig::default()
        })
        .unwrap();
        calc.tick(Fix::new(52.0, 21.0, 0.0), None);
        calc.tick(Fix::new(52.001, 21.001, 0.0), None);
        let expected = crate::geodesic::haversine_distance(52.0, 21.0, 52.001, 21.001);
        assert_relative_eq!(calc.distance_total(UnitSystem::Metric), expected);
    }

    #[test]
    fn test_unit_conversions_agree() {
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(52.0, 21.0, 0.0), None);
        calc.tick(Fix::new(52.0001, 21.0001, 0.0), None);
        calc.tick(Fix::new(52.0002, 21.0002, 0.0), None);
        assert!(calc.state().avg_speed > 0.0);

        let kmh = calc.speed(UnitSystem::Metric);
        let mph = calc.speed(UnitSystem::Imperial);
        assert_relative_eq!(kmh / 3.6, mph / 2.2369362912, max_relative = 1e-12);
        assert_relative_eq!(kmh / 3.6, calc.state().avg_speed, max_relative = 1e-12);

        let meters = calc.distance_total(UnitSystem::Metric);
        assert_relative_eq!(calc.distance_total(UnitSystem::Imperial), meters * 0.0032808399);
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let mut calc = LocationCalculator::default();
        calc.tick(Fix::new(52.0, 21.0, 0.0), Some(false));
        calc.tick(Fix::new(52.0001, 21.0001, 0.0), Some(false));
        calc.tick(Fix::new(52.0002, 21.0002, 0.0), Some(false));

        for unit in [UnitSystem::Metric, UnitSystem::Imperial] {
            assert_eq!(calc.readings(unit), calc.readings(unit));
            assert_eq!(calc.speed(unit), calc.speed(unit));
            assert_eq!(calc.distance_total(unit), calc.distance_total(unit));
        }
        assert_eq!(calc.moving_time(), calc.moving_time());
    }

    #[test]
    fn test_totals_are_monotonic() {
        let mut calc = LocationCalculator::default();
        let mut last_distance = 0.0;
        let mut last_time = 0;
        let path = [
            (52.0, 21.0),
            (52.0001, 21.0001),
            (52.0001, 21.0001),
            (52.00010001, 21.00010001),
            (52.0003, 21.0002),
            (52.0002, 21.0001),
            (52.0002, 21.0001),
            (52.0002, 21.0001),
            (52.0002, 21.0001),
            (52.0001, 21.0),
        ];
        for (lat, lon) in path {
            calc.tick(Fix::new(lat, lon, 120.0), Some(false));
            let distance = calc.distance_total(UnitSystem::Metric);
            assert!(distance >= last_distance);
            assert!(calc.moving_time() >= last_time);
            assert!(calc.state().avg_speed >= 0.0);
            last_distance = distance;
            last_time = calc.moving_time();
        }
    }
}

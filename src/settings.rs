//! Runtime settings.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `SPEEDOMETER_*` environment variables. The CLI applies its
//! flags on top of the result.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SpeedometerError};
use crate::geodesic::DistanceSolver;
use crate::pipeline::{MovementRule, PipelineConfig};
use crate::types::UnitSystem;

const ENV_PREFIX: &str = "SPEEDOMETER";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Built-in synthetic drive
    #[default]
    Mock,
    /// termux-location / termux-sensor on Android
    Termux,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub update_period_ms: u64,
    pub unit_system: UnitSystem,
    pub solver: DistanceSolver,
    pub movement_rule: MovementRule,
    /// Use the accelerometer to hold distance after a full stop
    pub motion_gate: bool,
    pub source: SourceKind,
    pub accel_interval_ms: u64,
    /// Warn when the accelerometer has been quiet this long
    pub sensor_silence_secs: u64,
    /// Write a live status JSON here on every refresh
    pub status_path: Option<PathBuf>,
    /// 0 = run until interrupted
    pub duration_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            update_period_ms: 1000,
            unit_system: UnitSystem::Metric,
            solver: DistanceSolver::Vincenty,
            movement_rule: MovementRule::BothAxes,
            motion_gate: true,
            source: SourceKind::Mock,
            accel_interval_ms: 20,
            sensor_silence_secs: 5,
            status_path: None,
            duration_secs: 0,
        }
    }
}

impl Settings {
    /// Defaults, then `path` (if any), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.update_period_ms == 0 {
            return Err(SpeedometerError::InvalidConfig(
                "update_period_ms must be greater than zero".to_string(),
            ));
        }
        if self.motion_gate && self.accel_interval_ms == 0 {
            return Err(SpeedometerError::InvalidConfig(
                "accel_interval_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn update_period(&self) -> Duration {
        Duration::from_millis(self.update_period_ms)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            update_period: self.update_period(),
            solver: self.solver,
            movement_rule: self.movement_rule,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnitOnly {
    #[serde(default)]
    unit_system: UnitSystem,
}

/// Re-read just the unit system from a settings file.
pub fn read_unit_system(path: &Path) -> Result<UnitSystem> {
    let unit: UnitOnly = Config::builder()
        .add_source(File::from(path).required(true))
        .build()?
        .try_deserialize()?;
    Ok(unit.unit_system)
}

/// Unit system shared between whoever changes it and the render loop.
#[derive(Clone, Debug, Default)]
pub struct UnitPreference(Arc<AtomicU8>);

impl UnitPreference {
    pub fn new(unit_system: UnitSystem) -> Self {
        let pref = Self::default();
        pref.set(unit_system);
        pref
    }

    pub fn get(&self) -> UnitSystem {
        match self.0.load(Ordering::Relaxed) {
            1 => UnitSystem::Imperial,
            _ => UnitSystem::Metric,
        }
    }

    /// Returns true when the value actually changed
    pub fn set(&self, unit_system: UnitSystem) -> bool {
        let raw = match unit_system {
            UnitSystem::Metric => 0,
            UnitSystem::Imperial => 1,
        };
        self.0.swap(raw, Ordering::Relaxed) != raw
    }
}

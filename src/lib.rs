//! GPS speedometer core.
//!
//! Turns raw positional fixes polled at a fixed rate into smoothed speed,
//! accumulated distance, moving time and smoothed altitude. An optional
//! accelerometer-driven motion gate keeps jitter from re-starting the
//! distance counter after a full stop.

pub mod error;
pub mod geodesic;
pub mod live_status;
pub mod motion_gate;
pub mod pipeline;
pub mod replay;
pub mod runtime;
pub mod settings;
pub mod smoothing;
pub mod sources;
pub mod types;

pub use error::{Result, SpeedometerError};
pub use geodesic::{haversine_distance, try_vincenty_distance, vincenty_distance, DistanceSolver};
pub use motion_gate::{MotionFlag, MotionGate, MotionHint};
pub use pipeline::{LocationCalculator, MovementRule, PipelineConfig, PipelineState, TickOutcome};
pub use types::{AccelData, Fix, UnitSystem};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SpeedometerError;

/// One reported location sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Degrees, WGS-84
    pub latitude: f64,
    /// Degrees, WGS-84
    pub longitude: f64,
    /// Meters
    #[serde(default)]
    pub altitude: f64,
}

impl Fix {
    /// Neutral value handed out by a source that has no fix to give.
    pub const UNAVAILABLE: Fix = Fix {
        latitude: 0.0,
        longitude: 0.0,
        altitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// A fix at exactly (0, 0) can't be told apart from "no fix".
    pub fn is_unavailable(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl Default for Fix {
    fn default() -> Self {
        Self::UNAVAILABLE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AccelData {
    pub timestamp_ms: i64,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl AccelData {
    pub fn new(x: f32, y: f32, z: f32, timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            x,
            y,
            z,
        }
    }

    pub fn axes(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Display unit system picked by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn speed_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "km/h",
            UnitSystem::Imperial => "mph",
        }
    }

    pub fn distance_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "kft",
        }
    }

    pub fn altitude_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "m",
            UnitSystem::Imperial => "ft",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Metric => write!(f, "metric"),
            UnitSystem::Imperial => write!(f, "imperial"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = SpeedometerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "0"/"1" are the values the old preferences screen stored
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "0" => Ok(UnitSystem::Metric),
            "imperial" | "1" => Ok(UnitSystem::Imperial),
            other => Err(SpeedometerError::InvalidConfig(format!(
                "unknown unit system '{other}'"
            ))),
        }
    }
}

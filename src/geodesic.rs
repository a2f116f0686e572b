//! Distance between two coordinates.
//!
//! The default solver is Vincenty's inverse formula on the WGS-84 ellipsoid:
//! the auxiliary longitude λ on the auxiliary sphere is iterated until it
//! moves by no more than 1e-12 rad, for at most 100 rounds. Nearly antipodal
//! pairs can keep λ from settling; that case yields NaN from
//! [`vincenty_distance`] and an error from [`try_vincenty_distance`].
//!
//! A spherical haversine (R = 6371 km) is kept as a lower precision
//! alternative, optionally stretched by the climb between two altitude
//! averages when they differ by more than 10 m:
//!
//! ```text
//! d = sqrt(Δh² + d_planar²)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeedometerError};

/// WGS-84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 semi-minor axis (m)
pub const WGS84_B: f64 = 6_356_752.314245;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257223563;

/// Mean earth radius used by the haversine solver (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const MAX_ITERATIONS: u32 = 100;
const CONVERGENCE_RAD: f64 = 1e-12;

/// Altitude averages closer than this are treated as flat ground
const ALTITUDE_CORRECTION_MIN_M: f64 = 10.0;

/// Which formula turns two fixes into a segment length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceSolver {
    /// Ellipsoidal, iterative. NaN when the iteration doesn't converge.
    #[default]
    Vincenty,
    /// Spherical with the optional altitude stretch.
    Haversine,
}

impl DistanceSolver {
    /// Segment length in meters.
    ///
    /// `altitudes` is `(previous_average, current_average)` and is only
    /// consulted by the haversine solver.
    pub fn segment_distance(
        self,
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
        altitudes: (f64, f64),
    ) -> f64 {
        match self {
            DistanceSolver::Vincenty => vincenty_distance(lat1, lon1, lat2, lon2),
            DistanceSolver::Haversine => {
                let planar = haversine_distance(lat1, lon1, lat2, lon2);
                altitude_corrected(planar, altitudes.0, altitudes.1)
            }
        }
    }
}

/// Vincenty inverse distance in meters, NaN if the iteration gives up.
pub fn vincenty_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    try_vincenty_distance(lat1, lon1, lat2, lon2).unwrap_or(f64::NAN)
}

/// Vincenty inverse distance in meters.
///
/// Returns [`SpeedometerError::SolverNonConvergence`] when λ hasn't settled
/// after 100 iterations.
pub fn try_vincenty_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64> {
    let (a, b, f) = (WGS84_A, WGS84_B, WGS84_F);

    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - f) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - f) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut iterations = 0;

    let (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m) = loop {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let cross = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        let sin_sigma = ((cos_u2 * sin_lambda).powi(2) + cross * cross).sqrt();
        if sin_sigma == 0.0 {
            // coincident points
            return Ok(0.0);
        }

        let cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        let sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        let mut cos_2sigma_m = cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha;
        if cos_2sigma_m.is_nan() {
            // equatorial line: cos²α = 0
            cos_2sigma_m = 0.0;
        }

        let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
        let lambda_prev = lambda;
        lambda = l
            + (1.0 - c)
                * f
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));
        iterations += 1;

        // NaN compares false here and falls through like a converged value
        if !((lambda - lambda_prev).abs() > CONVERGENCE_RAD) {
            break (sin_sigma, cos_sigma, sigma, cos_sq_alpha, cos_2sigma_m);
        }
        if iterations >= MAX_ITERATIONS {
            return Err(SpeedometerError::SolverNonConvergence {
                lat1,
                lon1,
                lat2,
                lon2,
                iterations,
            });
        }
    };

    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    Ok(b * big_a * (sigma - delta_sigma))
}

/// Great-circle distance on a sphere of radius [`EARTH_RADIUS_M`], meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Stretch a planar distance by the climb between two altitude averages.
///
/// A zero average means "no window completed yet" and disables the stretch.
pub fn altitude_corrected(planar: f64, prev_avg_altitude: f64, avg_altitude: f64) -> f64 {
    let climb = (prev_avg_altitude - avg_altitude).abs();
    if avg_altitude != 0.0 && prev_avg_altitude != 0.0 && climb > ALTITUDE_CORRECTION_MIN_M {
        (climb * climb + planar * planar).sqrt()
    } else {
        planar
    }
}

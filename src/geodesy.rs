/// Along-track distance and pressure/height conversion for station transects
///
/// Distances are great-circle (haversine) distances between consecutive
/// stations, accumulated from the first station. Pressure is converted to
/// height with the TEOS-10 `z_from_p` relation (no dynamic height anomaly).

use std::ops::Deref;

use geo::{point, HaversineDistance};

use crate::error::{Result, SectionError};
use crate::section::Station;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const DB_TO_PA: f64 = 1.0e4;
// Vertical gradient of gravity in the ocean, 1/m
const GAMMA: f64 = 2.26e-7;

/// Great-circle distance in km between two (latitude, longitude) points.
pub fn great_circle_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = point!(x: lon1, y: lat1);
    let b = point!(x: lon2, y: lat2);
    a.haversine_distance(&b) / 1000.0
}

/// Cumulative along-track distance in km, one entry per station.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceAxis(Vec<f64>);

impl DistanceAxis {
    /// Build from `(latitude, longitude)` pairs in station order.
    pub fn from_coordinates(coords: &[(f64, f64)]) -> Result<Self> {
        let (&(mut prev_lat, mut prev_lon), rest) =
            coords.split_first().ok_or(SectionError::EmptySection)?;

        let mut distances = Vec::with_capacity(coords.len());
        distances.push(0.0);
        let mut total = 0.0;
        for &(lat, lon) in rest {
            total += great_circle_km(prev_lat, prev_lon, lat, lon);
            distances.push(total);
            prev_lat = lat;
            prev_lon = lon;
        }

        Ok(DistanceAxis(distances))
    }

    pub fn from_stations(stations: &[Station]) -> Result<Self> {
        let coords: Vec<(f64, f64)> = stations
            .iter()
            .map(|s| (s.latitude, s.longitude))
            .collect();
        Self::from_coordinates(&coords)
    }

    /// Wrap precomputed distances (km). Values must be finite and non-decreasing.
    pub fn from_km(distances: Vec<f64>) -> Result<Self> {
        if distances.is_empty() {
            return Err(SectionError::EmptySection);
        }
        if let Some(i) = distances.iter().position(|d| !d.is_finite()) {
            return Err(SectionError::InvalidParameter(format!(
                "distance {} is not finite",
                i
            )));
        }
        if let Some(i) = distances.windows(2).position(|w| w[1] < w[0]) {
            return Err(SectionError::NonMonotonicAxis {
                axis: "distance".to_string(),
                index: i + 1,
            });
        }
        Ok(DistanceAxis(distances))
    }

    pub fn max(&self) -> f64 {
        self.0.last().copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl Deref for DistanceAxis {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.0
    }
}

/// Mean latitude of a set of stations in decimal degrees.
pub fn mean_latitude(stations: &[Station]) -> Option<f64> {
    if stations.is_empty() {
        return None;
    }
    Some(stations.iter().map(|s| s.latitude).sum::<f64>() / stations.len() as f64)
}

/// Dynamic enthalpy of standard seawater (SA = 35.16504 g/kg, CT = 0 degC)
/// at sea pressure `p` (dbar), J/kg.
fn enthalpy_sso_0(p: f64) -> f64 {
    let z = p * 1.0e-4;
    let dynamic_enthalpy = z
        * (9.726613854843870e-4
            + z * (-2.252956605630465e-5
                + z * (2.376909655387404e-6
                    + z * (-1.664294869986011e-7
                        + z * (-5.988108894465758e-9
                            + z * (-2.1078768810e-9 + 2.8019291329e-10 * z))))));
    dynamic_enthalpy * DB_TO_PA * 1.0e4
}

/// Height (m, negative below the sea surface) from sea pressure `p` (dbar)
/// at latitude `lat` (degrees).
pub fn z_from_p(p: f64, lat: f64) -> f64 {
    let sin2 = (lat * DEG_TO_RAD).sin().powi(2);
    let b = 9.780327 * (1.0 + (5.2792e-3 + 2.32e-5 * sin2) * sin2);
    let a = -0.5 * GAMMA * b;
    let c = enthalpy_sso_0(p);
    -2.0 * c / (b + (b * b - 4.0 * a * c).sqrt())
}

/// Positive depth (m) from sea pressure (dbar).
pub fn depth_from_pressure(p: f64, lat: f64) -> f64 {
    -z_from_p(p, lat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_z_from_p_reference_values() {
        // TEOS-10 check values at 4 degN
        assert_relative_eq!(z_from_p(10.0, 4.0), -9.944_583_446_945_3, epsilon = 1e-9);
        assert_relative_eq!(z_from_p(50.0, 4.0), -49.718_089_701_255, epsilon = 1e-9);
        assert_relative_eq!(z_from_p(125.0, 4.0), -124.272_621_940_998, epsilon = 1e-9);
        assert_relative_eq!(z_from_p(250.0, 4.0), -248.470_057_654_859, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_pressure_is_surface() {
        assert_eq!(depth_from_pressure(0.0, 45.0), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let km = great_circle_km(0.0, 0.0, 1.0, 0.0);
        assert!((km - 111.2).abs() < 0.2, "got {}", km);
    }

    #[test]
    fn test_distance_axis_accumulates() {
        let axis = DistanceAxis::from_coordinates(&[(0.0, 0.0), (0.0, 1.0), (0.0, 2.0)]).unwrap();
        assert_eq!(axis.len(), 3);
        assert_eq!(axis[0], 0.0);
        assert_relative_eq!(axis[2], 2.0 * axis[1], epsilon = 1e-9);
    }

    #[test]
    fn test_single_station_axis_is_zero() {
        let axis = DistanceAxis::from_coordinates(&[(-23.0, -45.0)]).unwrap();
        assert_eq!(axis.as_slice(), &[0.0]);
        assert_eq!(axis.max(), 0.0);
    }

    #[test]
    fn test_empty_axis_fails() {
        assert!(matches!(
            DistanceAxis::from_coordinates(&[]),
            Err(SectionError::EmptySection)
        ));
    }

    #[test]
    fn test_from_km_rejects_decreasing() {
        let err = DistanceAxis::from_km(vec![0.0, 5.0, 3.0]).unwrap_err();
        assert!(matches!(err, SectionError::NonMonotonicAxis { index: 2, .. }));
    }
}

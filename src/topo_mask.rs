/// Seafloor trace for a station section
///
/// The deepest sample of each cast is taken as the local bottom. Bottom
/// depths are interpolated over along-track distance and resampled on a
/// uniform grid. Past the outermost stations the trace stays flat: nothing
/// is known about the seafloor there, so no slope is invented.
///
/// Usage:
/// ```rust,ignore
/// let h = get_maxdepth(&section, "t090C")?;
/// let mask = gen_topomask(&h, section.stations(), 1.0, InterpolationKind::Linear)?;
/// ```

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::TopoMaskConfig;
use crate::error::{Result, SectionError};
use crate::geodesy::{depth_from_pressure, mean_latitude, DistanceAxis};
use crate::interpolation::{FillExtrapolant, Interp1d, Interpolant, InterpolationKind};
use crate::max_depth::MaxDepths;
use crate::section::{Station, VerticalCoordinate};

/// Resampled seafloor: `depth[i]` (m) at `distance[i]` (km).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopoMask {
    pub distance: Vec<f64>,
    pub depth: Vec<f64>,
}

impl TopoMask {
    pub fn len(&self) -> usize {
        self.distance.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distance.is_empty()
    }

    pub fn max_depth(&self) -> Option<f64> {
        self.depth.iter().copied().reduce(f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.distance.iter().copied().zip(self.depth.iter().copied())
    }
}

/// Continuous seafloor profile fitted through the station bottoms.
#[derive(Debug, Clone)]
pub struct Seafloor {
    profile: FillExtrapolant<Interp1d>,
    station_distance: DistanceAxis,
    station_depth: Vec<Option<f64>>,
}

impl Seafloor {
    /// Bottom depth (m) at `distance` (km) along the track.
    pub fn depth_at(&self, distance: f64) -> f64 {
        self.profile.eval(distance)
    }

    pub fn station_distance(&self) -> &DistanceAxis {
        &self.station_distance
    }

    /// Bottom depth (m) under each station, `None` where the cast had no data.
    pub fn station_depth(&self) -> &[Option<f64>] {
        &self.station_depth
    }

    /// Sample from 0 in steps of `dx` km over `[0, max + dx)`.
    pub fn resample(&self, dx: f64) -> Result<TopoMask> {
        if !dx.is_finite() || dx <= 0.0 {
            return Err(SectionError::InvalidParameter(format!(
                "horizontal resolution must be positive, got {}",
                dx
            )));
        }

        let total_distance = self.station_distance.max();
        let num_points = ((total_distance + dx) / dx).ceil() as usize;

        let mut distance = Vec::with_capacity(num_points);
        let mut depth = Vec::with_capacity(num_points);
        for i in 0..num_points {
            let target_distance = i as f64 * dx;
            distance.push(target_distance);
            depth.push(self.depth_at(target_distance));
        }

        Ok(TopoMask { distance, depth })
    }
}

#[derive(Debug, Clone, Default)]
pub struct TopoMaskGenerator {
    config: TopoMaskConfig,
    vertical: VerticalCoordinate,
}

impl TopoMaskGenerator {
    pub fn new(config: TopoMaskConfig) -> Self {
        TopoMaskGenerator {
            config,
            vertical: VerticalCoordinate::Pressure,
        }
    }

    /// What `max_depths` measures. Pressure is converted to depth.
    pub fn with_vertical(mut self, vertical: VerticalCoordinate) -> Self {
        self.vertical = vertical;
        self
    }

    pub fn seafloor(&self, max_depths: &MaxDepths, stations: &[Station]) -> Result<Seafloor> {
        if max_depths.len() != stations.len() {
            return Err(SectionError::LengthMismatch {
                what: "max depths".to_string(),
                expected: stations.len(),
                got: max_depths.len(),
            });
        }

        let station_distance = DistanceAxis::from_stations(stations)?;
        let latitude = mean_latitude(stations).ok_or(SectionError::EmptySection)?;

        let station_depth: Vec<Option<f64>> = max_depths
            .iter()
            .map(|h| {
                h.map(|h| match self.vertical {
                    VerticalCoordinate::Pressure => depth_from_pressure(h, latitude),
                    VerticalCoordinate::Depth => h,
                })
            })
            .collect();

        let (xs, hs): (Vec<f64>, Vec<f64>) = station_distance
            .iter()
            .zip(&station_depth)
            .filter_map(|(&x, &h)| h.map(|h| (x, h)))
            .unzip();

        let skipped = stations.len() - xs.len();
        if skipped > 0 {
            warn!(skipped, "stations without a valid bottom left out of the seafloor trace");
        }
        if xs.is_empty() {
            return Err(SectionError::InsufficientData(
                "no station has a valid maximum depth".to_string(),
            ));
        }

        let profile = FillExtrapolant::flat(Interp1d::fit(&xs, &hs, self.config.kind)?);

        Ok(Seafloor {
            profile,
            station_distance,
            station_depth,
        })
    }

    pub fn generate(&self, max_depths: &MaxDepths, stations: &[Station]) -> Result<TopoMask> {
        self.config.validate()?;
        let mask = self.seafloor(max_depths, stations)?.resample(self.config.dx)?;
        debug!(
            points = mask.len(),
            dx = self.config.dx,
            kind = %self.config.kind,
            "generated topography mask"
        );
        Ok(mask)
    }
}

/// Seafloor mask from station bottom pressures (dbar) and positions.
pub fn gen_topomask(
    max_depths: &MaxDepths,
    stations: &[Station],
    dx: f64,
    kind: InterpolationKind,
) -> Result<TopoMask> {
    TopoMaskGenerator::new(TopoMaskConfig { dx, kind }).generate(max_depths, stations)
}

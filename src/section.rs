//! Profiles, stations and sections.
//!
//! A `Profile` is one cast: strictly increasing levels (pressure or depth)
//! and, per variable, one optional value per level. A `Section` is the ordered
//! list of stations of a transect; all its stations share the same levels so
//! a variable can be stacked into a `Grid` indexed `[level][station]`.

use std::collections::BTreeMap;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SectionError};
use crate::geodesy::DistanceAxis;

/// A 2-D `[level][station]` field with `None` where nothing was measured.
pub type Grid = Array2<Option<f64>>;

/// What the level index of a profile measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalCoordinate {
    /// Sea pressure in dbar.
    #[default]
    Pressure,
    /// Depth in m, positive down.
    Depth,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    levels: Vec<f64>,
    variables: BTreeMap<String, Vec<Option<f64>>>,
}

impl Profile {
    pub fn new(levels: Vec<f64>) -> Result<Self> {
        if let Some(i) = levels.iter().position(|v| !v.is_finite()) {
            return Err(SectionError::InvalidParameter(format!(
                "level {} is not finite",
                i
            )));
        }
        if let Some(i) = levels.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SectionError::NonMonotonicAxis {
                axis: "level".to_string(),
                index: i + 1,
            });
        }
        Ok(Profile {
            levels,
            variables: BTreeMap::new(),
        })
    }

    /// Add or replace a variable. Non-finite values are stored as missing.
    pub fn with_variable(mut self, name: &str, values: Vec<Option<f64>>) -> Result<Self> {
        self.insert_variable(name, values)?;
        Ok(self)
    }

    pub fn insert_variable(&mut self, name: &str, values: Vec<Option<f64>>) -> Result<()> {
        if values.len() != self.levels.len() {
            return Err(SectionError::LengthMismatch {
                what: format!("variable '{}'", name),
                expected: self.levels.len(),
                got: values.len(),
            });
        }
        let values = values
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        self.variables.insert(name.to_string(), values);
        Ok(())
    }

    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn variable(&self, name: &str) -> Option<&[Option<f64>]> {
        self.variables.get(name).map(|v| v.as_slice())
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub profile: Profile,
}

impl Station {
    pub fn new(name: &str, latitude: f64, longitude: f64, profile: Profile) -> Self {
        Station {
            name: name.to_string(),
            latitude,
            longitude,
            profile,
        }
    }

    /// Values of `variable`, or `MissingVariable` if this cast lacks it.
    pub fn values(&self, variable: &str) -> Result<&[Option<f64>]> {
        self.profile
            .variable(variable)
            .ok_or_else(|| SectionError::MissingVariable {
                station: self.name.clone(),
                variable: variable.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    stations: Vec<Station>,
    vertical: VerticalCoordinate,
}

impl Section {
    pub fn new(stations: Vec<Station>) -> Result<Self> {
        Self::with_vertical(stations, VerticalCoordinate::Pressure)
    }

    pub fn with_vertical(stations: Vec<Station>, vertical: VerticalCoordinate) -> Result<Self> {
        let first = stations.first().ok_or(SectionError::EmptySection)?;
        let levels = first.profile.levels();

        for station in &stations[1..] {
            let other = station.profile.levels();
            if other.len() != levels.len() {
                return Err(SectionError::LengthMismatch {
                    what: format!("levels of station '{}'", station.name),
                    expected: levels.len(),
                    got: other.len(),
                });
            }
            if other != levels {
                return Err(SectionError::InvalidParameter(format!(
                    "station '{}' does not share the section levels",
                    station.name
                )));
            }
        }

        Ok(Section { stations, vertical })
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn levels(&self) -> &[f64] {
        self.stations[0].profile.levels()
    }

    pub fn vertical(&self) -> VerticalCoordinate {
        self.vertical
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Same section walked from the last station to the first.
    pub fn reversed(&self) -> Section {
        let mut stations = self.stations.clone();
        stations.reverse();
        Section {
            stations,
            vertical: self.vertical,
        }
    }

    pub fn distance_axis(&self) -> Result<DistanceAxis> {
        DistanceAxis::from_stations(&self.stations)
    }

    /// Stack `variable` of every station into a `[level][station]` grid.
    pub fn grid(&self, variable: &str) -> Result<Grid> {
        let columns = self
            .stations
            .iter()
            .map(|s| s.values(variable))
            .collect::<Result<Vec<_>>>()?;

        let rows = self.levels().len();
        Ok(Array2::from_shape_fn((rows, columns.len()), |(i, j)| {
            columns[j][i]
        }))
    }
}

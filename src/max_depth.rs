/// Deepest valid level per station
///
/// The reach of each cast is read from a reference variable. By default the
/// scan walks down from the surface and stops at the first gap after valid
/// data, so spurious isolated samples below a dropout do not extend the cast.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::section::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxDepthPolicy {
    /// Last valid level of the first contiguous run of valid levels.
    #[default]
    ContinuousCast,
    /// Deepest valid level anywhere in the cast, the plain
    /// `max(level * notnull)` reading. Pick this when the seafloor has to
    /// match bathymetry drawn by existing section plots.
    DeepestValid,
}

/// One maximum level per station, `None` where the station has no valid value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaxDepths(Vec<Option<f64>>);

impl MaxDepths {
    pub fn new(depths: Vec<Option<f64>>) -> Self {
        MaxDepths(depths)
    }

    pub fn as_slice(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deepest station depth, ignoring stations without data.
    pub fn max(&self) -> Option<f64> {
        self.0.iter().flatten().copied().reduce(f64::max)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<f64>> + '_ {
        self.0.iter().copied()
    }
}

/// Level of the deepest usable sample in one cast.
pub fn profile_max_depth(levels: &[f64], values: &[Option<f64>], policy: MaxDepthPolicy) -> Option<f64> {
    match policy {
        MaxDepthPolicy::ContinuousCast => {
            let mut deepest = None;
            for (&level, value) in levels.iter().zip(values) {
                match value {
                    Some(_) => deepest = Some(level),
                    None if deepest.is_some() => break,
                    None => {}
                }
            }
            deepest
        }
        MaxDepthPolicy::DeepestValid => levels
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_some())
            .map(|(&level, _)| level)
            .last(),
    }
}

/// Maximum valid level of `variable` for every station, in section order.
///
/// Fails with `MissingVariable` if any station lacks the variable.
pub fn get_maxdepth(section: &Section, variable: &str) -> Result<MaxDepths> {
    get_maxdepth_with(section, variable, MaxDepthPolicy::default())
}

pub fn get_maxdepth_with(section: &Section, variable: &str, policy: MaxDepthPolicy) -> Result<MaxDepths> {
    let levels = section.levels();
    let mut depths = Vec::with_capacity(section.len());

    for station in section.stations() {
        let values = station.values(variable)?;
        let depth = profile_max_depth(levels, values, policy);
        if depth.is_none() {
            warn!(station = %station.name, variable, "station has no valid samples");
        }
        depths.push(depth);
    }

    debug!(stations = depths.len(), ?policy, "extracted max depths for '{}'", variable);
    Ok(MaxDepths(depths))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SectionError;
    use crate::section::{Profile, Station};

    const LEVELS: [f64; 5] = [10.0, 20.0, 30.0, 40.0, 50.0];

    fn section_of(casts: Vec<Vec<Option<f64>>>) -> Section {
        let stations = casts
            .into_iter()
            .enumerate()
            .map(|(i, values)| {
                let profile = Profile::new(LEVELS.to_vec())
                    .unwrap()
                    .with_variable("t090C", values)
                    .unwrap();
                Station::new(&format!("st{}", i), -25.0, -45.0 + 0.1 * i as f64, profile)
            })
            .collect();
        Section::new(stations).unwrap()
    }

    #[test]
    fn test_stops_at_first_gap_after_valid_data() {
        let values = vec![Some(1.0), Some(2.0), None, Some(4.0), None];
        assert_eq!(profile_max_depth(&LEVELS, &values, MaxDepthPolicy::ContinuousCast), Some(20.0));
    }

    #[test]
    fn test_deepest_valid_policy() {
        let values = vec![Some(1.0), Some(2.0), None, Some(4.0), None];
        assert_eq!(profile_max_depth(&LEVELS, &values, MaxDepthPolicy::DeepestValid), Some(40.0));
    }

    #[test]
    fn test_leading_gap_is_skipped() {
        let values = vec![None, Some(2.0), Some(3.0), None, None];
        assert_eq!(profile_max_depth(&LEVELS, &values, MaxDepthPolicy::ContinuousCast), Some(30.0));
    }

    #[test]
    fn test_section_max_depths() {
        let section = section_of(vec![
            vec![Some(1.0), Some(2.0), None, Some(4.0), None],
            vec![Some(1.0); 5],
            vec![None; 5],
        ]);

        let depths = get_maxdepth(&section, "t090C").unwrap();
        assert_eq!(depths.as_slice(), &[Some(20.0), Some(50.0), None]);
        assert_eq!(depths.max(), Some(50.0));
    }

    #[test]
    fn test_missing_variable_fails_loudly() {
        let section = section_of(vec![vec![Some(1.0); 5]]);
        let err = get_maxdepth(&section, "sal00").unwrap_err();
        assert!(matches!(err, SectionError::MissingVariable { .. }));
    }
}

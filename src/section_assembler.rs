//! Prepares a station section for contouring.
//!
//! Runs max-depth extraction, optional shadow-zone extrapolation and the
//! seafloor mask in order, then hands the bundle to a `SectionRenderer`.

use tracing::{debug, info};

use crate::config::AssemblerConfig;
use crate::error::{Result, SectionError};
use crate::geodesy::DistanceAxis;
use crate::max_depth::{get_maxdepth_with, MaxDepths};
use crate::section::{Grid, Section};
use crate::section_extrapolator::{ExtrapolationStats, SectionExtrapolator};
use crate::topo_mask::{TopoMask, TopoMaskGenerator};

/// Everything a renderer needs to draw one section.
#[derive(Debug, Clone)]
pub struct PreparedSection {
    pub variable: String,
    pub station_names: Vec<String>,
    /// Along-track distance of each station (km).
    pub distance: DistanceAxis,
    /// Section levels, one per grid row.
    pub levels: Vec<f64>,
    pub max_depths: MaxDepths,
    /// `[level][station]`, extrapolated when filled contours were requested.
    pub grid: Grid,
    pub topomask: TopoMask,
    /// Present when the grid was extrapolated.
    pub extrapolation: Option<ExtrapolationStats>,
    /// Contour levels spanning the measured values (before extrapolation).
    pub contour_levels: Vec<f64>,
    pub marker_offset: f64,
}

impl PreparedSection {
    /// Lower edge of the drawing: the deepest point of the seafloor trace.
    pub fn bottom(&self) -> Option<f64> {
        self.topomask.max_depth()
    }
}

/// Draws a prepared section. Implementations own the output medium.
pub trait SectionRenderer {
    type Output;

    fn render(&mut self, section: &PreparedSection) -> Result<Self::Output>;
}

#[derive(Debug, Clone, Default)]
pub struct SectionAssembler {
    config: AssemblerConfig,
}

impl SectionAssembler {
    pub fn new(config: AssemblerConfig) -> Self {
        SectionAssembler { config }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn assemble(&self, section: &Section, variable: &str) -> Result<PreparedSection> {
        self.config.validate()?;

        let reversed;
        let section = if self.config.inverse {
            reversed = section.reversed();
            &reversed
        } else {
            section
        };

        let distance = section.distance_axis()?;
        let levels = section.levels().to_vec();
        let max_depths = get_maxdepth_with(section, variable, self.config.max_depth_policy)?;
        let raw = section.grid(variable)?;
        // Levels follow the measured values, not the extrapolated overshoot
        let contour_levels = contour_levels(&raw, self.config.level_step)?;

        let (grid, extrapolation) = if self.config.filled {
            let result = SectionExtrapolator::new(self.config.extrapolation)
                .extrapolate(&raw, &distance, &levels)?;
            (result.grid, Some(result.stats))
        } else {
            (raw, None)
        };

        let topomask = TopoMaskGenerator::new(self.config.topomask)
            .with_vertical(section.vertical())
            .generate(&max_depths, section.stations())?;

        info!(
            variable,
            stations = section.len(),
            levels = levels.len(),
            filled = self.config.filled,
            "assembled section spanning {:.1} km",
            distance.max()
        );

        Ok(PreparedSection {
            variable: variable.to_string(),
            station_names: section.stations().iter().map(|s| s.name.clone()).collect(),
            distance,
            levels,
            max_depths,
            grid,
            topomask,
            extrapolation,
            contour_levels,
            marker_offset: self.config.marker_offset,
        })
    }

    /// Assemble and pass the result straight to `renderer`.
    pub fn render<R: SectionRenderer>(
        &self,
        section: &Section,
        variable: &str,
        renderer: &mut R,
    ) -> Result<R::Output> {
        let prepared = self.assemble(section, variable)?;
        renderer.render(&prepared)
    }
}

/// Levels from `floor(min)` to `ceil(max)` in steps of `step`, inclusive.
pub fn contour_levels(grid: &Grid, step: f64) -> Result<Vec<f64>> {
    if !step.is_finite() || step <= 0.0 {
        return Err(SectionError::InvalidParameter(format!(
            "contour level step must be positive, got {}",
            step
        )));
    }

    let mut values = grid.iter().flatten().copied();
    let Some(first) = values.next() else {
        debug!("no valid values, no contour levels");
        return Ok(Vec::new());
    };
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let start = min.floor();
    let stop = max.ceil() + step;
    let count = ((stop - start) / step).ceil() as usize;
    Ok((0..count).map(|i| start + i as f64 * step).collect())
}

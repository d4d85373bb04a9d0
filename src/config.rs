use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SectionError};
use crate::interpolation::InterpolationKind;
use crate::max_depth::MaxDepthPolicy;

/// Blend weights and fit family for shadow-zone extrapolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrapolationConfig {
    /// Weight of the pass along each level, across stations.
    pub w1: f64,
    /// Weight of the pass along each station, across levels.
    pub w2: f64,
    pub kind: InterpolationKind,
}

impl Default for ExtrapolationConfig {
    fn default() -> Self {
        ExtrapolationConfig {
            w1: 1.0,
            w2: 0.0,
            kind: InterpolationKind::Linear,
        }
    }
}

impl ExtrapolationConfig {
    /// Weights used when filling a section for contouring.
    pub fn shadow_zone() -> Self {
        ExtrapolationConfig {
            w1: 0.97,
            w2: 0.03,
            ..Default::default()
        }
    }

    pub fn with_weights(w1: f64, w2: f64) -> Self {
        ExtrapolationConfig {
            w1,
            w2,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.w1.is_finite() || !self.w2.is_finite() {
            return Err(SectionError::InvalidParameter(format!(
                "blend weights must be finite (w1={}, w2={})",
                self.w1, self.w2
            )));
        }
        Ok(())
    }
}

/// Resampling of the seafloor trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopoMaskConfig {
    /// Horizontal resolution in km.
    pub dx: f64,
    pub kind: InterpolationKind,
}

impl Default for TopoMaskConfig {
    fn default() -> Self {
        TopoMaskConfig {
            dx: 1.0,
            kind: InterpolationKind::Linear,
        }
    }
}

impl TopoMaskConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.dx.is_finite() || self.dx <= 0.0 {
            return Err(SectionError::InvalidParameter(format!(
                "horizontal resolution must be positive, got {}",
                self.dx
            )));
        }
        Ok(())
    }
}

/// Everything needed to prepare one section for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Extrapolate into shadow zones before contouring.
    pub filled: bool,
    /// Walk the section from the last station to the first.
    pub inverse: bool,
    pub max_depth_policy: MaxDepthPolicy,
    pub extrapolation: ExtrapolationConfig,
    pub topomask: TopoMaskConfig,
    /// Spacing of contour levels.
    pub level_step: f64,
    /// Vertical position of the station markers above the surface.
    pub marker_offset: f64,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        AssemblerConfig {
            filled: false,
            inverse: false,
            max_depth_policy: MaxDepthPolicy::ContinuousCast,
            extrapolation: ExtrapolationConfig::shadow_zone(),
            topomask: TopoMaskConfig::default(),
            level_step: 0.5,
            marker_offset: -5.0,
        }
    }
}

impl AssemblerConfig {
    /// Filled contours with shadow zones extrapolated
    pub fn filled() -> Self {
        AssemblerConfig {
            filled: true,
            ..Default::default()
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AssemblerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        self.extrapolation.validate()?;
        self.topomask.validate()?;
        if !self.level_step.is_finite() || self.level_step <= 0.0 {
            return Err(SectionError::InvalidParameter(format!(
                "contour level step must be positive, got {}",
                self.level_step
            )));
        }
        Ok(())
    }
}

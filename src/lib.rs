//! Gridded cross-sections from CTD station transects.
//!
//! Stations along a transect are stacked into a `[level][station]` grid,
//! shadow zones under shallow casts are extrapolated, and a seafloor trace
//! is resampled from the deepest sample of every cast.
//!
//! ```rust
//! use ctd_section::prelude::*;
//!
//! let levels = vec![0.0, 10.0, 20.0];
//! let shallow = Profile::new(levels.clone())?
//!     .with_variable("temp", vec![Some(24.0), Some(22.0), None])?;
//! let deep = Profile::new(levels)?
//!     .with_variable("temp", vec![Some(23.5), Some(21.0), Some(19.0)])?;
//!
//! let section = Section::new(vec![
//!     Station::new("st01", -23.9, -45.1, shallow),
//!     Station::new("st02", -24.0, -45.0, deep),
//! ])?;
//!
//! let prepared = SectionAssembler::new(AssemblerConfig::filled()).assemble(&section, "temp")?;
//! assert!(prepared.grid.iter().all(|v| v.is_some()));
//! # Ok::<(), SectionError>(())
//! ```

pub mod config;
pub mod error;
pub mod geodesy;
pub mod interpolation;
pub mod logger;
pub mod max_depth;
pub mod section;
pub mod section_assembler;
pub mod section_extrapolator;
pub mod section_writer;
pub mod station_reader;
pub mod topo_mask;

pub use config::{AssemblerConfig, ExtrapolationConfig, TopoMaskConfig};
pub use error::{Result, SectionError};
pub use geodesy::DistanceAxis;
pub use interpolation::{FillExtrapolant, Interp1d, Interpolant, InterpolationKind, LinearExtrapolant};
pub use max_depth::{get_maxdepth, get_maxdepth_with, MaxDepthPolicy, MaxDepths};
pub use section::{Grid, Profile, Section, Station, VerticalCoordinate};
pub use section_assembler::{PreparedSection, SectionAssembler, SectionRenderer};
pub use section_extrapolator::{extrap_sec, SectionExtrapolator};
pub use section_writer::CsvSectionWriter;
pub use station_reader::read_section;
pub use topo_mask::{gen_topomask, TopoMask, TopoMaskGenerator};

pub mod prelude {
    pub use crate::config::{AssemblerConfig, ExtrapolationConfig, TopoMaskConfig};
    pub use crate::error::{Result, SectionError};
    pub use crate::interpolation::{Interpolant, InterpolationKind};
    pub use crate::max_depth::{get_maxdepth, MaxDepths};
    pub use crate::section::{Grid, Profile, Section, Station};
    pub use crate::section_assembler::{SectionAssembler, SectionRenderer};
    pub use crate::section_extrapolator::extrap_sec;
    pub use crate::topo_mask::gen_topomask;
}

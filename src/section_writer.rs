/// CSV output for prepared sections
///
/// Writes three files next to each other so an external plotting tool can
/// draw the section:
/// - `<stem>_grid.csv`: one row per cell (level, distance, station, value)
/// - `<stem>_topomask.csv`: the resampled seafloor trace
/// - `<stem>_stations.csv`: station positions and cast depths

use std::fs;
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::section_assembler::{PreparedSection, SectionRenderer};

#[derive(Debug, Serialize)]
struct TopoRow {
    distance_km: f64,
    depth_m: f64,
}

#[derive(Debug, Serialize)]
struct StationRow<'a> {
    station: &'a str,
    distance_km: f64,
    max_depth: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CsvSectionWriter {
    output_dir: PathBuf,
    stem: String,
}

impl CsvSectionWriter {
    pub fn new<P: AsRef<Path>>(output_dir: P, stem: &str) -> Self {
        CsvSectionWriter {
            output_dir: output_dir.as_ref().to_path_buf(),
            stem: stem.to_string(),
        }
    }

    fn path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}.csv", self.stem, suffix))
    }

    fn write_grid(&self, section: &PreparedSection, path: &Path) -> Result<()> {
        let mut wtr = Writer::from_path(path)?;
        wtr.write_record(["level", "distance_km", "station", "value"])?;

        for ((i, j), value) in section.grid.indexed_iter() {
            wtr.write_record(&[
                format!("{}", section.levels[i]),
                format!("{:.3}", section.distance[j]),
                section.station_names[j].clone(),
                value.map(|v| format!("{:.4}", v)).unwrap_or_default(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_topomask(&self, section: &PreparedSection, path: &Path) -> Result<()> {
        let mut wtr = Writer::from_path(path)?;
        for (distance_km, depth_m) in section.topomask.iter() {
            wtr.serialize(TopoRow { distance_km, depth_m })?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_stations(&self, section: &PreparedSection, path: &Path) -> Result<()> {
        let mut wtr = Writer::from_path(path)?;
        for ((name, &distance_km), max_depth) in section
            .station_names
            .iter()
            .zip(section.distance.iter())
            .zip(section.max_depths.iter())
        {
            wtr.serialize(StationRow {
                station: name,
                distance_km,
                max_depth,
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl SectionRenderer for CsvSectionWriter {
    type Output = Vec<PathBuf>;

    fn render(&mut self, section: &PreparedSection) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)?;

        let grid = self.path("grid");
        let topomask = self.path("topomask");
        let stations = self.path("stations");

        self.write_grid(section, &grid)?;
        self.write_topomask(section, &topomask)?;
        self.write_stations(section, &stations)?;

        debug!(dir = %self.output_dir.display(), stem = %self.stem, "wrote section CSVs");
        Ok(vec![grid, topomask, stations])
    }
}

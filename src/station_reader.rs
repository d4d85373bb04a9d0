/// CSV loader for station sections
///
/// Long format, one row per station level:
///
/// ```text
/// station,latitude,longitude,pressure,t090C,sal00
/// st01,-23.90,-45.10,1,24.8,35.1
/// st01,-23.90,-45.10,2,24.7,
/// ```
///
/// The fourth column names the vertical coordinate (`pressure` or `depth`).
/// Empty cells and `NaN` are missing values. Stations keep file order, and
/// levels are merged over all stations so a shallow cast simply has no value
/// at the deeper levels.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Result, SectionError};
use crate::section::{Profile, Section, Station, VerticalCoordinate};

const FIXED_COLUMNS: usize = 4;

struct StationRows {
    name: String,
    latitude: f64,
    longitude: f64,
    rows: Vec<(f64, Vec<Option<f64>>)>,
}

pub fn read_section<P: AsRef<Path>>(path: P) -> Result<Section> {
    let file = File::open(path.as_ref())?;
    let section = read_section_from_reader(file)?;
    debug!(path = %path.as_ref().display(), stations = section.len(), "loaded section");
    Ok(section)
}

pub fn read_section_from_reader<R: Read>(reader: R) -> Result<Section> {
    let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    let (vertical, variables) = parse_headers(&headers)?;

    let mut stations: Vec<StationRows> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let name = record.get(0).unwrap_or("").to_string();
        if name.is_empty() {
            return Err(parse_error(line, "empty station name"));
        }
        let latitude = required_number(&record, 1, "latitude", line)?;
        let longitude = required_number(&record, 2, "longitude", line)?;
        let level = required_number(&record, 3, "level", line)?;
        let values = (0..variables.len())
            .map(|k| optional_number(record.get(FIXED_COLUMNS + k).unwrap_or(""), line))
            .collect::<Result<Vec<_>>>()?;

        let idx = *index_of.entry(name.clone()).or_insert_with(|| {
            stations.push(StationRows {
                name,
                latitude,
                longitude,
                rows: Vec::new(),
            });
            stations.len() - 1
        });
        stations[idx].rows.push((level, values));
    }

    if stations.is_empty() {
        return Err(SectionError::EmptySection);
    }

    let mut levels: Vec<f64> = stations
        .iter()
        .flat_map(|s| s.rows.iter().map(|(level, _)| *level))
        .collect();
    levels.sort_by(|a, b| a.total_cmp(b));
    levels.dedup();

    let stations = stations
        .into_iter()
        .map(|s| build_station(s, &levels, &variables))
        .collect::<Result<Vec<_>>>()?;

    Section::with_vertical(stations, vertical)
}

fn parse_headers(headers: &StringRecord) -> Result<(VerticalCoordinate, Vec<String>)> {
    let expected = ["station", "latitude", "longitude"];
    for (i, name) in expected.iter().enumerate() {
        let got = headers.get(i).unwrap_or("");
        if !got.eq_ignore_ascii_case(name) {
            return Err(parse_error(1, &format!("column {} must be '{}', found '{}'", i + 1, name, got)));
        }
    }

    let vertical = match headers.get(3).map(|h| h.to_lowercase()).as_deref() {
        Some("pressure") | Some("pres") | Some("p") => VerticalCoordinate::Pressure,
        Some("depth") | Some("z") => VerticalCoordinate::Depth,
        other => {
            return Err(parse_error(
                1,
                &format!("column 4 must be 'pressure' or 'depth', found '{}'", other.unwrap_or("")),
            ))
        }
    };

    let variables: Vec<String> = headers.iter().skip(FIXED_COLUMNS).map(|h| h.to_string()).collect();
    if variables.is_empty() {
        return Err(parse_error(1, "no variable columns"));
    }
    Ok((vertical, variables))
}

fn build_station(rows: StationRows, levels: &[f64], variables: &[String]) -> Result<Station> {
    let mut columns = vec![vec![None; levels.len()]; variables.len()];
    let mut seen = vec![false; levels.len()];

    for (level, values) in rows.rows {
        let i = levels.partition_point(|&l| l < level);
        if seen[i] {
            return Err(SectionError::InvalidParameter(format!(
                "station '{}' repeats level {}",
                rows.name, level
            )));
        }
        seen[i] = true;
        for (column, value) in columns.iter_mut().zip(values) {
            column[i] = value;
        }
    }

    let mut profile = Profile::new(levels.to_vec())?;
    for (name, values) in variables.iter().zip(columns) {
        profile.insert_variable(name, values)?;
    }
    Ok(Station::new(&rows.name, rows.latitude, rows.longitude, profile))
}

fn required_number(record: &StringRecord, column: usize, what: &str, line: u64) -> Result<f64> {
    match optional_number(record.get(column).unwrap_or(""), line)? {
        Some(v) => Ok(v),
        None => Err(parse_error(line, &format!("missing {}", what))),
    }
}

fn optional_number(cell: &str, line: u64) -> Result<Option<f64>> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell
        .parse()
        .map_err(|_| parse_error(line, &format!("'{}' is not a number", cell)))?;
    Ok(Some(value).filter(|v| v.is_finite()))
}

fn parse_error(line: u64, message: &str) -> SectionError {
    SectionError::Parse {
        line,
        message: message.to_string(),
    }
}

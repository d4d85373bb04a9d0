use std::fs;

use approx::assert_relative_eq;
use ndarray::array;

use ctd_section::prelude::*;
use ctd_section::section_extrapolator::total_variation;
use ctd_section::station_reader::read_section_from_reader;
use ctd_section::{CsvSectionWriter, MaxDepthPolicy};

fn shallow_first_station() -> Grid {
    array![
        [Some(10.0), Some(12.0), Some(14.0)],
        [Some(9.0), Some(11.0), Some(13.0)],
        [None, Some(10.0), Some(12.0)],
        [None, Some(9.0), Some(11.0)],
        [None, None, Some(10.0)],
    ]
}

#[test]
fn shadow_zone_is_filled_smoother_than_zero_fill() {
    let grid = shallow_first_station();
    let distance = [0.0, 12.5, 25.0];
    let depth = [0.0, 10.0, 20.0, 30.0, 40.0];

    let filled = extrap_sec(&grid, &distance, &depth, 0.97, 0.03).unwrap();
    assert_eq!(filled.dim(), grid.dim());
    for ((i, j), value) in filled.indexed_iter() {
        let v = value.unwrap_or_else(|| panic!("cell ({}, {}) left empty", i, j));
        assert!(v.is_finite());
    }

    let zero_filled = grid.mapv(|v| Some(v.unwrap_or(0.0)));
    assert!(
        total_variation(&filled) < total_variation(&zero_filled),
        "extrapolated {} vs zero-filled {}",
        total_variation(&filled),
        total_variation(&zero_filled)
    );
}

#[test]
fn row_pass_alone_keeps_complete_rows() {
    let grid = shallow_first_station();
    let distance = [0.0, 12.5, 25.0];
    let depth = [0.0, 10.0, 20.0, 30.0, 40.0];

    let filled = extrap_sec(&grid, &distance, &depth, 1.0, 0.0).unwrap();
    // Linear rows are reproduced exactly
    assert_relative_eq!(filled[[0, 0]].unwrap(), 10.0, epsilon = 1e-9);
    assert_relative_eq!(filled[[1, 2]].unwrap(), 13.0, epsilon = 1e-9);
    // Slope continued from the two valid stations
    assert_relative_eq!(filled[[2, 0]].unwrap(), 8.0, epsilon = 1e-9);
    // Single valid value broadcast across the row
    assert_relative_eq!(filled[[4, 0]].unwrap(), 10.0, epsilon = 1e-9);
}

const TRANSECT: &str = "\
station,latitude,longitude,depth,temp,salt
A,-23.50,-45.00,0,25.0,35.0
A,-23.50,-45.00,10,24.0,35.1
A,-23.50,-45.00,20,,35.2
B,-23.60,-44.90,0,24.8,35.0
B,-23.60,-44.90,10,23.6,35.1
B,-23.60,-44.90,20,22.1,35.2
B,-23.60,-44.90,30,20.9,
C,-23.70,-44.80,0,24.6,35.0
C,-23.70,-44.80,10,23.2,35.1
C,-23.70,-44.80,20,21.7,35.3
C,-23.70,-44.80,30,20.2,35.4
C,-23.70,-44.80,40,18.8,35.5
";

#[test]
fn csv_transect_through_assembler() {
    let section = read_section_from_reader(TRANSECT.as_bytes()).unwrap();
    assert_eq!(section.len(), 3);
    assert_eq!(section.levels(), &[0.0, 10.0, 20.0, 30.0, 40.0]);

    let max_depths = get_maxdepth(&section, "temp").unwrap();
    assert_eq!(max_depths.as_slice(), &[Some(10.0), Some(30.0), Some(40.0)]);

    let mut config = AssemblerConfig::filled();
    config.topomask.dx = 0.5;
    let prepared = SectionAssembler::new(config).assemble(&section, "temp").unwrap();

    assert!(prepared.grid.iter().all(|v| v.is_some()));
    let stats = prepared.extrapolation.clone().unwrap();
    assert_eq!(stats.originally_missing, 4);
    assert_eq!(stats.residual_missing, 0);

    // Stations roughly 15 km apart
    let length = prepared.distance.max();
    assert!(length > 25.0 && length < 35.0, "length {}", length);

    assert_eq!(prepared.topomask.distance[0], 0.0);
    assert!(*prepared.topomask.distance.last().unwrap() >= length);
    assert_relative_eq!(prepared.bottom().unwrap(), 40.0, epsilon = 1e-9);

    let first = *prepared.contour_levels.first().unwrap();
    let last = *prepared.contour_levels.last().unwrap();
    assert!(first <= 18.8 && last >= 25.0);
}

#[test]
fn inverse_section_reverses_stations() {
    let section = read_section_from_reader(TRANSECT.as_bytes()).unwrap();
    let mut config = AssemblerConfig::default();
    config.inverse = true;
    let prepared = SectionAssembler::new(config).assemble(&section, "temp").unwrap();

    assert_eq!(prepared.station_names, vec!["C", "B", "A"]);
    assert_eq!(prepared.max_depths.as_slice(), &[Some(40.0), Some(30.0), Some(10.0)]);
    assert!(prepared.extrapolation.is_none());
}

#[test]
fn deepest_valid_policy_skips_interior_gaps() {
    let csv = "\
station,latitude,longitude,depth,temp
A,0,0,0,20
A,0,0,10,
A,0,0,20,18
B,0,0.1,0,21
B,0,0.1,10,19
B,0,0.1,20,17
";
    let section = read_section_from_reader(csv.as_bytes()).unwrap();
    let continuous = get_maxdepth(&section, "temp").unwrap();
    let deepest = ctd_section::get_maxdepth_with(&section, "temp", MaxDepthPolicy::DeepestValid).unwrap();

    assert_eq!(continuous.as_slice()[0], Some(0.0));
    assert_eq!(deepest.as_slice()[0], Some(20.0));
}

#[test]
fn missing_variable_is_reported() {
    let section = read_section_from_reader(TRANSECT.as_bytes()).unwrap();
    let err = SectionAssembler::default().assemble(&section, "oxygen").unwrap_err();
    assert!(matches!(err, SectionError::MissingVariable { .. }));
}

#[test]
fn writer_output_round_trips_files() {
    let section = read_section_from_reader(TRANSECT.as_bytes()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let mut writer = CsvSectionWriter::new(dir.path(), "transect");

    let paths = SectionAssembler::new(AssemblerConfig::filled())
        .render(&section, "salt", &mut writer)
        .unwrap();

    let grid = fs::read_to_string(&paths[0]).unwrap();
    // header + 5 levels x 3 stations
    assert_eq!(grid.lines().count(), 16);
    assert!(grid.lines().skip(1).all(|line| !line.ends_with(',')));

    let stations = fs::read_to_string(&paths[2]).unwrap();
    assert!(stations.starts_with("station,distance_km,max_depth"));
    assert_eq!(stations.lines().count(), 4);
}

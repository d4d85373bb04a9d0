use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use clap::Parser;
use csv::Writer;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use ctd_section::logger;
use ctd_section::{
    read_section, AssemblerConfig, CsvSectionWriter, InterpolationKind, SectionAssembler, SectionRenderer,
};

#[derive(Debug, Parser)]
#[command(name = "ctd-section", about = "Grid CTD station transects into contourable sections")]
struct Cli {
    /// Section CSV file, or a folder searched recursively for *.csv
    #[arg(short, long)]
    input: PathBuf,

    /// Variable to grid (column name in the CSV)
    #[arg(short = 'V', long)]
    variable: String,

    /// Output folder
    #[arg(short, long, default_value = "section_output")]
    output: PathBuf,

    /// TOML file with assembler settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extrapolate shadow zones for filled contours
    #[arg(long)]
    filled: bool,

    /// Reverse station order
    #[arg(long)]
    inverse: bool,

    /// Seafloor resolution in km
    #[arg(long)]
    dx: Option<f64>,

    /// Interpolation kind for the seafloor trace
    #[arg(long)]
    kind: Option<InterpolationKind>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Serialize, Clone)]
struct SectionSummary {
    filename: String,
    variable: String,
    stations: usize,
    levels: usize,
    length_km: f64,
    deepest_bottom_m: f64,
    originally_missing: usize,
    residual_missing: usize,
    processing_status: String,
    processed_at: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let start_time = Instant::now();
    let config = build_config(&cli)?;

    println!("\n🌊 CTD SECTION PROCESSOR");
    println!("========================");
    println!("   • Variable: {}", cli.variable);
    println!("   • Filled contours: {}", config.filled);
    if config.filled {
        println!(
            "   • Blend weights: w1={:.2} (along level), w2={:.2} (along cast)",
            config.extrapolation.w1, config.extrapolation.w2
        );
    }
    println!("   • Seafloor: dx={} km, kind={}", config.topomask.dx, config.topomask.kind);

    let files = collect_section_files(&cli.input)?;
    if files.is_empty() {
        println!("⚠️  No section CSV files found in {}", cli.input.display());
        return Ok(());
    }
    println!("🔍 Found {} section file(s)", files.len());
    println!("⚡ Using parallel processing on {} cores\n", num_cpus::get());

    let assembler = SectionAssembler::new(config);
    let summaries: Vec<SectionSummary> = files
        .par_iter()
        .map(|path| process_section_file(path, &cli.variable, &cli.output, &assembler))
        .collect();

    for summary in &summaries {
        if summary.processing_status == "ok" {
            println!(
                "   ✅ {}: {} stations, {:.1} km, bottom {:.0} m, {} gaps left",
                summary.filename,
                summary.stations,
                summary.length_km,
                summary.deepest_bottom_m,
                summary.residual_missing
            );
        } else {
            println!("   ❌ {}: {}", summary.filename, summary.processing_status);
        }
    }

    std::fs::create_dir_all(&cli.output)?;
    let summary_path = cli.output.join("section_summary.csv");
    write_summary(&summaries, &summary_path)?;

    let failed = summaries.iter().filter(|s| s.processing_status != "ok").count();
    println!("\n⏱️  Processed {} file(s) in {:.1}s", summaries.len(), start_time.elapsed().as_secs_f64());
    if failed > 0 {
        println!("⚠️  {} file(s) failed", failed);
    }
    println!("📁 Results saved to: {}", cli.output.display());

    Ok(())
}

fn build_config(cli: &Cli) -> Result<AssemblerConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => AssemblerConfig::from_toml_file(path)?,
        None => AssemblerConfig::default(),
    };

    if cli.filled {
        config.filled = true;
    }
    if cli.inverse {
        config.inverse = true;
    }
    if let Some(dx) = cli.dx {
        config.topomask.dx = dx;
    }
    if let Some(kind) = cli.kind {
        config.topomask.kind = kind;
    }

    config.validate()?;
    Ok(config)
}

fn collect_section_files(input: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .and_then(|s| s.to_str())
                .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn process_section_file(
    path: &Path,
    variable: &str,
    output: &Path,
    assembler: &SectionAssembler,
) -> SectionSummary {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "section".to_string());

    let mut summary = SectionSummary {
        filename,
        variable: variable.to_string(),
        stations: 0,
        levels: 0,
        length_km: 0.0,
        deepest_bottom_m: 0.0,
        originally_missing: 0,
        residual_missing: 0,
        processing_status: "ok".to_string(),
        processed_at: Utc::now().to_rfc3339(),
    };

    let result = read_section(path).and_then(|section| {
        let prepared = assembler.assemble(&section, variable)?;
        CsvSectionWriter::new(output, &stem).render(&prepared)?;
        Ok(prepared)
    });

    match result {
        Ok(prepared) => {
            summary.stations = prepared.station_names.len();
            summary.levels = prepared.levels.len();
            summary.length_km = prepared.distance.max();
            summary.deepest_bottom_m = prepared.bottom().unwrap_or(0.0);
            let missing = prepared.grid.iter().filter(|v| v.is_none()).count();
            match &prepared.extrapolation {
                Some(stats) => {
                    summary.originally_missing = stats.originally_missing;
                    summary.residual_missing = stats.residual_missing;
                }
                None => {
                    summary.originally_missing = missing;
                    summary.residual_missing = missing;
                }
            }
        }
        Err(e) => {
            tracing::error!(file = %path.display(), "section failed: {}", e);
            summary.processing_status = format!("error: {}", e);
        }
    }

    summary
}

fn write_summary(summaries: &[SectionSummary], output_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = Writer::from_path(output_path)?;
    for summary in summaries {
        wtr.serialize(summary)?;
    }
    wtr.flush()?;
    Ok(())
}

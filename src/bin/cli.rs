//! traceprofile CLI - Debug tool for mobility profiling
//!
//! Usage:
//!   traceprofile-cli run <fixes.csv> [--output <dir>] [--subject <id>]
//!   traceprofile-cli demo [--seed <n>] [--output <dir>]
//!
//! `run` loads a CSV of fixes (subject_id,timestamp,lat,lon with RFC 3339
//! timestamps), profiles each subject and writes per-subject place/move
//! tables. `demo` generates a synthetic commuter week and profiles it,
//! showing what the pipeline derives.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use traceprofile::{
    CanonicalPlace, Fix, MobilityPipeline, MobilityProfile, PipelineConfig, TaggedMove, TraceStore,
};

#[derive(Parser)]
#[command(name = "traceprofile-cli")]
#[command(about = "Debug tool for GPS mobility profiling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Profile subjects from a CSV of GPS fixes
    Run {
        /// CSV file with columns: subject_id,timestamp,lat,lon
        input: PathBuf,

        /// Output directory for result tables
        #[arg(short, long, default_value = "data")]
        output: PathBuf,

        /// Only process this subject
        #[arg(short, long)]
        subject: Option<String>,

        /// UTC offset in hours for hour-of-day classification windows
        #[arg(long, default_value = "0")]
        utc_offset: i32,

        /// Also dump the full profile as JSON per subject
        #[arg(long)]
        json: bool,
    },

    /// Generate and profile a synthetic commuter week
    Demo {
        /// RNG seed for the generator
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory for result tables
        #[arg(short, long, default_value = "data")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{:5}] {}", record.level(), record.args())
        })
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            subject,
            utc_offset,
            json,
        } => run(&input, &output, subject.as_deref(), utc_offset, json, cli.verbose),
        Commands::Demo { seed, output } => demo(seed, &output),
    }
}

#[derive(Debug, Deserialize)]
struct FixRow {
    subject_id: String,
    timestamp: DateTime<Utc>,
    lat: f64,
    lon: f64,
}

fn run(
    input: &Path,
    output: &Path,
    subject_filter: Option<&str>,
    utc_offset: i32,
    json: bool,
    verbose: bool,
) -> Result<()> {
    println!("Loading fixes from: {}", input.display());

    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("cannot open {}", input.display()))?;

    let mut store = TraceStore::new();
    for row in reader.deserialize() {
        let row: FixRow = row.context("malformed fix row")?;
        if let Some(filter) = subject_filter {
            if row.subject_id != filter {
                continue;
            }
        }
        store.append(&row.subject_id, [Fix::new(row.timestamp, row.lat, row.lon)]);
    }

    println!("Loaded {} subject(s)", store.len());
    if store.is_empty() {
        return Ok(());
    }

    let mut config = PipelineConfig::default();
    config.classifier.utc_offset_hours = utc_offset;
    config.grouping.utc_offset_hours = utc_offset;
    let pipeline = MobilityPipeline::new(config);

    fs::create_dir_all(output)
        .with_context(|| format!("cannot create {}", output.display()))?;

    let results = pipeline.run_batch(store.into_traces());

    let mut failures = 0;
    for (subject_id, result) in results {
        match result {
            Ok(profile) => {
                if verbose {
                    print_profile(&subject_id, &profile);
                }
                write_tables(output, &subject_id, &profile, json)?;
            }
            Err(e) => {
                eprintln!("  {} FAILED: {}", subject_id, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        eprintln!("{} subject(s) failed", failures);
    }
    println!("Results written to {}", output.display());
    Ok(())
}

fn demo(seed: u64, output: &Path) -> Result<()> {
    let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    let fixes = traceprofile::synthetic::commuter_week(
        seed,
        (48.8566, 2.3522),  // home
        (48.8900, 2.2400),  // work
        (48.8400, 2.4000),  // weekend spot
        start,
    );
    println!("Generated {} fixes over one week", fixes.len());

    let pipeline = MobilityPipeline::new(PipelineConfig::default());
    let profile = pipeline.run("demo", fixes)?;

    print_profile("demo", &profile);

    fs::create_dir_all(output)?;
    write_tables(output, "demo", &profile, false)?;
    println!("Results written to {}", output.display());
    Ok(())
}

fn print_profile(subject_id: &str, profile: &MobilityProfile) {
    println!("\n{}", "=".repeat(60));
    println!("Subject: {}", subject_id);
    println!("{}", "=".repeat(60));
    println!(
        "  {} raw stops, {} raw moves",
        profile.raw_stop_count, profile.raw_move_count
    );
    println!("  Places:");
    for p in &profile.places {
        println!(
            "    {:5} ({:.5}, {:.5})  {:>7.0}s over {} visit(s)",
            p.place_type.as_str(),
            p.lat,
            p.lon,
            p.duration_s,
            p.group_size
        );
    }
    println!("  Moves:");
    for m in &profile.moves {
        println!(
            "    {}  {:>6.0}m in {:>5.0}s  [{}]",
            m.start_time.format("%a %H:%M"),
            m.dist_m,
            m.duration_s,
            m.transition
        );
    }
}

#[derive(Debug, Serialize)]
struct PlaceRow<'a> {
    place_type: &'a str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_s: f64,
    lat: f64,
    lon: f64,
    group_size: usize,
    merged_starts: String,
    merged_ends: String,
}

#[derive(Debug, Serialize)]
struct MoveRow<'a> {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    duration_s: f64,
    dist_m: f64,
    origin_lat: f64,
    origin_lon: f64,
    dest_lat: f64,
    dest_lon: f64,
    origin_type: &'a str,
    destination_type: &'a str,
    transition: &'a str,
}

fn write_tables(output: &Path, subject_id: &str, profile: &MobilityProfile, json: bool) -> Result<()> {
    let places_path = output.join(format!("{}_places.csv", subject_id));
    let mut writer = csv::Writer::from_path(&places_path)?;
    for p in &profile.places {
        writer.serialize(place_row(p))?;
    }
    writer.flush()?;

    let moves_path = output.join(format!("{}_moves.csv", subject_id));
    let mut writer = csv::Writer::from_path(&moves_path)?;
    for m in &profile.moves {
        writer.serialize(move_row(m))?;
    }
    writer.flush()?;

    if json {
        let json_path = output.join(format!("{}_profile.json", subject_id));
        fs::write(&json_path, serde_json::to_string_pretty(profile)?)?;
    }

    Ok(())
}

fn place_row(p: &CanonicalPlace) -> PlaceRow<'_> {
    let join = |ts: &[DateTime<Utc>]| {
        ts.iter()
            .map(|t| t.to_rfc3339())
            .collect::<Vec<_>>()
            .join(";")
    };
    PlaceRow {
        place_type: p.place_type.as_str(),
        start_time: p.start_time,
        end_time: p.end_time,
        duration_s: p.duration_s,
        lat: p.lat,
        lon: p.lon,
        group_size: p.group_size,
        merged_starts: join(&p.merged_starts),
        merged_ends: join(&p.merged_ends),
    }
}

fn move_row(m: &TaggedMove) -> MoveRow<'_> {
    MoveRow {
        start_time: m.start_time,
        end_time: m.end_time,
        duration_s: m.duration_s,
        dist_m: m.dist_m,
        origin_lat: m.origin_lat,
        origin_lon: m.origin_lon,
        dest_lat: m.dest_lat,
        dest_lon: m.dest_lon,
        origin_type: m.origin_type.as_str(),
        destination_type: m.destination_type.as_str(),
        transition: &m.transition,
    }
}

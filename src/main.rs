mod catalog;
mod job;
mod predict;
mod track;
mod web;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::Catalog;
use crate::predict::{window_ahead, EphemerisPort, PassPredictor};
use crate::web::Config;

#[derive(Parser)]
#[command(name = "sat-flyby")]
#[command(about = "Satellite pass prediction and track rendering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print upcoming passes over the configured station
    Passes {
        #[arg(long)]
        config: PathBuf,
        /// Elevation threshold in degrees
        #[arg(long)]
        min_elevation: Option<f64>,
        /// Look-ahead window, e.g. "72h" or "3days"
        #[arg(long)]
        window: Option<String>,
        /// Only this catalog satellite
        #[arg(long)]
        satellite: Option<String>,
    },
    /// Check an element-set catalog file
    ValidateCatalog { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config),
        Commands::Passes {
            config,
            min_elevation,
            window,
            satellite,
        } => passes(&config, min_elevation, window.as_deref(), satellite.as_deref()),
        Commands::ValidateCatalog { file } => validate_catalog(&file),
    }
}

fn serve(path: &Path) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error starting runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn passes(
    path: &Path,
    min_elevation: Option<f64>,
    window: Option<&str>,
    satellite: Option<&str>,
) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let window_hours = match window.map(humantime::parse_duration).transpose() {
        Ok(Some(w)) => w.as_secs_f64() / 3600.0,
        Ok(None) => config.predict.default_window_hours,
        Err(e) => {
            eprintln!("Invalid window: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let (start, end) = match window_ahead(chrono::Utc::now(), window_hours) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let min_elevation = min_elevation.unwrap_or(config.predict.default_min_elevation);

    let catalog = match Catalog::load(&config.catalog.path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading catalog: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let observer = match config.station.observer() {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error loading observer: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let offset_hours = match config
        .station
        .time_resolver()
        .and_then(|r| r.offset_hours(&observer))
    {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error resolving local time: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let entries: Vec<_> = match satellite {
        Some(name) => match catalog.get(name) {
            Some(entry) => vec![entry],
            None => {
                eprintln!("No satellite named '{}' in the catalog", name);
                return ExitCode::FAILURE;
            }
        },
        None => catalog.entries().iter().collect(),
    };

    let predictor = PassPredictor::new(config.predict.bearing_resolution);
    let mut all = Vec::new();
    for entry in entries {
        match predictor.predict(
            entry.ephemeris.as_ref(),
            entry.name(),
            Some(entry.ephemeris.norad_id()),
            &observer,
            min_elevation,
            start,
            end,
            offset_hours,
        ) {
            Ok(found) => all.extend(found),
            Err(e) => log::warn!("{}: skipping pass prediction: {}", entry.name(), e),
        }
    }
    all.sort_by_key(|p| p.rise_time);

    println!(
        "{} passes above {:.0}° over {:.4},{:.4}",
        all.len(),
        min_elevation,
        observer.longitude_deg,
        observer.latitude_deg
    );
    for pass in &all {
        println!(
            "  {:<24} {}  {}  {}  max {:>5.1}°  {:>3}s",
            pass.satellite,
            pass.rise_time.format("%H:%M:%S %d-%b-%Y"),
            pass.culminate_time.format("%H:%M:%S"),
            pass.set_time.format("%H:%M:%S"),
            pass.max_elevation_deg,
            pass.duration_seconds
        );
    }
    ExitCode::SUCCESS
}

fn validate_catalog(path: &Path) -> ExitCode {
    match Catalog::load(path) {
        Ok(catalog) => {
            println!("Catalog is valid ({} element sets)", catalog.len());
            for entry in catalog.entries() {
                println!(
                    "  {} (NORAD {}, epoch {})",
                    entry.name(),
                    entry.ephemeris.norad_id(),
                    entry.ephemeris.epoch()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Invalid catalog: {}", e);
            ExitCode::FAILURE
        }
    }
}

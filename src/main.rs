//! Air-Quality Monitoring Service - command line entry point
//!
//! Queries the GIOS air-quality API through the resilient data-access layer
//! and prints the result as JSON, or serves the same data over HTTP.
//!
//! Usage:
//!   aqmon [--config PATH] stations        # all stations, sorted by city and name
//!   aqmon [--config PATH] station ID      # metadata, readings and index of one station
//!   aqmon [--config PATH] readings ID     # sensor readings of one station
//!   aqmon [--config PATH] index ID        # air-quality index of one station
//!   aqmon [--config PATH] overview        # every station with its present measurements
//!   aqmon [--config PATH] serve PORT      # start the HTTP endpoint
//!
//! Environment:
//!   AQMON_BASE_URLS  - comma-separated override of the upstream base URLs
//!   AQMON_LOG_LEVEL  - log level when RUST_LOG is not set (default: info)

use aqmon_service::aggregator::AirQualityService;
use aqmon_service::config::{self, DEFAULT_CONFIG_PATH};
use aqmon_service::endpoint;
use aqmon_service::logging::init_tracing;
use serde::Serialize;
use std::env;
use std::error::Error;
use std::process;
use tracing::info;

enum Command {
    Stations,
    Station(i64),
    Readings(i64),
    Index(i64),
    Overview,
    Serve(u16),
}

fn usage(program: &str) -> String {
    format!(
        "Usage: {} [--config PATH] <stations | station ID | readings ID | index ID | overview | serve PORT>",
        program
    )
}

fn parse_args(args: &[String]) -> Result<(String, Command), String> {
    let program = args.first().map(String::as_str).unwrap_or("aqmon");
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let path = args.get(i + 1).ok_or("Error: --config requires a path")?;
                config_path = path.clone();
                i += 2;
            }
            "-h" | "--help" => return Err(usage(program)),
            other => {
                positional.push(other);
                i += 1;
            }
        }
    }

    let id = |raw: Option<&&str>| -> Result<i64, String> {
        let raw = raw.ok_or_else(|| usage(program))?;
        raw.parse().map_err(|_| format!("Error: invalid station id: {}", raw))
    };

    let command = match positional.first().copied() {
        Some("stations") => Command::Stations,
        Some("station") => Command::Station(id(positional.get(1))?),
        Some("readings") => Command::Readings(id(positional.get(1))?),
        Some("index") => Command::Index(id(positional.get(1))?),
        Some("overview") => Command::Overview,
        Some("serve") => {
            let raw = positional.get(1).ok_or_else(|| usage(program))?;
            Command::Serve(raw.parse().map_err(|_| format!("Error: invalid port: {}", raw))?)
        }
        _ => return Err(usage(program)),
    };

    Ok((config_path, command))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(config_path: &str, command: Command) -> Result<(), Box<dyn Error>> {
    let config = config::load_config_from(config_path)?;
    info!(base_urls = ?config.upstream.base_urls, "configuration loaded");

    let service = AirQualityService::from_config(&config)?;

    match command {
        Command::Stations => print_json(&service.list_stations()?),
        Command::Station(id) => print_json(&service.station_detail(id)?),
        Command::Readings(id) => print_json(&service.station_readings(id)),
        Command::Index(id) => print_json(&service.station_index(id)),
        Command::Overview => print_json(&service.station_overview()?),
        Command::Serve(port) => Ok(endpoint::start_endpoint_server(port, service)?),
    }
}

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let (config_path, command) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        }
    };

    if let Err(e) = run(&config_path, command) {
        eprintln!("❌ {}", e);
        process::exit(1);
    }
}

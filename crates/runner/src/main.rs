use blocks_ports::ErrorStreamWriter;
use blocks_runner::{AdaptiveBlocksPipeline, BlocksConfig, parse_observations};
use blocks_storage::SqliteStore;
use std::path::PathBuf;
use std::sync::Arc;

fn print_help() {
    eprintln!(
        r#"Adaptive Blocks Runner - error-driven block segmentation and parameter resolution

USAGE:
    blocks-runner [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --database <PATH>   SQLite database (overrides pipeline.database)
    --import <PATH>     Append error observations from a JSON array before the cycle
    --formula <ID>      Formula to resolve (repeatable, overrides pipeline.formulas)
    --report            Print the comprehensive report after the cycle
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # One cycle against an existing database
    blocks-runner --database blocks.db

    # Resolve a single formula and print the report
    blocks-runner --database blocks.db --formula balanced --report
"#
    );
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("Error: {} requires an argument", flag);
        std::process::exit(1);
    }
    args[*i].clone()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;
    let mut database: Option<PathBuf> = None;
    let mut import: Option<String> = None;
    let mut formulas: Vec<String> = Vec::new();
    let mut with_report = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => config_path = Some(next_value(&args, &mut i, "--config")),
            "--database" | "-d" => {
                database = Some(PathBuf::from(next_value(&args, &mut i, "--database")))
            }
            "--import" => import = Some(next_value(&args, &mut i, "--import")),
            "--formula" | "-f" => formulas.push(next_value(&args, &mut i, "--formula")),
            "--report" => with_report = true,
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut config = match config_path {
        Some(path) => {
            log::info!("Loading configuration from: {}", path);
            BlocksConfig::from_file(&path)?
        }
        None => BlocksConfig::default(),
    };
    if database.is_some() {
        config.pipeline.database = database;
    }
    if !formulas.is_empty() {
        config.pipeline.formulas = formulas;
    }

    let store = Arc::new(match &config.pipeline.database {
        Some(path) => {
            log::info!("Opening database: {}", path.display());
            SqliteStore::open(path)?
        }
        None => {
            log::info!("No database configured, using in-memory storage");
            SqliteStore::open_in_memory()?
        }
    });

    if let Some(path) = import {
        let content = std::fs::read_to_string(&path)?;
        let observations = parse_observations(&content)?;
        let appended = store.append_errors(&observations)?;
        log::info!("Imported {} observations from {}", appended, path);
    }

    let pipeline = AdaptiveBlocksPipeline::new(store.clone(), store.clone(), store, &config);
    let cycle = pipeline.run_cycle()?;
    println!("{}", serde_json::to_string_pretty(&cycle)?);

    if with_report {
        let report = pipeline.comprehensive_report()?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

//! cnsql command-line runner
//!
//! Seeds the demo graph in memory and runs a query, a contradiction scan or
//! a neighborhood lookup against it, printing JSON to stdout.

use std::io;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use cnsql::demo::{seed_demo, DEMO_QUERY};
use cnsql::{graph_neighborhood, CoreConfig, EndBoundary, InMemoryGraph, QueryEngine};

const DEFAULT_LIMIT: usize = 100;

enum Mode {
    Query(String),
    Contradictions { limit: usize },
    Neighborhood { label: String, hops: usize },
}

struct Args {
    inclusive_end: bool,
    mode: Mode,
}

fn print_help() {
    println!("cnsql - point-in-time fact resolution over the demo graph");
    println!();
    println!("USAGE:");
    println!("    cnsql [OPTIONS] [QUERY]");
    println!();
    println!("OPTIONS:");
    println!("        --inclusive-end          Treat valid_to as inclusive for ASOF");
    println!("        --contradictions         Report contradictions instead of querying");
    println!("        --limit <N>              Contradiction limit [default: 100]");
    println!("        --neighborhood <LABEL>   Print the graph neighborhood of LABEL");
    println!("        --hops <N>               Neighborhood hops [default: 1]");
    println!("    -h, --help                   Print help information");
    println!();
    println!("Logging is controlled by RUST_LOG [default: warn].");
}

fn value_of(args: &[String], i: usize, flag: &str) -> String {
    args.get(i + 1).cloned().unwrap_or_else(|| {
        eprintln!("error: {flag} requires a value");
        std::process::exit(1);
    })
}

fn number_of(args: &[String], i: usize, flag: &str) -> usize {
    let raw = value_of(args, i, flag);
    raw.parse().unwrap_or_else(|_| {
        eprintln!("error: invalid value for {flag}: {raw}");
        std::process::exit(1);
    })
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    let mut inclusive_end = false;
    let mut contradictions = false;
    let mut limit = DEFAULT_LIMIT;
    let mut neighborhood: Option<String> = None;
    let mut hops = 1;
    let mut words: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--inclusive-end" => {
                inclusive_end = true;
                i += 1;
            }
            "--contradictions" => {
                contradictions = true;
                i += 1;
            }
            "--limit" => {
                limit = number_of(&args, i, "--limit");
                i += 2;
            }
            "--neighborhood" => {
                neighborhood = Some(value_of(&args, i, "--neighborhood"));
                i += 2;
            }
            "--hops" => {
                hops = number_of(&args, i, "--hops");
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if arg.starts_with("--") => {
                eprintln!("error: unknown argument: {arg}");
                std::process::exit(1);
            }
            word => {
                words.push(word.to_string());
                i += 1;
            }
        }
    }

    let mode = if contradictions {
        Mode::Contradictions { limit }
    } else if let Some(label) = neighborhood {
        Mode::Neighborhood { label, hops }
    } else if words.is_empty() {
        Mode::Query(DEMO_QUERY.to_string())
    } else {
        Mode::Query(words.join(" "))
    };
    Args { inclusive_end, mode }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = CoreConfig::from_env()?;
    if args.inclusive_end {
        config = config.with_end_boundary(EndBoundary::Inclusive);
    }
    tracing::info!(end_boundary = %config.end_boundary, "starting cnsql");

    let graph = Arc::new(InMemoryGraph::new());
    seed_demo(&graph)?;
    let engine = QueryEngine::with_config(graph, config);

    let output = match args.mode {
        Mode::Query(text) => {
            tracing::info!(query = %text, "running query");
            serde_json::to_string_pretty(&engine.cql(&text)?)?
        }
        Mode::Contradictions { limit } => {
            serde_json::to_string_pretty(&engine.detector().detect_all(limit)?)?
        }
        Mode::Neighborhood { label, hops } => serde_json::to_string_pretty(&graph_neighborhood(
            engine.store(),
            &label,
            hops,
            DEFAULT_LIMIT,
        )?)?,
    };
    println!("{output}");
    Ok(())
}

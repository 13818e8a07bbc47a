use clap::Parser;
use grayscatter_cli::{cmd_convert, parse_process_count};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grayscatter")]
#[command(version, about = "Distributed color to grayscale converter", long_about = None)]
struct Cli {
    /// Input image (PNG or JPEG)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output image path
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Output format: 1 = PNG, 2 = JPEG (quality 100)
    #[arg(value_name = "FORMAT_CODE")]
    format_code: String,

    /// Number of in-process ranks (default: config, else available cores)
    #[arg(short = 'n', long, value_name = "N", value_parser = parse_process_count)]
    processes: Option<usize>,

    /// Communicator backend: "local" (default) or "mpi"
    #[arg(long, value_name = "BACKEND", default_value = "local")]
    backend: String,

    /// Trailing pixels that do not divide evenly: "drop" (default) or "root"
    #[arg(long, value_name = "POLICY")]
    remainder: Option<String>,

    /// Config file, must exist (default: search GRAYSCATTER_CONFIG, ./config, ., ~/grayscatter)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write a JSON run report
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Show run configuration and debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress progress output
    #[arg(long)]
    silent: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let result = cmd_convert(
        cli.input,
        cli.output,
        cli.format_code,
        cli.processes,
        cli.backend,
        cli.remainder,
        cli.config,
        cli.report,
        cli.verbose,
        cli.silent,
    );

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

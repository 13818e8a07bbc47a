use std::fs;
use std::path::{Path, PathBuf};

use grayscatter_core::config;
use grayscatter_core::pipeline::{Job, PipelineOptions, RunReport};
use grayscatter_core::RemainderPolicy;

use crate::launch::{launch, resolve_process_count, LaunchPlan};
use crate::parsers::{parse_backend, parse_format_code, parse_remainder_policy};

/// Execute the convert command.
///
/// Argument errors are detected here, before any rank starts, so every
/// process of an MPI launch rejects them independently.
///
/// # Returns
/// Returns `Ok(())` on success, or an error message describing the failure.
#[allow(clippy::too_many_arguments)]
pub fn cmd_convert(
    input: PathBuf,
    output: PathBuf,
    format_code: String,
    processes: Option<usize>,
    backend: String,
    remainder: Option<String>,
    config_path: Option<PathBuf>,
    report_path: Option<PathBuf>,
    verbose: bool,
    silent: bool,
) -> Result<(), String> {
    let format = parse_format_code(&format_code)?;
    let backend = parse_backend(&backend)?;
    if processes == Some(0) {
        return Err("Process count must be at least 1".to_string());
    }

    // a file named on the command line must load; searched locations may not exist
    let handle = match config_path.as_deref() {
        Some(path) => config::load_config_file(path).map_err(|e| e.to_string())?,
        None => config::load_config(None),
    };
    handle.log_usage();
    let defaults = &handle.config.defaults;

    let remainder = match remainder {
        Some(policy) => parse_remainder_policy(&policy)?,
        None => defaults.remainder,
    };
    let silent = silent || defaults.silent;
    let plan = LaunchPlan {
        backend,
        processes: resolve_process_count(processes, defaults.processes),
        timeout: defaults.collective_timeout(),
    };

    if verbose {
        println!("Run config:");
        if let Some(source) = &handle.source {
            println!("  source: {}", source.display());
        }
        println!("  format: {}", format);
        println!("  backend: {:?}", plan.backend);
        println!("  processes: {}", plan.processes);
        println!("  remainder: {}", remainder);
        match plan.timeout {
            Some(timeout) => println!("  collective_timeout: {:?}", timeout),
            None => println!("  collective_timeout: none"),
        }
    }

    let job = Job {
        input,
        output,
        format,
    };
    let options = PipelineOptions { remainder, silent };

    let report = launch(&plan, &job, &options).map_err(|e| e.to_string())?;

    // only the coordinator has a report
    let Some(report) = report else {
        return Ok(());
    };

    if let Some(path) = report_path {
        write_report(&report, &path)?;
    }

    if !silent {
        if let Some(skew) = &report.skew {
            if report.remainder_policy == RemainderPolicy::Drop {
                println!(
                    "Warning: {} trailing pixel(s) were not converted and are black (use --remainder root)",
                    skew.remainder_pixels
                );
            }
        }
        println!(
            "Converted {} -> {} on {} process(es) in {:.2}s",
            report.input.display(),
            report.output.display(),
            report.process_count,
            report.elapsed_secs
        );
    }

    Ok(())
}

/// Write the run report as pretty JSON.
pub fn write_report(report: &RunReport, path: &Path) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| format!("Failed to serialize run report: {}", e))?;
    fs::write(path, json)
        .map_err(|e| format!("Failed to write run report {}: {}", path.display(), e))
}

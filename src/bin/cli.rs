// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polymold CLI

use anyhow::{Context, Result};
use clap::Parser;
use polymold::cli::Reporter;
use polymold::{CsgKernel, MoldConfig, MoldPipeline, SpoutVariant, StlFormat, WatertightPolicy};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "polymold")]
#[command(
    about = "Create a two-part casting mold with alignment keys and a pour spout from a watertight STL",
    long_about = None
)]
struct Cli {
    /// Input STL file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Directory the mold halves are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Config file (defaults to polymold.toml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Clearance between the object and the outside of the mold
    #[arg(short, long)]
    wall_thickness: Option<f64>,

    /// Facets around keys and spout
    #[arg(long)]
    segments: Option<u32>,

    /// Spout placement (simple, validated)
    #[arg(long, value_name = "VARIANT")]
    spout: Option<SpoutVariant>,

    /// Fill holes in a non-watertight input instead of rejecting it
    #[arg(long)]
    repair: bool,

    /// Write ASCII STL instead of binary
    #[arg(long)]
    ascii: bool,

    /// Write a JSON summary of the run
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Save the effective settings (file, environment and flags) as TOML
    #[arg(long, value_name = "FILE")]
    write_config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    if !cli.input.exists() {
        Reporter::report_error(&format!("Input file '{}' does not exist.", cli.input.display()));
        std::process::exit(1);
    }

    let config = build_config(&cli)?;
    if let Some(path) = &cli.write_config {
        config.save(path)?;
        Reporter::report_info(&format!("settings written to {}", path.display()));
    }
    if cli.verbose {
        Reporter::report_info(&format!(
            "wall {} mm, {} spout, {} segments",
            config.wall_thickness,
            match config.spout_variant {
                SpoutVariant::Simple => "simple",
                SpoutVariant::Validated => "validated",
            },
            config.segments
        ));
    }

    let format = if cli.ascii { StlFormat::Ascii } else { StlFormat::Binary };
    let kernel = CsgKernel::new(config.segments).with_format(format);
    let pipeline = MoldPipeline::new(kernel, config)?;

    let report = match pipeline.run_file(&cli.input, &cli.output_dir) {
        Ok(report) => report,
        Err(err) => {
            Reporter::report_error(&format!("failed to mold {}: {}", cli.input.display(), err));
            std::process::exit(1);
        }
    };

    if report.repaired {
        Reporter::report_warning("input mesh had holes and was repaired before molding");
    }
    if report.keys_in_cavity > 0 {
        Reporter::report_warning(&format!(
            "{} of {} keys stand in the cavity and will not align the halves; try a thinner wall",
            report.keys_in_cavity,
            report.keys.centers.len()
        ));
    }
    Reporter::report_mold(&report);

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    }

    Reporter::success(&format!(
        "Mold halves saved as '{}' and '{}'.",
        report.outputs.top.display(),
        report.outputs.bottom.display()
    ));
    Ok(())
}

/// Layer CLI flags over the config file and environment
fn build_config(cli: &Cli) -> Result<MoldConfig> {
    let mut config = MoldConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(wall_thickness) = cli.wall_thickness {
        config.wall_thickness = wall_thickness;
    }
    if let Some(segments) = cli.segments {
        config.segments = segments;
    }
    if let Some(variant) = cli.spout {
        config.spout_variant = variant;
    }
    if cli.repair {
        config.watertight_policy = WatertightPolicy::Repair;
    }
    Ok(config)
}

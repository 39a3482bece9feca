mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

use tracecheck_core::{
    get_config_path, render_traceability_report, render_validation_report, traceability_json,
    validation_json, ExtractionMode, ProjectConfig, SpecDirectory, TraceabilityValidator,
    Validator,
};

use crate::cli::{Cli, Command};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logger(&cli);

    if !cli.path.is_dir() {
        anyhow::bail!("Specification directory not found: {}", cli.path.display());
    }

    let mut config = ProjectConfig::load_for(&cli.path)
        .with_context(|| format!("Failed to load config for {}", cli.path.display()))?;
    let spec_dir = SpecDirectory::new(&cli.path);

    let passed = match &cli.command {
        Command::Validate {
            json,
            mode,
            blueprint,
            requirements,
            tasks,
        } => {
            override_name(&mut config.files.blueprint, blueprint);
            override_name(&mut config.files.requirements, requirements);
            override_name(&mut config.files.tasks, tasks);
            if let Some(mode) = mode {
                config.validate_mode = parse_mode(mode)?;
            }
            run_validate(spec_dir, &config, *json)?
        }
        Command::Trace {
            json,
            mode,
            requirements,
            tasks,
            research,
            max_claims,
        } => {
            override_name(&mut config.files.requirements, requirements);
            override_name(&mut config.files.tasks, tasks);
            override_name(&mut config.files.research, research);
            if let Some(mode) = mode {
                config.trace_mode = parse_mode(mode)?;
            }
            if let Some(max) = max_claims {
                config.max_listed_claims = *max;
            }
            run_trace(spec_dir, &config, *json)?
        }
        Command::InitConfig => {
            init_config(&cli)?;
            true
        }
    };

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_logger(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn override_name(slot: &mut String, value: &Option<String>) {
    if let Some(name) = value {
        *slot = name.clone();
    }
}

fn parse_mode(mode: &str) -> Result<ExtractionMode> {
    mode.parse::<ExtractionMode>()
        .with_context(|| format!("Invalid --mode value: {}", mode))
}

fn run_validate(spec_dir: SpecDirectory, config: &ProjectConfig, json: bool) -> Result<bool> {
    let report = Validator::new(spec_dir, config).validate();

    if json {
        println!("{}", validation_json(&report)?);
    } else {
        print_report(&render_validation_report(&report));
    }

    Ok(report.is_valid())
}

fn run_trace(spec_dir: SpecDirectory, config: &ProjectConfig, json: bool) -> Result<bool> {
    let report = TraceabilityValidator::new(spec_dir, config)
        .run()
        .context("Traceability validation aborted")?;

    if json {
        println!("{}", traceability_json(&report)?);
    } else {
        print_report(&render_traceability_report(&report, config.max_listed_claims));
    }

    Ok(report.verdict().is_pass())
}

fn init_config(cli: &Cli) -> Result<()> {
    let path = get_config_path(&cli.path);
    ProjectConfig::create_default(&path)?;
    println!("{}", "Config file created!".green());
    println!("Path: {}", path.display());
    Ok(())
}

/// Print a rendered report, colouring the pass/fail banners
fn print_report(text: &str) {
    for line in text.lines() {
        if line.starts_with("✅") || line.starts_with("[PASS]") {
            println!("{}", line.green().bold());
        } else if line.starts_with("❌") || line.starts_with("[FAIL]") {
            println!("{}", line.red().bold());
        } else {
            println!("{}", line);
        }
    }
}

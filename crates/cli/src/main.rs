#![deny(unsafe_code)]
//! CLI binary for driftfield.
//!
//! Subcommands:
//! - `render`: run the field headlessly for N frames, write a PNG
//! - `config`: print the default configuration and its schema

mod error;

use clap::{Parser, Subcommand};
use driftfield_core::FieldConfig;
use driftfield_headless::run::{RunOutcome, RunSpec};
use error::CliError;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "driftfield", about = "Ambient particle field renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the field for N frames on a headless surface and write a PNG.
    Render {
        /// Container width in CSS pixels.
        #[arg(short = 'W', long, default_value_t = 800.0)]
        width: f64,

        /// Container height in CSS pixels.
        #[arg(short = 'H', long, default_value_t = 600.0)]
        height: f64,

        /// Device pixel ratio (clamped by `max_ratio`).
        #[arg(short, long, default_value_t = 1.0)]
        ratio: f64,

        /// Number of frames to run.
        #[arg(short, long, default_value_t = 600)]
        frames: usize,

        /// Simulated display refresh rate.
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output file path.
        #[arg(short, long, default_value = "field.png")]
        output: PathBuf,

        /// Config overrides as a JSON object.
        #[arg(long, default_value = "{}")]
        config: String,

        /// Read the whole run (size, seed, frames, config, events) from a JSON file.
        /// Overrides the other run arguments.
        #[arg(long)]
        spec: Option<PathBuf>,

        /// Also write the effective run spec to this path.
        #[arg(long)]
        emit_spec: Option<PathBuf>,
    },
    /// Print the default configuration and the schema of every key.
    Config,
}

fn read_spec(path: &Path) -> Result<RunSpec, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid run spec {}: {e}", path.display())))
}

fn write_spec(spec: &RunSpec, path: &Path) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(spec)?;
    std::fs::write(path, text)
        .map_err(|e| CliError::Io(format!("cannot write {}: {e}", path.display())))
}

fn report(cli_json: bool, spec: &RunSpec, outcome: &RunOutcome, output: &Path) -> Result<(), CliError> {
    let surface = outcome.field.surface();
    let (bw, bh) = surface.map_or((0, 0), |d| (d.backing_width(), d.backing_height()));
    if cli_json {
        let info = serde_json::json!({
            "width": spec.width,
            "height": spec.height,
            "backing_width": bw,
            "backing_height": bh,
            "frames": spec.frames,
            "frames_rendered": outcome.frames_rendered,
            "seed": spec.seed,
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {bw}x{bh} ({} of {} frames painted, seed {}) -> {}",
            outcome.frames_rendered,
            spec.frames,
            spec.seed,
            output.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Config => {
            let defaults = FieldConfig::default().to_json();
            let schema = FieldConfig::param_schema();
            if cli.json {
                let info = serde_json::json!({ "defaults": defaults, "schema": schema });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Defaults:");
                println!("{}", serde_json::to_string_pretty(&defaults)?);
                println!("Keys:");
                if let Some(keys) = schema.as_object() {
                    for (name, entry) in keys {
                        let about = entry["description"].as_str().unwrap_or("");
                        println!("  {name:<16} {about}");
                    }
                }
            }
        }
        Command::Render {
            width,
            height,
            ratio,
            frames,
            fps,
            seed,
            output,
            config,
            spec,
            emit_spec,
        } => {
            let spec = match spec {
                Some(path) => read_spec(&path)?,
                None => {
                    let config: serde_json::Value = serde_json::from_str(&config)
                        .map_err(|e| CliError::Input(format!("invalid --config JSON: {e}")))?;
                    RunSpec {
                        device_ratio: ratio,
                        fps,
                        config,
                        ..RunSpec::new(width, height, seed, frames)
                    }
                }
            };
            log::debug!("run spec: {spec:?}");

            let outcome = spec.execute()?;
            let raster = outcome
                .field
                .host()
                .raster()
                .ok_or_else(|| CliError::Field(driftfield_core::FieldError::InvalidDimensions))?;
            driftfield_headless::snapshot::write_png(raster, &output)?;

            if let Some(path) = emit_spec {
                write_spec(&spec, &path)?;
            }
            report(cli.json, &spec, &outcome, &output)?;
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        log::debug!("exiting with {e:?}");
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use dispatcher::GpuPowerPreference;

#[derive(Parser, Debug)]
#[command(
    name = "bubbleshade",
    author,
    version,
    about = "Headless compute-shader demos",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Inputs shared by `run` (the default) and `plan`.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Demo configuration TOML file.
    #[arg(long, value_name = "FILE", conflicts_with = "preset", global = true)]
    pub config: Option<PathBuf>,

    /// Built-in demo: `assign-texture`, `split-screen`, `simple`, or `bubbles`.
    #[arg(long, value_name = "NAME", global = true)]
    pub preset: Option<String>,

    /// Seed for bubble generation (overrides the config).
    #[arg(long, value_name = "SEED", global = true)]
    pub seed: Option<u64>,

    /// Number of update frames to run after the initial dispatch.
    #[arg(long, value_name = "N", global = true)]
    pub frames: Option<u32>,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Simulated time between frames (e.g. `16ms`).
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub frame_interval: Option<Duration>,

    /// Write the final render target to this PNG path.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// GPU adapter preference: `low` or `high`.
    #[arg(
        long,
        value_name = "MODE",
        value_parser = parse_power,
        default_value = "low"
    )]
    pub power: GpuPowerPreference,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the backend calls a run would make, as JSON, without a GPU.
    Plan,
    /// List the available kernels and their thread group sizes.
    Kernels,
    /// Generate a bubble set and dump it.
    Bubbles(BubblesArgs),
}

#[derive(Args, Debug)]
pub struct BubblesArgs {
    /// Number of bubbles to generate.
    #[arg(long, default_value_t = 8)]
    pub count: usize,

    /// Position bounds as `WIDTHxHEIGHT`.
    #[arg(long, value_name = "WIDTHxHEIGHT", default_value = "256x256", value_parser = parse_bounds)]
    pub bounds: (f32, f32),

    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Write raw 20-byte records here instead of printing JSON.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" | "integrated" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" | "discrete" => Ok(GpuPowerPreference::High),
        other => Err(format!("unknown power preference '{other}' (expected low or high)")),
    }
}

pub fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value.trim())
        .map_err(|err| format!("invalid duration '{value}': {err}"))
}

pub fn parse_bounds(value: &str) -> Result<(f32, f32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("invalid bounds '{trimmed}'; expected WIDTHxHEIGHT"))?;
    let parse_axis = |raw: &str| {
        raw.trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| format!("invalid bounds '{trimmed}'; axes must be positive numbers"))
    };
    Ok((parse_axis(width)?, parse_axis(height)?))
}

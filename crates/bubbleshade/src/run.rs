use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use democonfig::DemoConfig;
use dispatcher::{BackendCall, Dispatcher, GpuBackend, RecordingBackend, UniformValue};
use serde::Serialize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use crate::bindings::{self, FramePlan};
use crate::cli::{RunArgs, SourceArgs};
use crate::paths::AppPaths;

const FALLBACK_PRESET: &str = "bubbles";

/// Where the active configuration came from, for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    Preset(String),
}

impl std::fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigOrigin::File(path) => write!(f, "{}", path.display()),
            ConfigOrigin::Preset(name) => write!(f, "preset:{name}"),
        }
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Stdout carries `plan` and `bubbles` output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn load_config(source: &SourceArgs) -> Result<(DemoConfig, ConfigOrigin)> {
    if let Some(path) = &source.config {
        return Ok((read_config(path)?, ConfigOrigin::File(path.clone())));
    }
    if let Some(name) = &source.preset {
        let config = DemoConfig::preset(name)?;
        return Ok((config, ConfigOrigin::Preset(name.clone())));
    }

    let paths = AppPaths::discover()?;
    if let Some(path) = paths.user_config() {
        return Ok((read_config(&path)?, ConfigOrigin::File(path)));
    }
    tracing::debug!(
        config_dir = %paths.config_dir().display(),
        "no demo.toml found; using built-in preset"
    );
    Ok((
        DemoConfig::preset(FALLBACK_PRESET)?,
        ConfigOrigin::Preset(FALLBACK_PRESET.to_string()),
    ))
}

fn read_config(path: &Path) -> Result<DemoConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    DemoConfig::from_toml_str(&text)
        .with_context(|| format!("failed to load config {}", path.display()))
}

pub fn run(args: RunArgs) -> Result<()> {
    let (config, origin) = load_config(&args.source)?;
    tracing::info!(%origin, "loaded demo configuration");

    let settings = bindings::dispatcher_settings(&config, args.source.seed);
    let frames = FramePlan::resolve(&config.animation, args.source.frames, args.frame_interval);
    let backend = GpuBackend::new(bindings::gpu_config(&config, args.power))?;
    let profile = backend.adapter_profile();
    if profile.is_software() {
        tracing::warn!(adapter = %profile.name, "running on a software adapter");
    }

    let mut dispatcher = Dispatcher::new(backend, settings);
    dispatcher
        .start()
        .context("failed to initialise compute kernels")?;

    let mut updated = 0u32;
    for (time, delta_time) in frames.clock() {
        if dispatcher.update(time, delta_time)? {
            updated += 1;
        }
    }
    tracing::info!(
        frames = updated,
        dispatches = dispatcher.backend().dispatch_count(),
        bubbles = dispatcher.bubbles().len(),
        "demo finished"
    );

    if let Some(output) = &args.output {
        let image = dispatcher.backend().read_target()?;
        image
            .save(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        tracing::info!(path = %output.display(), "render target exported");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct PlanReport {
    config: String,
    texture_resolution: u32,
    bubbles: usize,
    calls: Vec<Value>,
}

/// Drives a [`RecordingBackend`] through the same lifecycle as `run` and
/// prints the resulting call log.
pub fn plan(source: &SourceArgs) -> Result<()> {
    let (config, origin) = load_config(source)?;
    let settings = bindings::dispatcher_settings(&config, source.seed);
    let frames = FramePlan::resolve(&config.animation, source.frames, None);

    let mut dispatcher =
        Dispatcher::new(RecordingBackend::new(config.texture_resolution), settings);
    dispatcher
        .start()
        .context("failed to initialise compute kernels")?;
    for (time, delta_time) in frames.clock() {
        dispatcher.update(time, delta_time)?;
    }

    let report = PlanReport {
        config: origin.to_string(),
        texture_resolution: config.texture_resolution,
        bubbles: dispatcher.bubbles().len(),
        calls: dispatcher
            .backend()
            .calls()
            .iter()
            .map(call_to_json)
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn call_to_json(call: &BackendCall) -> Value {
    match call {
        BackendCall::FindKernel { name } => json!({ "call": "find_kernel", "name": name }),
        BackendCall::SetTexture { kernel, name } => json!({
            "call": "set_texture",
            "kernel": kernel.to_string(),
            "name": name,
        }),
        BackendCall::SetUniform { name, value } => {
            let (call, value) = match value {
                UniformValue::Int(v) => ("set_int", json!(v)),
                UniformValue::Float(v) => ("set_float", json!(v)),
                UniformValue::Vector(v) => ("set_vector", json!(v)),
            };
            json!({ "call": call, "name": name, "value": value })
        }
        BackendCall::SetBuffer { kernel, name, len } => json!({
            "call": "set_buffer",
            "kernel": kernel.to_string(),
            "name": name,
            "bytes": len,
        }),
        BackendCall::Dispatch { kernel, groups } => json!({
            "call": "dispatch",
            "kernel": kernel.to_string(),
            "groups": groups,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dispatcher::KernelName;

    #[test]
    fn dispatch_calls_serialise_groups() {
        let value = call_to_json(&BackendCall::Dispatch {
            kernel: KernelName::MovingBubbles,
            groups: [4, 1, 1],
        });
        assert_eq!(value["call"], "dispatch");
        assert_eq!(value["kernel"], "MovingBubbles");
        assert_eq!(value["groups"], json!([4, 1, 1]));
    }

    #[test]
    fn uniform_calls_name_their_setter() {
        let value = call_to_json(&BackendCall::SetUniform {
            name: "TextureResolution".into(),
            value: UniformValue::Int(256),
        });
        assert_eq!(value["call"], "set_int");
        assert_eq!(value["value"], 256);
    }

    #[test]
    fn explicit_preset_wins_over_discovery() {
        let source = SourceArgs {
            config: None,
            preset: Some("split-screen".into()),
            seed: None,
            frames: None,
        };
        let (config, origin) = load_config(&source).unwrap();
        assert_eq!(origin, ConfigOrigin::Preset("split-screen".into()));
        assert_eq!(config.passes[0].kernel, "SplitScreen");
    }
}

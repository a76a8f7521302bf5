mod bindings;
mod cli;
mod paths;
mod run;

use std::fs;

use anyhow::{Context, Result};
use cli::{BubblesArgs, Command};
use dispatcher::KernelName;
use serde_json::json;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Plan) => run::plan(&cli.run.source),
        Some(Command::Kernels) => {
            list_kernels();
            Ok(())
        }
        Some(Command::Bubbles(args)) => dump_bubbles(args),
        None => run::run(cli.run),
    }
}

fn list_kernels() {
    for kernel in KernelName::ALL {
        let [x, y, z] = kernel.thread_group_size();
        let reads = if kernel.reads_bubbles() {
            "  (reads BubblesBuffer)"
        } else {
            ""
        };
        println!("{kernel:<14} {x}x{y}x{z}{reads}");
    }
}

fn dump_bubbles(args: BubblesArgs) -> Result<()> {
    let (width, height) = args.bounds;
    let generated = bubbles::create_seeded(args.count, width, height, args.seed);

    if let Some(path) = &args.output {
        fs::write(path, bubbles::encode(&generated))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            count = generated.len(),
            bytes = generated.len() * bubbles::BUBBLE_STRIDE,
            "bubble records written"
        );
        return Ok(());
    }

    let records: Vec<_> = generated
        .iter()
        .map(|bubble| {
            json!({
                "position": bubble.position,
                "velocity": bubble.velocity,
                "radius": bubble.radius,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

use aidcore::config::ServiceConfig;
use aidcore::guidance::AccuracyClassification;
use aidcore::prelude::ProcedureMode;
use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::{gui_bind_address, GuiBridge};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::context::AppContext;
use workflow::runner::{Runner, WorkflowResult};

mod devices;
mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline driver for the first-aid guidance core")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// cpr, pulse, airway or seizure
    #[arg(long, default_value = "cpr")]
    mode: ProcedureMode,
    #[arg(long, default_value_t = 5)]
    rounds: usize,
    /// JPEG sent for every round instead of the synthetic frame
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value_t = 110)]
    bpm: u32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Append a one-line summary of the run to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Serve the overlay state over HTTP and keep running until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Suppress device console output
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn summarize(config: &WorkflowConfig, result: &WorkflowResult) -> String {
    let correct = result
        .rounds
        .iter()
        .filter(|r| r.classification == Some(AccuracyClassification::Correct))
        .count();
    format!(
        "mode={} rounds={} processed={} fallbacks={} errors={} correct_rounds={} placement_haptics={} beats={}\n",
        config.mode,
        result.rounds.len(),
        result.metrics.processed,
        result.metrics.fallbacks,
        result.metrics.errors,
        correct,
        result.placement_haptics,
        result.beats
    )
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut workflow_config = if let Some(path) = args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(args.mode, args.rounds, args.bpm, args.seed)
    };
    if args.image.is_some() {
        workflow_config.image = args.image;
    }

    let services = ServiceConfig::from_env();
    if !services.has_api_key() {
        println!("No AID_API_KEY set; guidance will come from the offline tables.");
    }

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating workflow runtime")?;

    let quiet = args.quiet;
    let bridge = Arc::new(GuiBridge::new());
    if args.serve {
        bridge.serve(gui_bind_address());
        bridge.publish_status(&format!(
            "overlay bridge on http://{}/overlay",
            gui_bind_address()
        ));
    }

    let result = runtime.block_on(async {
        let context = AppContext::new(services, &workflow_config, quiet)?;
        let runner = Runner::new(workflow_config.clone(), Arc::new(context), bridge.clone());
        runner.execute().await
    })?;

    for round in &result.rounds {
        println!(
            "round {} -> {} [{}]{}",
            round.round,
            round.guidance,
            round.status_code.as_deref().unwrap_or("no target"),
            round
                .recommended_site
                .map(|site| format!(" recommended {}", site))
                .unwrap_or_default()
        );
    }
    let report = summarize(&workflow_config, &result);
    print!("{}", report);

    if let Some(report_path) = args.report {
        if let Some(parent) = report_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&report_path)
            .with_context(|| format!("opening report {}", report_path.display()))?;
        file.write_all(report.as_bytes())?;
    }

    if args.serve {
        bridge.publish_status("HTTP bridge running (Ctrl+C to stop)...");
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}

use anyhow::{Context as _, Result, bail};
use colored::Colorize;
use lifecycle::{ApplyReport, ComponentId, Error, Reconciler, Requirements};
use serde::Serialize;

use crate::Context;
use crate::cli::ApplyArgs;
use crate::commands;
use crate::simulator::SimulatedHost;
use crate::ui;

#[derive(Serialize)]
struct ApplyOutput<'a> {
    report: &'a ApplyReport,
    attempts: usize,
    actions: usize,
    running: Vec<&'a ComponentId>,
    quarantined: Vec<&'a ComponentId>,
}

pub fn run(ctx: &Context, args: ApplyArgs) -> Result<()> {
    let scenario = commands::load(ctx)?;
    let requirements = Requirements::new(scenario.aggregator()?);
    let host = SimulatedHost::new(scenario.triggers.clone())
        .failing(args.fail.iter().map(ComponentId::new))
        .echo(!args.json && !ctx.quiet);
    let reconciler = Reconciler::new(requirements, host).with_options(scenario.solver);

    if !args.json && !ctx.quiet {
        ui::header("Applying");
    }

    // Each failure quarantines one component, so retries are bounded
    let max_attempts = if args.retry {
        scenario.components.len() + 1
    } else {
        1
    };

    let mut attempts = 0;
    let report = loop {
        attempts += 1;
        match reconciler.apply(args.stop_eager_running) {
            Ok(report) => break report,
            Err(Error::ExecutionFailed { culprit, message }) if attempts < max_attempts => {
                if !args.json {
                    ui::warn(&format!("{culprit} failed ({message}), retrying"));
                }
            }
            Err(Error::Impossible) => {
                bail!("No feasible plan: hard constraints conflict, nothing was changed")
            }
            Err(e) => return Err(e).context("Apply failed"),
        }
    };

    let actions = reconciler.with_host(|host| host.actions().len());
    reconciler.requirements().read(|state| {
        let output = ApplyOutput {
            report: &report,
            attempts,
            actions,
            running: state.running().iter().collect(),
            quarantined: state.quarantined().keys().collect(),
        };
        print_output(&output, args.json)
    })
}

fn print_output(output: &ApplyOutput<'_>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    let report = output.report;
    if report.passes == 0 {
        ui::success("Already up to date");
        return Ok(());
    }

    println!();
    ui::success(&format!(
        "Converged in {} pass(es): {} started, {} stopped, {} excluded",
        report.passes,
        report.started.to_string().green(),
        report.stopped.to_string().yellow(),
        report.excluded.to_string().red()
    ));
    if output.attempts > 1 {
        ui::kv("Attempts", &output.attempts.to_string());
    }
    ui::kv("Host actions", &output.actions.to_string());
    ui::kv("Cost", &report.cost.to_string());
    ui::kv("Running", &ui::list(&output.running));
    if !output.quarantined.is_empty() {
        ui::kv("Quarantined", &ui::list(&output.quarantined));
    }
    Ok(())
}

use anyhow::{Context as _, Result};
use colored::Colorize;
use lifecycle::{ExecutionPlan, solve};

use crate::Context;
use crate::cli::PlanArgs;
use crate::commands;
use crate::ui;

pub fn run(ctx: &Context, args: PlanArgs) -> Result<()> {
    let scenario = commands::load(ctx)?;
    let snapshot = scenario.aggregator()?.snapshot();
    let plan = solve(&snapshot, args.stop_eager_running, &scenario.solver)
        .context("Solver refused the scenario")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    render(&plan, ctx.quiet);
    if ctx.verbose > 0 {
        ui::kv("Running before", &ui::list(snapshot.running()));
    }
    Ok(())
}

/// Print a plan as one line per action
pub fn render(plan: &ExecutionPlan, quiet: bool) {
    let Some(steps) = plan.steps() else {
        ui::error("No feasible plan: hard constraints conflict");
        return;
    };

    if !quiet {
        ui::header("Execution Plan");
    }

    if steps.is_noop() && steps.exclude().is_empty() {
        ui::success("Nothing to do");
        return;
    }

    for id in steps.exclude() {
        println!("  {} {}", "✗".red(), id);
    }
    for id in steps.stop() {
        println!("  {} {}", "-".yellow(), id);
    }
    for id in steps.start() {
        println!("  {} {}", "+".green(), id);
    }

    let summary = steps.summary();
    if !quiet {
        println!();
        ui::kv(
            "Summary",
            &format!(
                "{} to start, {} to stop, {} excluded",
                summary.starts.to_string().green(),
                summary.stops.to_string().yellow(),
                summary.exclusions.to_string().red()
            ),
        );
        ui::kv("Cost", &summary.cost.to_string());
    }
}

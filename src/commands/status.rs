use anyhow::Result;
use colored::Colorize;
use lifecycle::{RequirementAggregator, Severity, Subject};
use serde::Serialize;

use crate::Context;
use crate::cli::StatusArgs;
use crate::commands;
use crate::ui;

#[derive(Debug, Serialize)]
struct SubjectStatus {
    subject: Subject,
    severity: Severity,
    running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    quarantine: Option<String>,
}

#[derive(Debug, Serialize)]
struct Status {
    disabled: bool,
    dirty: usize,
    layers: Vec<(String, usize)>,
    subjects: Vec<SubjectStatus>,
}

impl Status {
    fn collect(state: &RequirementAggregator) -> Self {
        let subjects = state
            .catalog()
            .subjects()
            .map(|subject| {
                let (running, quarantine) = match &subject {
                    Subject::Component(id) => (
                        state.is_running(id),
                        state.quarantined().get(id).cloned(),
                    ),
                    Subject::Service(_) => (false, None),
                };
                SubjectStatus {
                    severity: state.final_severity(&subject).unwrap_or_default(),
                    subject,
                    running,
                    quarantine,
                }
            })
            .collect();

        Self {
            disabled: state.is_globally_disabled(),
            dirty: state.dirty_count(),
            layers: state
                .layers()
                .map(|(layer, count)| (layer.name.clone(), count))
                .collect(),
            subjects,
        }
    }
}

pub fn run(ctx: &Context, args: StatusArgs) -> Result<()> {
    let scenario = commands::load(ctx)?;
    let status = Status::collect(&scenario.aggregator()?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    ui::header("Lifecycle Status");
    if status.disabled {
        ui::warn("Globally disabled: everything is excluded");
    }

    ui::section("Layers");
    if status.layers.is_empty() {
        ui::dim("none");
    }
    for (name, count) in &status.layers {
        if *count > 1 {
            ui::kv(name, &format!("x{count}"));
        } else {
            ui::kv(name, "active");
        }
    }

    ui::section("Services");
    for entry in &status.subjects {
        if let Subject::Service(id) = &entry.subject {
            ui::kv(id.as_str(), &ui::severity(entry.severity).to_string());
        }
    }

    ui::section("Components");
    for entry in &status.subjects {
        let Subject::Component(id) = &entry.subject else {
            continue;
        };
        let marker = if entry.running {
            "●".green()
        } else {
            "○".dimmed()
        };
        let severity = ui::severity(entry.severity);
        let mut line = format!("  {marker} {:<20} {severity}", id.as_str());
        if let Some(reason) = &entry.quarantine {
            line.push_str(&format!("  {}", format!("quarantined: {reason}").red()));
        }
        println!("{line}");
    }

    println!();
    ui::kv("Dirty subjects", &status.dirty.to_string());
    Ok(())
}

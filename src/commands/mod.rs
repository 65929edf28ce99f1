pub mod apply;
pub mod plan;
pub mod status;
pub mod validate;

use crate::Context;
use crate::config;
use crate::schema::Scenario;
use anyhow::{Context as _, Result};

/// Resolve, load and validate the scenario named on the command line
pub fn load(ctx: &Context) -> Result<Scenario> {
    let path = config::scenario_path(ctx.scenario.as_deref())?;
    let scenario = config::load_scenario(&path)?;
    scenario
        .validate()
        .with_context(|| format!("Invalid scenario {}", path.display()))?;
    Ok(scenario)
}

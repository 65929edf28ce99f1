use anyhow::Result;

use crate::Context;
use crate::commands;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    let scenario = commands::load(ctx)?;
    let catalog = scenario.catalog()?;

    let internal = catalog
        .unimplemented_services()
        .into_iter()
        .filter(|id| catalog.service(id).is_some_and(|s| !s.external));
    for service in internal {
        ui::warn(&format!("Service '{service}' has no implementation"));
    }
    for component in catalog.components().filter(|c| !c.is_available()) {
        ui::warn(&format!(
            "Component '{}' is unavailable: {}",
            component.id,
            component.error.as_deref().unwrap_or("unknown error")
        ));
    }

    ui::success(&format!(
        "Scenario is valid: {} components, {} services, {} layers",
        catalog.len(),
        catalog.services().count(),
        scenario.layers.len()
    ));
    Ok(())
}

use crate::schema::Scenario;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("plugctl"))
}

/// Scenario path from the command line, or the default one
pub fn scenario_path(path: Option<&str>) -> Result<PathBuf> {
    match path {
        Some(p) => {
            let expanded = shellexpand::tilde(p);
            Ok(PathBuf::from(expanded.as_ref()))
        }
        None => Ok(config_dir()?.join("scenario.toml")),
    }
}

/// Load a scenario, choosing the format by extension
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;

    let scenario: Scenario = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in {}", path.display()))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?,
        Some(other) => bail!("Unsupported scenario format '.{other}' (use .toml or .json)"),
        None => bail!("Scenario file needs a .toml or .json extension"),
    };

    log::debug!(
        "Loaded scenario {} ({} components, {} layers)",
        path.display(),
        scenario.components.len(),
        scenario.layers.len()
    );
    Ok(scenario)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scenario_path_explicit() {
        let path = scenario_path(Some("/tmp/s.toml")).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/s.toml"));
    }

    #[test]
    fn test_scenario_path_default() {
        if dirs::home_dir().is_none() {
            return;
        }
        let path = scenario_path(None).unwrap();
        assert!(path.ends_with(".config/plugctl/scenario.toml"));
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario.toml");
        fs::write(
            &path,
            r#"
[[components]]
id = "vim"
implements = "editor"
"#,
        )
        .unwrap();

        let scenario = load_scenario(&path).unwrap();
        assert_eq!(scenario.components.len(), 1);
        assert_eq!(scenario.components[0].id.as_str(), "vim");
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario.json");
        fs::write(
            &path,
            r#"{"running": ["vim"], "components": [{"id": "vim"}]}"#,
        )
        .unwrap();

        let scenario = load_scenario(&path).unwrap();
        assert_eq!(scenario.running.len(), 1);
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scenario.yaml");
        fs::write(&path, "components: []").unwrap();
        assert!(load_scenario(&path).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_scenario(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }
}

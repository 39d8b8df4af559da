//! Script registry loading
//!
//! Scripts are declared in a TOML file and registered once at startup.
//! A missing file is not fatal: the daemon runs with an empty registry.

use anyhow::{Context, Result};
use curator_core::application::ScriptRegistry;
use curator_core::domain::ScriptDescriptor;
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct ScriptsFile {
    #[serde(default)]
    scripts: Vec<ScriptDescriptor>,
}

/// Load the script registry from a TOML file.
///
/// Example:
/// ```toml
/// [[scripts]]
/// name = "metadata-export"
/// description = "Export item metadata"
/// program = "/usr/local/bin/metadata-export"
/// input_file_options = []
/// access = "ADMIN_ONLY"
///
/// [[scripts.parameters]]
/// name = "-i"
/// takes_value = true
/// required = true
/// description = "collection id"
/// ```
pub fn load_registry(path: &str) -> Result<ScriptRegistry> {
    let mut registry = ScriptRegistry::new();

    if !Path::new(path).exists() {
        warn!(path = %path, "Scripts file not found, starting with empty registry");
        return Ok(registry);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scripts file {}", path))?;
    let file: ScriptsFile = toml::from_str(&raw)
        .with_context(|| format!("Failed to parse scripts file {}", path))?;

    for descriptor in file.scripts {
        let name = descriptor.name.clone();
        registry
            .register(descriptor)
            .with_context(|| format!("Duplicate script in {}: {}", path, name))?;
    }

    info!(path = %path, "Script registry loaded");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::domain::AccessRule;
    use std::io::Write;

    #[test]
    fn test_load_registry_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scripts.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"
[[scripts]]
name = "metadata-export"
description = "Export item metadata"
program = "/usr/local/bin/metadata-export"
input_file_options = []
access = "ADMIN_ONLY"

[[scripts.parameters]]
name = "-i"
takes_value = true
required = true
description = "collection id"

[[scripts]]
name = "harvest"
description = "Harvest remote records"
program = "/usr/local/bin/harvest"
access = {{ GROUP = "curators" }}
"#
        )
        .unwrap();

        let registry = load_registry(path.to_str().unwrap()).unwrap();

        let export = registry.resolve("metadata-export").unwrap();
        assert_eq!(export.access, AccessRule::AdminOnly);
        assert_eq!(export.parameters.len(), 1);
        assert!(export.parameters[0].takes_value);

        let harvest = registry.resolve("harvest").unwrap();
        assert_eq!(harvest.access, AccessRule::Group("curators".to_string()));
        assert!(harvest.parameters.is_empty());
    }

    #[test]
    fn test_missing_file_yields_empty_registry() {
        let registry = load_registry("/nonexistent/scripts.toml").unwrap();
        assert!(registry.list(&curator_core::domain::Principal::admin("root")).is_empty());
    }
}

// Script Registry & Authorization Gate

use crate::domain::{CommandLineParameter, DomainError, Principal, ScriptDescriptor};
use crate::error::{AppError, Result};
use std::collections::BTreeMap;

/// Name-keyed registry of script descriptors.
///
/// Populated once at startup and immutable afterwards; every lookup and
/// authorization check is a pure read.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    scripts: BTreeMap<String, ScriptDescriptor>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor. Duplicate names are a startup error.
    pub fn register(&mut self, descriptor: ScriptDescriptor) -> Result<()> {
        if self.scripts.contains_key(&descriptor.name) {
            return Err(AppError::Conflict(format!(
                "Script already registered: {}",
                descriptor.name
            )));
        }
        self.scripts.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Look up a descriptor by name
    pub fn resolve(&self, name: &str) -> Option<&ScriptDescriptor> {
        self.scripts.get(name)
    }

    /// Descriptors the principal is allowed to execute
    pub fn list(&self, principal: &Principal) -> Vec<&ScriptDescriptor> {
        self.scripts
            .values()
            .filter(|d| d.allowed_to_execute(principal, &[]).unwrap_or(false))
            .collect()
    }

    /// Resolve a descriptor and verify the principal may execute it.
    ///
    /// Unknown name surfaces as NotFound; a denial as Forbidden.
    pub fn get_authorized(&self, name: &str, principal: &Principal) -> Result<&ScriptDescriptor> {
        let descriptor = self
            .resolve(name)
            .ok_or_else(|| AppError::NotFound(format!("The script for name: {} wasn't found", name)))?;

        if !descriptor.allowed_to_execute(principal, &[])? {
            return Err(AppError::Forbidden(format!(
                "Current user is not authorized to access script with name: {}",
                name
            )));
        }
        Ok(descriptor)
    }

    /// Authorization gate for a launch: allow/deny for this principal and
    /// parameter list.
    ///
    /// A malformed parameter list is a client error, not a denial, and is
    /// mapped to Validation so the two are distinguishable downstream.
    pub fn authorize_launch(
        &self,
        descriptor: &ScriptDescriptor,
        principal: &Principal,
        parameters: &[CommandLineParameter],
    ) -> Result<()> {
        match descriptor.allowed_to_execute(principal, parameters) {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::Forbidden(format!(
                "Current user is not eligible to execute script with name: {} and the specified parameters {}",
                descriptor.name,
                parameters
                    .iter()
                    .map(|p| p.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
            Err(DomainError::ValidationError(msg)) => Err(AppError::Validation(msg)),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessRule, ParameterSpec};

    fn descriptor(name: &str, access: AccessRule) -> ScriptDescriptor {
        ScriptDescriptor {
            name: name.to_string(),
            description: String::new(),
            program: "/bin/true".to_string(),
            parameters: vec![ParameterSpec {
                name: "-i".to_string(),
                takes_value: true,
                required: false,
                description: String::new(),
            }],
            input_file_options: Vec::new(),
            access,
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ScriptRegistry::new();
        registry
            .register(descriptor("export", AccessRule::AdminOnly))
            .unwrap();

        assert!(registry.resolve("export").is_some());
        assert!(registry.resolve("unknown").is_none());

        // Duplicate registration is rejected
        assert!(registry
            .register(descriptor("export", AccessRule::AdminOnly))
            .is_err());
    }

    #[test]
    fn test_list_filters_by_principal() {
        let mut registry = ScriptRegistry::new();
        registry
            .register(descriptor("export", AccessRule::AdminOnly))
            .unwrap();
        registry
            .register(descriptor("report", AccessRule::Authenticated))
            .unwrap();

        let user = Principal::new("alice", vec![]);
        let names: Vec<_> = registry.list(&user).iter().map(|d| d.name.clone()).collect();
        assert_eq!(names, vec!["report"]);

        let admin = Principal::admin("root");
        assert_eq!(registry.list(&admin).len(), 2);
    }

    #[test]
    fn test_get_authorized_distinguishes_not_found_from_forbidden() {
        let mut registry = ScriptRegistry::new();
        registry
            .register(descriptor("export", AccessRule::AdminOnly))
            .unwrap();

        let user = Principal::new("alice", vec![]);

        assert!(matches!(
            registry.get_authorized("missing", &user),
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            registry.get_authorized("export", &user),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_authorize_launch_maps_malformed_parameters_to_validation() {
        let mut registry = ScriptRegistry::new();
        registry
            .register(descriptor("export", AccessRule::Authenticated))
            .unwrap();
        let script = registry.resolve("export").unwrap();

        let user = Principal::new("alice", vec![]);
        let bad_params = vec![CommandLineParameter::flag("--undeclared")];

        assert!(matches!(
            registry.authorize_launch(script, &user, &bad_params),
            Err(AppError::Validation(_))
        ));
    }
}

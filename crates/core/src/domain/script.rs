// Script Descriptor Domain Model

use crate::domain::parameter::CommandLineParameter;
use crate::domain::principal::Principal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One option in a script's declared parameter schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Option name as it appears on the command line (e.g. "-i", "--input")
    pub name: String,

    /// Whether the option consumes a value token
    #[serde(default)]
    pub takes_value: bool,

    /// Whether the option must be present in every launch
    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub description: String,
}

/// Who may launch a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessRule {
    /// Any authenticated principal
    Authenticated,
    /// Administrators only
    AdminOnly,
    /// Members of the named group (administrators always pass)
    Group(String),
}

impl Default for AccessRule {
    fn default() -> Self {
        AccessRule::AdminOnly
    }
}

/// Errors raised while checking an argument list against the schema.
///
/// These are recoverable at launch time: the launcher records usage text
/// and a failure on the handle instead of propagating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Option {0} requires a value")]
    MissingValue(String),

    #[error("Option {0} does not take a value")]
    UnexpectedValue(String),

    #[error("Missing required option: {0}")]
    MissingRequired(String),
}

/// An immutable, registered script definition.
///
/// Registered once at daemon startup and looked up per request. The
/// descriptor owns everything the launch path needs: the program to spawn,
/// the parameter schema, the declared input-file option names, and the
/// authorization rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDescriptor {
    /// Unique registry key
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Executable spawned for each process of this script
    pub program: String,

    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,

    /// Option names whose value refers to an uploaded file.
    /// Every name listed here must be covered by an uploaded filename.
    #[serde(default)]
    pub input_file_options: Vec<String>,

    #[serde(default)]
    pub access: AccessRule,
}

impl ScriptDescriptor {
    /// Find the spec for an option name
    pub fn parameter_spec(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Authorization predicate: may `principal` launch this script with
    /// `parameters`?
    ///
    /// Pure lookup, no side effects. A parameter name outside the declared
    /// schema is a malformed request, not an authorization failure, and
    /// surfaces as `DomainError::ValidationError` so callers can map it to
    /// a client error rather than a denial.
    pub fn allowed_to_execute(
        &self,
        principal: &Principal,
        parameters: &[CommandLineParameter],
    ) -> crate::domain::error::Result<bool> {
        for parameter in parameters {
            if self.parameter_spec(&parameter.name).is_none() {
                return Err(crate::domain::error::DomainError::ValidationError(format!(
                    "Script {} does not declare option {}",
                    self.name, parameter.name
                )));
            }
        }

        let allowed = match &self.access {
            AccessRule::Authenticated => true,
            AccessRule::AdminOnly => principal.is_admin,
            AccessRule::Group(group) => principal.is_admin || principal.in_group(group),
        };
        Ok(allowed)
    }

    /// Check an assembled argument vector against the parameter schema.
    ///
    /// Walks the flat argument sequence (name, optional value, repeated)
    /// and verifies every option is declared, valued options carry their
    /// value, and required options are all present.
    pub fn check_arguments(&self, args: &[String]) -> std::result::Result<(), ArgumentError> {
        let mut seen: Vec<&str> = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let name = &args[i];
            let spec = self
                .parameter_spec(name)
                .ok_or_else(|| ArgumentError::UnknownOption(name.clone()))?;
            seen.push(&spec.name);
            i += 1;

            if spec.takes_value {
                // The next token must exist and must not itself be an option
                match args.get(i) {
                    Some(value) if self.parameter_spec(value).is_none() => i += 1,
                    _ => return Err(ArgumentError::MissingValue(name.clone())),
                }
            } else if let Some(next) = args.get(i) {
                if self.parameter_spec(next).is_none() {
                    return Err(ArgumentError::UnexpectedValue(name.clone()));
                }
            }
        }

        for spec in &self.parameters {
            if spec.required && !seen.contains(&spec.name.as_str()) {
                return Err(ArgumentError::MissingRequired(spec.name.clone()));
            }
        }

        Ok(())
    }
}

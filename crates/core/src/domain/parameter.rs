// Command-Line Parameter Model

use serde::{Deserialize, Serialize};

/// A single name/value pair taken from a launch request.
///
/// The value is optional: a parameter without a value is a flag
/// (e.g. `-v`). Order matters and is preserved end to end, from the
/// client payload through to the assembled argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandLineParameter {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl CommandLineParameter {
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Flag-style parameter without a value
    pub fn flag(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }

    /// Parameter carrying a value
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Some(value.into()))
    }
}

impl std::fmt::Display for CommandLineParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{} {}", self.name, v),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Flatten a parameter list into a positional argument sequence.
///
/// For each parameter in list order: the name, then the value if present.
pub fn assemble_args(parameters: &[CommandLineParameter]) -> Vec<String> {
    let mut args = Vec::new();
    for parameter in parameters {
        args.push(parameter.name.clone());
        if let Some(value) = &parameter.value {
            args.push(value.clone());
        }
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CommandLineParameter::flag("-v").to_string(), "-v");
        assert_eq!(
            CommandLineParameter::with_value("-i", "data.csv").to_string(),
            "-i data.csv"
        );
    }

    #[test]
    fn test_assemble_preserves_order() {
        let parameters = vec![
            CommandLineParameter::with_value("-i", "data.csv"),
            CommandLineParameter::flag("-v"),
            CommandLineParameter::with_value("-o", "out.csv"),
        ];

        let args = assemble_args(&parameters);
        assert_eq!(args, vec!["-i", "data.csv", "-v", "-o", "out.csv"]);
    }

    #[test]
    fn test_assemble_empty() {
        assert!(assemble_args(&[]).is_empty());
    }
}

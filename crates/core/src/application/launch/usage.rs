// Usage Text Rendering

use crate::domain::ScriptDescriptor;

/// Render the usage/help text recorded on an argument-parse failure
pub fn render_usage(descriptor: &ScriptDescriptor) -> String {
    let mut out = format!("usage: {} [options]\n", descriptor.name);
    if !descriptor.description.is_empty() {
        out.push_str(&descriptor.description);
        out.push('\n');
    }

    for spec in &descriptor.parameters {
        let value = if spec.takes_value { " <value>" } else { "" };
        let required = if spec.required { " (required)" } else { "" };
        out.push_str(&format!(
            "  {}{}  {}{}\n",
            spec.name, value, spec.description, required
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccessRule, ParameterSpec};

    #[test]
    fn test_render_usage_lists_options() {
        let descriptor = ScriptDescriptor {
            name: "metadata-export".to_string(),
            description: "Export item metadata".to_string(),
            program: "/bin/true".to_string(),
            parameters: vec![
                ParameterSpec {
                    name: "-i".to_string(),
                    takes_value: true,
                    required: true,
                    description: "input file".to_string(),
                },
                ParameterSpec {
                    name: "-v".to_string(),
                    takes_value: false,
                    required: false,
                    description: "verbose output".to_string(),
                },
            ],
            input_file_options: Vec::new(),
            access: AccessRule::AdminOnly,
        };

        let usage = render_usage(&descriptor);
        assert!(usage.starts_with("usage: metadata-export"));
        assert!(usage.contains("-i <value>  input file (required)"));
        assert!(usage.contains("-v  verbose output"));
    }
}

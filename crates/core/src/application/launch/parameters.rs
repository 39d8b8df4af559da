// Properties Payload Parsing

use crate::domain::CommandLineParameter;
use crate::error::{AppError, Result};
use serde::Deserialize;

/// Wire shape of one entry in the `properties` JSON array
#[derive(Debug, Deserialize)]
struct ParameterValue {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

/// Parse the client-supplied `properties` payload into an ordered
/// parameter list.
///
/// A blank or absent payload is an empty list. Anything that is not a
/// JSON array of `{name, value?}` objects is a Validation error.
pub fn parse_properties(properties: Option<&str>) -> Result<Vec<CommandLineParameter>> {
    let raw = match properties {
        Some(s) if !s.trim().is_empty() => s,
        _ => return Ok(Vec::new()),
    };

    let entries: Vec<ParameterValue> = serde_json::from_str(raw)
        .map_err(|e| AppError::Validation(format!("Malformed properties payload: {}", e)))?;

    Ok(entries
        .into_iter()
        .map(|p| CommandLineParameter::new(p.name, p.value))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::parameter::assemble_args;

    #[test]
    fn test_parse_empty_and_absent() {
        assert!(parse_properties(None).unwrap().is_empty());
        assert!(parse_properties(Some("")).unwrap().is_empty());
        assert!(parse_properties(Some("   ")).unwrap().is_empty());
    }

    #[test]
    fn test_parse_preserves_order_and_values() {
        let payload = r#"[{"name":"-i","value":"data.csv"},{"name":"-v"},{"name":"-o","value":"out.csv"}]"#;
        let params = parse_properties(Some(payload)).unwrap();

        assert_eq!(params.len(), 3);
        assert_eq!(params[0], CommandLineParameter::with_value("-i", "data.csv"));
        assert_eq!(params[1], CommandLineParameter::flag("-v"));
        assert_eq!(params[2], CommandLineParameter::with_value("-o", "out.csv"));
    }

    #[test]
    fn test_parse_rejects_malformed_payload() {
        assert!(matches!(
            parse_properties(Some("{\"name\":\"-i\"}")),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            parse_properties(Some("not json")),
            Err(AppError::Validation(_))
        ));
    }

    // assemble(parse(payload)) round-trips names and values in input order
    #[test]
    fn test_parse_then_assemble_round_trip() {
        let payload = r#"[{"name":"-c","value":"alpha"},{"name":"-b"},{"name":"-a","value":"omega"}]"#;
        let params = parse_properties(Some(payload)).unwrap();
        let args = assemble_args(&params);

        assert_eq!(args, vec!["-c", "alpha", "-b", "-a", "omega"]);
    }
}

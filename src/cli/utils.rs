use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let Some(data) = data {
                response["data"] = data;
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a value: pretty JSON, or `key: value` lines for flat objects
pub fn output_value(output_format: &OutputFormat, value: &Value) -> anyhow::Result<()> {
    match (output_format, value) {
        (OutputFormat::Text, Value::Object(map)) if map.values().all(is_scalar) => {
            for (key, value) in map {
                println!("{}: {}", key, display_scalar(value));
            }
        }
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Parse `field=value`. The value is read as JSON when it parses, so
/// `true`, `3` and `"x"` keep their types; anything else is a string.
pub fn parse_assignment(input: &str) -> anyhow::Result<(String, Value)> {
    let (field, raw) = input
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected field=value, got '{}'", input))?;
    let field = field.trim();
    if field.is_empty() {
        anyhow::bail!("missing field name in '{}'", input);
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((field.to_string(), value))
}

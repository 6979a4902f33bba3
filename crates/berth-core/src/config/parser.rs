//! TOML parser with helpful error messages

use super::schema::BerthConfig;
use anyhow::{Context, Result};
use std::path::Path;

/// Parse berth.toml with detailed error messages
pub fn parse_berth_toml(path: &Path) -> Result<BerthConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_berth_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse berth.toml content from string
pub fn parse_berth_toml_str(content: &str) -> Result<BerthConfig> {
    let config: BerthConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    config.validate()?;

    Ok(config)
}

/// Enhance TOML parsing errors with helpful context
pub(crate) fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let error_msg = error.message().to_string();

    let line_hint = error.span().map(|span| {
        content[..span.start.min(content.len())]
            .bytes()
            .filter(|b| *b == b'\n')
            .count()
            + 1
    });

    if let Some(line_num) = line_hint {
        let context = get_line_context(content, line_num);
        anyhow::anyhow!(
            "TOML parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error_msg
        )
    } else {
        anyhow::anyhow!("TOML parsing error: {}", error_msg)
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2).min(lines.len());
    let end = (line_num + 2).min(lines.len());

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
current_context = "prod"
installer_context = "ops"
with_registry_auth = true
registry_auth_file = "/home/ci/.docker/config.json"
"#;

        let config = parse_berth_toml_str(toml).unwrap();
        assert_eq!(config.current_context, "prod");
        assert_eq!(config.default_context, "default");
        assert_eq!(config.installer_context.as_deref(), Some("ops"));
        assert!(config.with_registry_auth);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_berth_toml_str("").unwrap();
        assert_eq!(config, BerthConfig::default());
    }

    #[test]
    fn test_parse_invalid_toml_reports_line() {
        let toml = "current_context = \"prod\"\nwith_registry_auth = maybe\n";

        let err = parse_berth_toml_str(toml).unwrap_err().to_string();
        assert!(err.contains("line 2"), "unexpected error: {err}");
    }

    #[test]
    fn test_parse_rejects_empty_current_context() {
        assert!(parse_berth_toml_str("current_context = \"\"").is_err());
    }

    #[test]
    fn test_parse_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "current_context = \"staging\"").unwrap();

        let config = parse_berth_toml(file.path()).unwrap();
        assert_eq!(config.current_context, "staging");
    }
}

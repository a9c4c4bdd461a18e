use anyhow::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Knows which configuration keys docdiff reads
pub struct ConfigValidator {
    /// Dotted paths of every recognized leaf field
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "tools.converter",
            "tools.git",
            "tools.diff",
            "diff.marker_column",
            "process.timeout",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Collect dotted paths of fields in `content` that docdiff does not read
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML
    pub fn unknown_fields(&self, content: &str) -> Result<Vec<String>> {
        let parsed: toml::Value = toml::from_str(content)?;
        let mut unknown = Vec::new();
        self.check_table(&parsed, "", &mut unknown);
        unknown.sort();
        Ok(unknown)
    }

    /// Warn about unknown fields in the config file at `config_path`
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn warn_unknown_fields(&self, config_path: &Path) -> Result<()> {
        if !config_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(config_path)?;
        let unknown = self.unknown_fields(&content)?;

        if !unknown.is_empty() {
            eprintln!("{}", "Configuration warnings:".yellow().bold());
            for field in &unknown {
                eprintln!("  Unknown configuration field: {}", field.yellow());
            }
            eprintln!();
        }

        Ok(())
    }

    /// Recursively checks a TOML table for unknown fields
    fn check_table(&self, table: &toml::Value, prefix: &str, unknown: &mut Vec<String>) {
        if let toml::Value::Table(map) = table {
            for (key, value) in map {
                let full_key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };

                if let toml::Value::Table(_) = value {
                    self.check_table(value, &full_key, unknown);
                } else if !self.known_fields.contains(full_key.as_str()) {
                    unknown.push(full_key);
                }
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fields_pass() {
        let validator = ConfigValidator::new();
        let unknown = validator
            .unknown_fields("[tools]\ngit = \"git\"\n[diff]\nmarker_column = 63\n")
            .unwrap();
        assert!(unknown.is_empty());
    }

    #[test]
    fn test_unknown_fields_reported_with_full_path() {
        let validator = ConfigValidator::new();
        let unknown = validator
            .unknown_fields("color = true\n[tools]\npager = \"less\"\n[extra]\nx = 1\n")
            .unwrap();
        assert_eq!(unknown, vec!["color", "extra.x", "tools.pager"]);
    }
}

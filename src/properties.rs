//! Property substitution
//!
//! Object files may reference environment-specific values as `$(key)`.
//! Values come from a simple `key=value` properties file.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

const PLACEHOLDER_OPEN: &str = "$(";
const PLACEHOLDER_CLOSE: &str = ")";

/// Key/value store used to fill `$(key)` placeholders
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    /// Load a properties file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read properties file {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut values = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                values.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// Replace every known `$(key)` in `text`; unknown keys are left intact
    pub fn replace(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find(PLACEHOLDER_OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + PLACEHOLDER_OPEN.len()..];
            match after_open.find(PLACEHOLDER_CLOSE) {
                Some(end) => {
                    let key = &after_open[..end];
                    match self.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            tracing::warn!("No value for property '{}'", key);
                            let placeholder_end =
                                start + PLACEHOLDER_OPEN.len() + end + PLACEHOLDER_CLOSE.len();
                            out.push_str(&rest[start..placeholder_end]);
                        }
                    }
                    rest = &after_open[end + PLACEHOLDER_CLOSE.len()..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Substitute placeholders in a file, in place
    pub fn replace_file(&self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        std::fs::write(path, self.replace(&content))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

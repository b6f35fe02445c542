use std::fmt;

use serde::Serialize;

use crate::error::MonitorError;

/// Normalized ticker symbol (trimmed, upper-cased)
///
/// Every map in the history store and the monitor registry is keyed by this
/// type, so a symbol can only reach them after going through [`Symbol::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Normalize raw user input into a symbol key
    pub fn parse(raw: &str) -> Result<Self, MonitorError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MonitorError::Validation(
                "symbol must be a non-empty string".to_string(),
            ));
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

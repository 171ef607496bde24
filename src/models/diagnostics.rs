//! Per-run messages and warnings

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub message: String,
    pub location: Option<String>,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.message, location),
            None => f.write_str(&self.message),
        }
    }
}

/// Non-fatal output of a pipeline run. Owned by the run; never aborts it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Diagnostics {
    pub messages: Vec<String>,
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.messages.push(message);
    }

    pub fn add_warning(&mut self, message: impl Into<String>, location: Option<String>) {
        let warning = Warning {
            message: message.into(),
            location,
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Fold a child run's output into this one, tagging it with the child's name
    pub fn absorb(&mut self, origin: &str, other: Diagnostics) {
        self.messages
            .extend(other.messages.into_iter().map(|m| format!("{}: {}", origin, m)));
        self.warnings.extend(other.warnings.into_iter().map(|w| Warning {
            message: format!("{}: {}", origin, w.message),
            location: w.location,
        }));
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.warnings.is_empty()
    }
}

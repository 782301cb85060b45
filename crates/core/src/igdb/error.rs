use std::fmt;

use thiserror::Error;

/// Failures surfaced by the IGDB token exchange, metadata client and
/// response normalizer. Nothing here is retried or recovered locally.
#[derive(Debug, Error)]
pub enum IgdbError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("IGDB API error: {status} {status_text}")]
    Upstream { status: u16, status_text: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("record does not match expected shape: {0}")]
    Schema(Violations),

    #[error("no localization found for region {region}")]
    LocalizationNotFound { region: u32 },

    #[error("invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl IgdbError {
    /// HTTP status carried by an upstream failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            IgdbError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What went wrong with a single field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    Mismatch {
        expected: String,
        found: &'static str,
    },
}

/// A single field path that failed shape validation, e.g. `artworks[1].image_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub problem: Problem,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            Problem::Missing => write!(f, "{} is missing", self.path),
            Problem::Mismatch { expected, found } => {
                write!(f, "{} expected {}, found {}", self.path, expected, found)
            }
        }
    }
}

/// Every violation found in one record, in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Violations(pub Vec<Violation>);

impl Violations {
    pub fn paths(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.path.as_str()).collect()
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", rendered)
    }
}

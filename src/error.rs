//! Error types for the simulation core.
//!
//! Mirrors `callisto::main`'s habit of a small hand-written enum with a
//! manual `Display`/`Error` impl rather than reaching for a derive-macro
//! error crate.
//!
//! Missing required fields are already caught by `serde_json` at parse
//! time (`ScenarioFile::load_from_file` surfaces those as a plain
//! `Box<dyn std::error::Error>`, before a `ConfigError` could even be
//! raised), and this schema has no named cross-references between
//! groups, so the only validation failure this crate can actually
//! produce is an out-of-domain value. A `SimError` family for internal
//! engine bugs (e.g. a duplicate entity id) isn't carried either:
//! `Engine`'s id counters are monotonic by construction, so a collision
//! can't occur without a bug elsewhere, and there's no call site that
//! would ever construct one.
use std::fmt;

/// Raised while validating a [`crate::config::ScenarioFile`] into a
/// [`crate::scenario::Scenario`]. Never raised once a `Scenario` exists.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
  OutOfDomain { group: &'static str, field: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::OutOfDomain { group, field, reason } => {
        write!(f, "scenario.{group}.{field}: {reason}")
      }
    }
  }
}

impl std::error::Error for ConfigError {}

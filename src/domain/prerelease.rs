//! Pre-release qualifiers for semantic version names
//!
//! A pre-release is a label plus a numeric counter, rendered as `label.counter`
//! (e.g. `alpha.2`). Labels compare case-sensitively.

use crate::error::{Result, VersionManagerError};
use std::cmp::Ordering;
use std::fmt;

/// Pre-release qualifier with its counter
///
/// # Examples
/// - "alpha.1" -> PreRelease { label: "alpha", counter: 1 }
/// - "rc.3" -> PreRelease { label: "rc", counter: 3 }
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreRelease {
    /// The pre-release label (alpha, beta, rc, or anything alphanumeric-hyphen)
    pub label: String,
    /// Counter, starting at 1 for the first pre-release of a label
    pub counter: u64,
}

impl PreRelease {
    /// Create a new pre-release, validating the label.
    ///
    /// # Returns
    /// * `Ok(PreRelease)` - Valid label
    /// * `Err` - Empty label or characters outside `[0-9A-Za-z-]`
    pub fn new(label: impl Into<String>, counter: u64) -> Result<Self> {
        let label = label.into();
        validate_label(&label)?;
        Ok(PreRelease { label, counter })
    }

    /// First pre-release of `label` (counter 1).
    pub fn first(label: impl Into<String>) -> Result<Self> {
        PreRelease::new(label, 1)
    }

    /// Parse `label.counter`; a bare label means counter 1.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(VersionManagerError::version_spec(
                "Empty pre-release identifier",
            ));
        }

        match s.rsplit_once('.') {
            Some((label, counter)) => {
                let counter = counter.parse::<u64>().map_err(|_| {
                    VersionManagerError::version_spec(format!(
                        "Invalid pre-release counter: '{}'",
                        counter
                    ))
                })?;
                PreRelease::new(label, counter)
            }
            None => PreRelease::first(s),
        }
    }

    /// The next pre-release for `label` given this one.
    ///
    /// Same label: counter + 1. Different label: starts over at 1.
    pub fn next_for(&self, label: &str) -> Result<Self> {
        if self.label == label {
            let counter = self.counter.checked_add(1).ok_or_else(|| {
                VersionManagerError::version_spec(format!(
                    "pre-release counter of '{}' is out of range",
                    self
                ))
            })?;
            Ok(PreRelease {
                label: self.label.clone(),
                counter,
            })
        } else {
            PreRelease::first(label)
        }
    }
}

fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(VersionManagerError::version_spec(
            "Pre-release label must not be empty",
        ));
    }
    if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(VersionManagerError::version_spec(format!(
            "Invalid pre-release label: '{}'",
            label
        )));
    }
    Ok(())
}

impl Ord for PreRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        self.label
            .cmp(&other.label)
            .then(self.counter.cmp(&other.counter))
    }
}

impl PartialOrd for PreRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.label, self.counter)
    }
}

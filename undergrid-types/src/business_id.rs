//! Human-meaningful entity keys of the form `PREFIX-<suffix>`.
//!
//! Pipelines use `PIPELINE-<n>`, facilities use a zero-padded `FACILITY-<NNN>`.
//! Only numeric suffixes take part in sequence computation.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed business identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusinessId {
    prefix: String,
    suffix: String,
}

impl BusinessId {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// The numeric suffix, `None` when the suffix is not all digits.
    pub fn sequence(&self) -> Option<i64> {
        if self.suffix.is_empty() || !self.suffix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.suffix.parse().ok()
    }
}

impl FromStr for BusinessId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        // Split on the last dash so prefixes like "PUMP-STATION" keep working.
        let (prefix, suffix) = s
            .rsplit_once('-')
            .ok_or_else(|| Error::InvalidBusinessId(s.to_string()))?;
        if prefix.is_empty() || suffix.is_empty() {
            return Err(Error::InvalidBusinessId(s.to_string()));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.suffix)
    }
}

/// Formats `PREFIX-<n>`, zero-padding `n` to `width` digits (0 disables padding).
pub fn format_business_id(prefix: &str, sequence: i64, width: usize) -> String {
    format!("{prefix}-{sequence:0width$}")
}

/// One past the largest numeric suffix among `ids`; `1` when none is numeric.
///
/// Malformed identifiers and non-numeric suffixes are ignored.
pub fn next_sequence_id<'a>(ids: impl IntoIterator<Item = &'a str>) -> i64 {
    ids.into_iter()
        .filter_map(|id| id.parse::<BusinessId>().ok())
        .filter_map(|id| id.sequence())
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

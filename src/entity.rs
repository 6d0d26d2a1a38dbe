//! Canonical entities and their stable identifiers.
//!
//! A canonical entity is one row of the reference registry snapshot: a
//! Local Education Agency with its NCES identifier, official name, an
//! optional CRM alias, and an optional jurisdiction. The snapshot is
//! immutable for the duration of a run.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::jurisdiction::Jurisdiction;

/// A normalized NCES LEAID: seven digits, zero-padded.
///
/// The first two digits are the state FIPS code, the remaining five the
/// district id within the state. Source data delivers these with leading
/// zeros lost ("604020" for a California district) and occasionally with
/// spreadsheet float noise ("4500690.0"); [`LeaId::parse`] accepts both.
///
/// # Examples
///
/// ```
/// use leamatch::LeaId;
///
/// let id = LeaId::parse("604020").unwrap();
/// assert_eq!(id.as_str(), "0604020");
/// assert_eq!(id.jurisdiction().unwrap().code(), "CA");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaId(String);

impl LeaId {
    /// Parses and normalizes a LEAID.
    ///
    /// Accepts up to seven digits, with or without leading zeros, and
    /// tolerates a trailing `.0` decimal portion. Anything else is a
    /// [`ValidationError::InvalidLeaId`].
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();

        // Spreadsheet exports render ids as floats ("4500690.0").
        let digits = match trimmed.split_once('.') {
            Some((int_part, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => {
                int_part
            }
            Some(_) => {
                return Err(ValidationError::InvalidLeaId {
                    value: value.to_string(),
                })
            }
            None => trimmed,
        };

        if digits.is_empty()
            || digits.len() > 7
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(ValidationError::InvalidLeaId {
                value: value.to_string(),
            });
        }

        Ok(Self(format!("{digits:0>7}")))
    }

    /// Returns the normalized seven-digit form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the two-digit state FIPS prefix.
    #[must_use]
    pub fn state_fips(&self) -> &str {
        &self.0[..2]
    }

    /// Returns the jurisdiction implied by the FIPS prefix, if known.
    #[must_use]
    pub fn jurisdiction(&self) -> Option<Jurisdiction> {
        Jurisdiction::from_fips(self.state_fips())
    }
}

impl fmt::Display for LeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the reference registry: a canonical LEA.
///
/// `alias_name` carries the CRM account name where one exists; it feeds
/// the exact-account and alias-overlap scoring rules. Entities with no
/// jurisdiction live only in the global candidate pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    /// Stable registry identifier.
    pub id: LeaId,

    /// Official district name.
    pub primary_name: String,

    /// CRM account alias, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias_name: Option<String>,

    /// Jurisdiction the entity belongs to, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,
}

impl CanonicalEntity {
    /// Creates an entity with a primary name only.
    #[must_use]
    pub fn new(id: LeaId, primary_name: impl Into<String>) -> Self {
        Self {
            id,
            primary_name: primary_name.into(),
            alias_name: None,
            jurisdiction: None,
        }
    }

    /// Sets the CRM alias name.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias_name = Some(alias.into());
        self
    }

    /// Sets the jurisdiction.
    #[must_use]
    pub fn with_jurisdiction(mut self, jurisdiction: Jurisdiction) -> Self {
        self.jurisdiction = Some(jurisdiction);
        self
    }
}

//! Curated override table.
//!
//! A human-in-the-loop correction layer over the automated resolver,
//! not integrated into it. Each entry encodes one observed automated
//! mismatch for one distinct (raw name, jurisdiction) pair; when an
//! entry is present its outcome fully replaces the resolver's result,
//! never merged or re-scored.
//!
//! Keys use the *raw* lowercased/trimmed name, not the normalizer's
//! output, so entries stay auditable against literal source strings.
//! An empty jurisdiction is a distinct bucket meaning "no jurisdiction
//! recorded", not "any jurisdiction".

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::LeaId;
use crate::error::{MatchResult, SetupError};
use crate::jurisdiction::Jurisdiction;
use crate::resolve::ConfidenceTier;

/// What the curator concluded about one input name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideOutcome {
    /// Automated match confirmed correct.
    Verified,
    /// Automated match was wrong; the override supplies the right entity.
    Corrected,
    /// Confirmed that no canonical entity exists for this input.
    NoMatch,
    /// A private institution, outside the registry's domain; any nearby
    /// entity is informational only, never a match.
    PrivateSchool,
    /// The input names a single school; the governing entity is returned.
    SchoolInDistrict,
    /// Structurally outside the domain: an agency, vendor, or
    /// cost-center label.
    NonK12,
    /// Multiple distinct entities share this name across jurisdictions
    /// and none was supplied; left unmatched rather than guessed.
    Ambiguous,
    /// Duplicates another already-resolved input row; excluded from
    /// statistics.
    Dupe,
}

impl fmt::Display for OverrideOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Verified => "VERIFIED",
            Self::Corrected => "CORRECTED",
            Self::NoMatch => "NO_MATCH",
            Self::PrivateSchool => "PRIVATE_SCHOOL",
            Self::SchoolInDistrict => "SCHOOL_IN_DISTRICT",
            Self::NonK12 => "NON_K12",
            Self::Ambiguous => "AMBIGUOUS",
            Self::Dupe => "DUPE",
        };
        write!(f, "{label}")
    }
}

/// The entity an override resolves to, where one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedOverride {
    /// Registry id.
    pub id: LeaId,
    /// Canonical name, carried for auditability of the curated table.
    pub name: String,
}

/// One curated correction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// The literal source name this entry corrects.
    pub raw_name: String,

    /// Jurisdiction half of the key; `None` keys the "no jurisdiction
    /// recorded" bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,

    /// Resolved entity, absent for NO_MATCH-like outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<ResolvedOverride>,

    /// Curated outcome.
    pub outcome: OverrideOutcome,

    /// Curated confidence.
    pub confidence: ConfidenceTier,

    /// Curator's note.
    #[serde(default)]
    pub note: String,
}

impl OverrideEntry {
    /// Creates an entry with no resolved entity and no note.
    #[must_use]
    pub fn new(
        raw_name: impl Into<String>,
        outcome: OverrideOutcome,
        confidence: ConfidenceTier,
    ) -> Self {
        Self {
            raw_name: raw_name.into(),
            jurisdiction: None,
            resolved: None,
            outcome,
            confidence,
            note: String::new(),
        }
    }

    /// Sets the jurisdiction half of the key.
    #[must_use]
    pub fn with_jurisdiction(mut self, jurisdiction: Jurisdiction) -> Self {
        self.jurisdiction = Some(jurisdiction);
        self
    }

    /// Sets the resolved entity.
    #[must_use]
    pub fn with_resolved(mut self, id: LeaId, name: impl Into<String>) -> Self {
        self.resolved = Some(ResolvedOverride {
            id,
            name: name.into(),
        });
        self
    }

    /// Sets the curator's note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Immutable keyed map over the curated correction list.
///
/// Constructed once at run start and passed by reference into the
/// pipeline; lookup is exact, absence means "defer to the resolver".
#[derive(Debug, Default)]
pub struct OverrideTable {
    entries: HashMap<(String, String), OverrideEntry>,
}

impl OverrideTable {
    /// Builds the table, rejecting duplicate keys.
    ///
    /// Each observed mismatch must be encoded exactly once per distinct
    /// (name, jurisdiction) pair; a duplicate is a curation error and a
    /// fatal setup condition.
    pub fn from_entries(entries: Vec<OverrideEntry>) -> MatchResult<Self> {
        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            let key = key_for(&entry.raw_name, entry.jurisdiction.as_ref());
            if let Some(previous) = map.insert(key, entry) {
                return Err(SetupError::DuplicateOverrideKey {
                    name: previous.raw_name.trim().to_lowercase(),
                    jurisdiction: previous
                        .jurisdiction
                        .map(|j| j.code().to_string())
                        .unwrap_or_default(),
                }
                .into());
            }
        }
        Ok(Self { entries: map })
    }

    /// Exact lookup on (raw lowercased/trimmed name, jurisdiction).
    ///
    /// `None` jurisdiction selects the distinct wildcard bucket; it
    /// never falls through to jurisdictioned entries, nor vice versa.
    #[must_use]
    pub fn lookup(
        &self,
        raw_name: &str,
        jurisdiction: Option<&Jurisdiction>,
    ) -> Option<&OverrideEntry> {
        self.entries.get(&key_for(raw_name, jurisdiction))
    }

    /// Number of curated entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key_for(raw_name: &str, jurisdiction: Option<&Jurisdiction>) -> (String, String) {
    (
        raw_name.trim().to_lowercase(),
        jurisdiction.map(|j| j.code().to_string()).unwrap_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> OverrideTable {
        OverrideTable::from_entries(vec![
            OverrideEntry::new("Dayton Public Schools", OverrideOutcome::Corrected, ConfidenceTier::Medium)
                .with_resolved(LeaId::parse("3904384").unwrap(), "Dayton City School District")
                .with_note("Likely OH but could be other states - verify"),
            OverrideEntry::new("Richland School District Two", OverrideOutcome::Corrected, ConfidenceTier::High)
                .with_jurisdiction(Jurisdiction::new("SC"))
                .with_resolved(LeaId::parse("4503390").unwrap(), "Richland School District 2")
                .with_note("Two vs 2"),
            OverrideEntry::new("Monsignor Kelly Catholic High School", OverrideOutcome::PrivateSchool, ConfidenceTier::None)
                .with_jurisdiction(Jurisdiction::new("TX")),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_folds_case_and_whitespace() {
        let t = table();
        let entry = t
            .lookup("  DAYTON public schools ", None)
            .expect("wildcard entry");
        assert_eq!(entry.outcome, OverrideOutcome::Corrected);
        assert_eq!(entry.resolved.as_ref().unwrap().id.as_str(), "3904384");
    }

    #[test]
    fn test_wildcard_bucket_is_distinct() {
        let t = table();
        // The Dayton entry is keyed with no jurisdiction; an OH-scoped
        // lookup must not see it.
        assert!(t.lookup("Dayton Public Schools", Some(&Jurisdiction::new("OH"))).is_none());
        // And jurisdictioned entries are invisible to wildcard lookups.
        assert!(t.lookup("Richland School District Two", None).is_none());
    }

    #[test]
    fn test_jurisdictioned_lookup() {
        let t = table();
        let entry = t
            .lookup("richland school district two", Some(&Jurisdiction::new("SC")))
            .expect("SC entry");
        assert_eq!(entry.confidence, ConfidenceTier::High);
    }

    #[test]
    fn test_absence_defers() {
        let t = table();
        assert!(t.lookup("Alief Isd", Some(&Jurisdiction::new("TX"))).is_none());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = OverrideTable::from_entries(vec![
            OverrideEntry::new("D2C", OverrideOutcome::NonK12, ConfidenceTier::None),
            // Same key after folding.
            OverrideEntry::new("  d2c ", OverrideOutcome::NonK12, ConfidenceTier::None),
        ])
        .unwrap_err();
        assert!(err.is_setup());
    }

    #[test]
    fn test_same_name_different_jurisdictions_allowed() {
        let t = OverrideTable::from_entries(vec![
            OverrideEntry::new("Lincoln Academy", OverrideOutcome::NoMatch, ConfidenceTier::None)
                .with_jurisdiction(Jurisdiction::new("WI")),
            OverrideEntry::new("Lincoln Academy", OverrideOutcome::NoMatch, ConfidenceTier::None)
                .with_jurisdiction(Jurisdiction::new("ME")),
        ])
        .unwrap();
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_entry_serialization_round_trip() {
        let entry = OverrideEntry::new("Alief Isd", OverrideOutcome::Verified, ConfidenceTier::High)
            .with_jurisdiction(Jurisdiction::new("TX"))
            .with_resolved(LeaId::parse("4807530").unwrap(), "Alief Independent School District");
        let json = serde_json::to_string(&entry).unwrap();
        let back: OverrideEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}

//! Match resolution: scope selection, scoring, ranking, tiering.
//!
//! The resolver turns one input record into a [`ResolutionResult`].
//! "No match" is a normal terminal state, never an error; the only
//! record-level hard failure (a missing name) is filtered upstream by
//! the pipeline.

use serde::{Deserialize, Serialize};

use crate::entity::{CanonicalEntity, LeaId};
use crate::jurisdiction::Jurisdiction;
use crate::normalize::NameNormalizer;
use crate::registry::{IndexedEntity, RegistryIndex};
use crate::score::{score_candidate, MatchMethod, ScoreQuery};

/// Top score at or above which a match is strong.
pub const STRONG_MATCH: f32 = 0.90;
/// Top score at or above which a match is plausible but needs review.
pub const WEAK_MATCH: f32 = 0.60;
/// Alternates retained for human review.
pub const MAX_ALTERNATES: usize = 3;

/// Whether candidate search was jurisdiction-local or registry-wide.
///
/// Cross-jurisdiction name collisions are far more likely than
/// collisions within one jurisdiction, so global matches are capped a
/// tier below local ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search restricted to one jurisdiction bucket.
    Local,
    /// Search over the full registry.
    Global,
}

impl std::fmt::Display for SearchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "LOCAL"),
            Self::Global => write!(f, "GLOBAL"),
        }
    }
}

/// Coarse trust label driving human-review prioritization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    /// Confirmed via a supplied identifier or a curated override.
    Verified,
    /// Strong jurisdiction-local match.
    High,
    /// Strong global match, or plausible local match.
    Medium,
    /// Plausible global match.
    Low,
    /// No usable match.
    None,
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Verified => "VERIFIED",
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::None => "NONE",
        };
        write!(f, "{label}")
    }
}

/// One record of input from the ingestion collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Free-text organization name.
    pub raw_name: String,

    /// Jurisdiction hint, if the source recorded one. Untrusted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,

    /// Pre-supplied registry identifier, if any. Untrusted free text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplied_id: Option<String>,

    /// Source fields carried through to the output row untouched.
    #[serde(default)]
    pub passthrough: serde_json::Value,
}

impl InputRecord {
    /// Creates a record with a raw name only.
    #[must_use]
    pub fn new(raw_name: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            jurisdiction: None,
            supplied_id: None,
            passthrough: serde_json::Value::Null,
        }
    }

    /// Sets the jurisdiction hint.
    #[must_use]
    pub fn with_jurisdiction(mut self, jurisdiction: Jurisdiction) -> Self {
        self.jurisdiction = Some(jurisdiction);
        self
    }

    /// Sets the pre-supplied identifier.
    #[must_use]
    pub fn with_supplied_id(mut self, id: impl Into<String>) -> Self {
        self.supplied_id = Some(id.into());
        self
    }

    /// Sets passthrough metadata.
    #[must_use]
    pub fn with_passthrough(mut self, passthrough: serde_json::Value) -> Self {
        self.passthrough = passthrough;
        self
    }
}

/// A ranked runner-up kept for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternate {
    /// Candidate id.
    pub id: LeaId,
    /// Candidate primary name.
    pub name: String,
    /// Rule score.
    pub score: f32,
    /// Rule that produced the score.
    pub method: MatchMethod,
}

/// The outcome of resolving one input record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    /// The matched entity, absent when the tier is NONE.
    pub chosen: Option<CanonicalEntity>,
    /// Confidence tier.
    pub tier: ConfidenceTier,
    /// How the result was produced; absent when nothing scored.
    pub method: Option<MatchMethod>,
    /// Up to [`MAX_ALTERNATES`] ranked runners-up (or top rejects when
    /// the tier is NONE).
    pub alternates: Vec<Alternate>,
    /// Scope the search ran under.
    pub scope: SearchScope,
}

impl ResolutionResult {
    fn none(scope: SearchScope, method: Option<MatchMethod>, alternates: Vec<Alternate>) -> Self {
        Self {
            chosen: None,
            tier: ConfidenceTier::None,
            method,
            alternates,
            scope,
        }
    }
}

/// Resolves input records against one registry snapshot.
pub struct MatchResolver {
    index: RegistryIndex,
    normalizer: NameNormalizer,
}

impl MatchResolver {
    /// Creates a resolver over a built index.
    #[must_use]
    pub fn new(index: RegistryIndex, normalizer: NameNormalizer) -> Self {
        Self { index, normalizer }
    }

    /// The registry index this resolver searches.
    #[must_use]
    pub fn index(&self) -> &RegistryIndex {
        &self.index
    }

    /// The normalizer this resolver compares with.
    #[must_use]
    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    /// Resolves one record.
    ///
    /// Deterministic: the same record against the same snapshot yields
    /// an identical result, including alternates and their order.
    #[must_use]
    pub fn resolve(&self, record: &InputRecord) -> ResolutionResult {
        if let Some(supplied) = record.supplied_id.as_deref() {
            let supplied = supplied.trim();
            if !supplied.is_empty() {
                return self.resolve_supplied(supplied);
            }
        }

        let local_jurisdiction = record
            .jurisdiction
            .as_ref()
            .filter(|j| self.index.has_jurisdiction(j));
        let scope = match local_jurisdiction {
            Some(_) => SearchScope::Local,
            None => SearchScope::Global,
        };

        let query = ScoreQuery::new(&record.raw_name, &self.normalizer);
        let mut scored: Vec<(&IndexedEntity, f32, MatchMethod)> = match local_jurisdiction {
            Some(j) => self
                .index
                .candidates_local(j)
                .filter_map(|c| score_candidate(&query, c).map(|(s, m)| (c, s, m)))
                .collect(),
            None => self
                .index
                .candidates_global()
                .filter_map(|c| score_candidate(&query, c).map(|(s, m)| (c, s, m)))
                .collect(),
        };

        // Stable sort: ties keep registry insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let Some(&(top, top_score, top_method)) = scored.first() else {
            return ResolutionResult::none(scope, None, Vec::new());
        };

        let tier = tier_for(top_score, scope);
        if tier == ConfidenceTier::None {
            // Retain the highest-scoring rejects for review.
            let alternates = alternates_from(&scored, 0, MAX_ALTERNATES);
            return ResolutionResult::none(scope, None, alternates);
        }

        ResolutionResult {
            chosen: Some(top.entity.clone()),
            tier,
            method: Some(top_method),
            alternates: alternates_from(&scored, 1, MAX_ALTERNATES - 1),
            scope,
        }
    }

    /// Supplied-id short-circuit: a direct registry lookup.
    ///
    /// An id absent from the registry (or unparseable) is untrusted
    /// input, not an error; the record stays in the batch.
    fn resolve_supplied(&self, supplied: &str) -> ResolutionResult {
        let entity = LeaId::parse(supplied)
            .ok()
            .and_then(|id| self.index.get(&id));
        match entity {
            Some(entity) => ResolutionResult {
                chosen: Some(entity.clone()),
                tier: ConfidenceTier::Verified,
                method: Some(MatchMethod::Direct),
                alternates: Vec::new(),
                scope: SearchScope::Global,
            },
            None => ResolutionResult::none(
                SearchScope::Global,
                Some(MatchMethod::GivenNotFound),
                Vec::new(),
            ),
        }
    }
}

fn tier_for(score: f32, scope: SearchScope) -> ConfidenceTier {
    match scope {
        SearchScope::Local if score >= STRONG_MATCH => ConfidenceTier::High,
        SearchScope::Global if score >= STRONG_MATCH => ConfidenceTier::Medium,
        SearchScope::Local if score >= WEAK_MATCH => ConfidenceTier::Medium,
        SearchScope::Global if score >= WEAK_MATCH => ConfidenceTier::Low,
        _ => ConfidenceTier::None,
    }
}

fn alternates_from(
    scored: &[(&IndexedEntity, f32, MatchMethod)],
    skip: usize,
    take: usize,
) -> Vec<Alternate> {
    scored
        .iter()
        .skip(skip)
        .take(take)
        .map(|&(candidate, score, method)| Alternate {
            id: candidate.entity.id.clone(),
            name: candidate.entity.primary_name.clone(),
            score,
            method,
        })
        .collect()
}

//! Candidate scoring rules.
//!
//! Scoring is an ordered list of pure rule functions; the first rule
//! that produces a score wins and later rules are never consulted.
//! Every rule is independently unit-testable and the fold over the
//! list is trivially deterministic.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::{NameNormalizer, NormalizedName};
use crate::registry::IndexedEntity;

/// Exact normalized-name match.
pub const SCORE_EXACT_NORM: f32 = 1.0;
/// Exact raw match against the CRM account alias.
pub const SCORE_EXACT_ACCOUNT: f32 = 0.99;
/// Exact normalized match against the alias.
pub const SCORE_EXACT_NORM_ALIAS: f32 = 0.98;
/// One normalized name contains the other.
pub const SCORE_SUBSTRING: f32 = 0.90;
/// Overlap scores below this are discarded outright.
pub const MIN_OVERLAP: f32 = 0.5;
/// Overlap rules require this many input tokens. One-token inputs score
/// artificially high against any candidate sharing a generic word; the
/// exact rules still serve them.
pub const MIN_OVERLAP_INPUT_TOKENS: usize = 2;
/// The substring rule counts a containment only when the contained form
/// carries at least this many tokens. A one-word stem ("richland",
/// "dayton") is contained by every sibling district sharing it.
pub const MIN_SUBSTRING_TOKENS: usize = 2;

/// How a match (or non-match) was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchMethod {
    /// Supplied id found directly in the registry.
    Direct,
    /// Supplied id absent from the registry (untrusted input, not an error).
    GivenNotFound,
    /// Normalized input equals the candidate's normalized primary name.
    ExactNorm,
    /// Raw case-folded input equals the candidate's raw alias.
    ExactAccount,
    /// Normalized input equals the candidate's normalized alias.
    ExactNormAlias,
    /// Either normalized string contains the other.
    Substring,
    /// Token overlap against the primary name.
    WordOverlap,
    /// Token overlap against the alias.
    AliasOverlap,
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Direct => "DIRECT",
            Self::GivenNotFound => "GIVEN_NOT_FOUND",
            Self::ExactNorm => "EXACT_NORM",
            Self::ExactAccount => "EXACT_ACCOUNT",
            Self::ExactNormAlias => "EXACT_NORM_ALIAS",
            Self::Substring => "SUBSTRING",
            Self::WordOverlap => "WORD_OVERLAP",
            Self::AliasOverlap => "ALIAS_OVERLAP",
        };
        write!(f, "{label}")
    }
}

/// The input side of a comparison: raw case-folded form plus the
/// normalized form, computed once per record.
#[derive(Debug, Clone)]
pub struct ScoreQuery {
    /// Raw name, trimmed and lowercased (not normalized).
    pub raw_folded: String,
    /// Normalized name.
    pub norm: NormalizedName,
}

impl ScoreQuery {
    /// Builds the query forms for one raw input name.
    #[must_use]
    pub fn new(raw_name: &str, normalizer: &NameNormalizer) -> Self {
        Self {
            raw_folded: raw_name.trim().to_lowercase(),
            norm: normalizer.normalize(raw_name),
        }
    }
}

/// A single scoring rule: returns a score and method, or nothing.
pub type ScoreRule = fn(&ScoreQuery, &IndexedEntity) -> Option<(f32, MatchMethod)>;

/// The rules, in precedence order. First hit wins.
pub const RULES: &[ScoreRule] = &[
    exact_norm,
    exact_account,
    exact_norm_alias,
    substring,
    overlap,
];

/// Scores one candidate against the query.
#[must_use]
pub fn score_candidate(
    query: &ScoreQuery,
    candidate: &IndexedEntity,
) -> Option<(f32, MatchMethod)> {
    RULES.iter().find_map(|rule| rule(query, candidate))
}

fn exact_norm(query: &ScoreQuery, candidate: &IndexedEntity) -> Option<(f32, MatchMethod)> {
    (!query.norm.is_empty() && query.norm == candidate.norm_primary)
        .then_some((SCORE_EXACT_NORM, MatchMethod::ExactNorm))
}

fn exact_account(query: &ScoreQuery, candidate: &IndexedEntity) -> Option<(f32, MatchMethod)> {
    let alias = candidate.alias_folded.as_deref()?;
    (!alias.is_empty() && query.raw_folded == alias)
        .then_some((SCORE_EXACT_ACCOUNT, MatchMethod::ExactAccount))
}

fn exact_norm_alias(query: &ScoreQuery, candidate: &IndexedEntity) -> Option<(f32, MatchMethod)> {
    let alias = candidate.norm_alias.as_ref()?;
    (!query.norm.is_empty() && query.norm == *alias)
        .then_some((SCORE_EXACT_NORM_ALIAS, MatchMethod::ExactNormAlias))
}

fn substring(query: &ScoreQuery, candidate: &IndexedEntity) -> Option<(f32, MatchMethod)> {
    let input = query.norm.as_str();
    let primary = candidate.norm_primary.as_str();
    if input.is_empty() || primary.is_empty() {
        return None;
    }
    let contained = if primary.contains(input) {
        &query.norm
    } else if input.contains(primary) {
        &candidate.norm_primary
    } else {
        return None;
    };
    (contained.token_set().len() >= MIN_SUBSTRING_TOKENS)
        .then_some((SCORE_SUBSTRING, MatchMethod::Substring))
}

/// Token overlap against the primary name and, separately, the alias;
/// the higher of the two survives if it clears [`MIN_OVERLAP`].
///
/// The denominator is the input token count, not the union: an input
/// should match a candidate that carries all its words plus extra
/// qualifiers (county and city names are the dominant noise pattern).
fn overlap(query: &ScoreQuery, candidate: &IndexedEntity) -> Option<(f32, MatchMethod)> {
    let input_tokens = query.norm.token_set();
    if input_tokens.len() < MIN_OVERLAP_INPUT_TOKENS {
        return None;
    }

    let primary = overlap_score(&input_tokens, &candidate.norm_primary)
        .map(|score| (score, MatchMethod::WordOverlap));
    let alias = candidate
        .norm_alias
        .as_ref()
        .and_then(|alias| overlap_score(&input_tokens, alias))
        .map(|score| (score, MatchMethod::AliasOverlap));

    let best = match (primary, alias) {
        (Some(p), Some(a)) if a.0 > p.0 => a,
        (Some(p), _) => p,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    (best.0 >= MIN_OVERLAP).then_some(best)
}

#[allow(clippy::cast_precision_loss)]
fn overlap_score(input_tokens: &HashSet<&str>, candidate: &NormalizedName) -> Option<f32> {
    if candidate.is_empty() {
        return None;
    }
    let candidate_tokens = candidate.token_set();
    let shared = input_tokens
        .iter()
        .filter(|token| candidate_tokens.contains(**token))
        .count();
    Some(shared as f32 / input_tokens.len().max(1) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CanonicalEntity, LeaId};
    use crate::jurisdiction::Jurisdiction;
    use crate::registry::RegistryIndex;

    fn indexed(name: &str, alias: Option<&str>) -> IndexedEntity {
        let normalizer = NameNormalizer::new();
        let mut entity = CanonicalEntity::new(LeaId::parse("4807530").unwrap(), name)
            .with_jurisdiction(Jurisdiction::new("TX"));
        if let Some(alias) = alias {
            entity = entity.with_alias(alias);
        }
        let index = RegistryIndex::build(vec![entity], &normalizer).unwrap();
        let candidate = index.candidates_global().next().unwrap().clone();
        candidate
    }

    fn query(raw: &str) -> ScoreQuery {
        ScoreQuery::new(raw, &NameNormalizer::new())
    }

    #[test]
    fn test_exact_norm_rule() {
        let candidate = indexed("Alief Independent School District", None);
        let (score, method) = score_candidate(&query("Alief Isd"), &candidate).unwrap();
        assert_eq!(score, SCORE_EXACT_NORM);
        assert_eq!(method, MatchMethod::ExactNorm);
    }

    #[test]
    fn test_exact_account_rule() {
        let candidate = indexed("Raytown C-2 School District", Some("Raytown Quality Schools"));
        let (score, method) = score_candidate(&query("  Raytown Quality Schools "), &candidate).unwrap();
        assert_eq!(score, SCORE_EXACT_ACCOUNT);
        assert_eq!(method, MatchMethod::ExactAccount);
    }

    #[test]
    fn test_exact_norm_alias_rule() {
        // Not a raw alias match, but normalized forms agree.
        let candidate = indexed("Raytown C-2 School District", Some("Raytown Quality School District"));
        let (score, method) = score_candidate(&query("Raytown Quality"), &candidate).unwrap();
        assert_eq!(score, SCORE_EXACT_NORM_ALIAS);
        assert_eq!(method, MatchMethod::ExactNormAlias);
    }

    #[test]
    fn test_substring_rule() {
        let candidate = indexed("Options for Youth-San Juan District", None);
        let (score, method) = score_candidate(&query("Options for Youth"), &candidate).unwrap();
        assert_eq!(score, SCORE_SUBSTRING);
        assert_eq!(method, MatchMethod::Substring);
    }

    #[test]
    fn test_word_overlap_rule() {
        // "greater johnstown" vs "johnstown": one of two input tokens
        // shared -> 0.5, method WORD_OVERLAP.
        let candidate = indexed("Johnstown City School District", None);
        let (score, method) = score_candidate(&query("Greater Johnstown School District"), &candidate).unwrap();
        assert_eq!(method, MatchMethod::WordOverlap);
        assert!((score - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_alias_overlap_beats_weaker_primary_overlap() {
        let candidate = indexed(
            "Acadiana Renaissance Charter Academy",
            Some("Lafayette Renaissance Charter Academy"),
        );
        let (score, method) =
            score_candidate(&query("Lafayette Renaissance Learning Center"), &candidate).unwrap();
        assert_eq!(method, MatchMethod::AliasOverlap);
        assert!(score >= MIN_OVERLAP);
    }

    #[test]
    fn test_substring_requires_two_contained_tokens() {
        // "richland" is contained by "richland two", but a one-word stem
        // is shared by every sibling district; only overlap applies.
        let candidate = indexed("Richland School District 2", None);
        let (score, method) =
            score_candidate(&query("Richland School District Two"), &candidate).unwrap();
        assert_eq!(method, MatchMethod::WordOverlap);
        assert!(score < SCORE_SUBSTRING);
    }

    #[test]
    fn test_overlap_below_threshold_discarded() {
        let candidate = indexed("Lincoln County School District", None);
        assert!(score_candidate(&query("Jefferson Madison Washington Area Schools"), &candidate).is_none());
    }

    #[test]
    fn test_overlap_requires_two_input_tokens() {
        // One shared generic token would score 1.0 with a one-token
        // input; the floor rejects it.
        let candidate = indexed("Lincoln Heights School District", None);
        assert!(score_candidate(&query("Lincoln School District 5"), &candidate).is_none());
    }

    #[test]
    fn test_empty_input_matches_nothing() {
        let candidate = indexed("Alief Independent School District", None);
        assert!(score_candidate(&query(""), &candidate).is_none());
        assert!(score_candidate(&query("School District 99"), &candidate).is_none());
    }

    #[test]
    fn test_rule_precedence_first_hit_wins() {
        // Exact primary match also satisfies substring; EXACT_NORM must win.
        let candidate = indexed("Dayton City School District", Some("Dayton Public Schools"));
        let (score, method) = score_candidate(&query("Dayton"), &candidate).unwrap();
        assert_eq!(method, MatchMethod::ExactNorm);
        assert_eq!(score, SCORE_EXACT_NORM);
    }
}

//! Name normalization for comparison.
//!
//! Free-text district names arrive with organizational suffixes
//! ("Independent School District", "Public Schools"), legal-entity
//! abbreviations ("ISD", "CUSD"), parenthetical annotations, and
//! trailing district numbers ("No. 2", "RE-8", "168"). The normalizer
//! reduces a raw name to the word stem both sides of a comparison share,
//! so "Alief Isd" and "Alief Independent School District" collapse to
//! the same form.
//!
//! Normalization is total over any string and idempotent. An empty
//! result is valid and simply unmatchable.

use std::collections::HashSet;
use std::fmt;

use regex::Regex;

/// Legal-entity abbreviations expanded before suffix stripping, so
/// abbreviated and spelled-out inputs normalize identically.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("isd", "independent school district"),
    ("cusd", "community unit school district"),
    ("usd", "unified school district"),
];

/// Organizational-type suffix vocabulary. Matched longest phrase first,
/// at word boundaries, so shorter phrases never corrupt longer ones.
const SUFFIX_PHRASES: &[&str] = &[
    "school district",
    "public schools",
    "public school district",
    "community school district",
    "community unit school district",
    "unified school district",
    "independent school district",
    "central school district",
    "city school district",
    "community schools",
    "county schools",
    "county school district",
    "county school system",
    "city schools",
    "school corporation",
    "community consolidated school district",
    "consolidated school district",
    "exempted village school district",
    "township school district",
    "borough school district",
    "regional school district",
    "parish school board",
    "area schools",
    "area school district",
    "charter school",
    "charter schools",
    "charter academy",
    "charter",
    "academy",
    "school",
    "schools",
    "unified district",
    "elementary district",
    "high school district",
    "union school district",
    "reorganized school district",
    "school system",
    "supervisory union",
    "municipal schools",
    "public school",
    "school board",
    "elementary school district",
    "union free school district",
    "free school district",
    "enlarged school district",
    "county office of education",
    "county superintendent of schools",
    "office of education",
    "boces",
    "pcs",
    "district",
];

/// A normalized, comparable name form: lowercase alphabetic words.
///
/// Derived per call and never persisted. Used both as a whole string
/// (exact and substring rules) and as a token set (overlap rules).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    /// Returns the normalized string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if nothing survived normalization.
    ///
    /// Empty names never satisfy exact or overlap rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the deduplicated token set.
    #[must_use]
    pub fn token_set(&self) -> HashSet<&str> {
        self.0.split_whitespace().collect()
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonicalizes raw names into [`NormalizedName`]s.
///
/// All patterns are compiled once at construction; `normalize` itself
/// never fails.
///
/// # Examples
///
/// ```
/// use leamatch::NameNormalizer;
///
/// let normalizer = NameNormalizer::new();
/// let a = normalizer.normalize("Alief Isd");
/// let b = normalizer.normalize("Alief Independent School District");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "alief");
/// ```
#[derive(Debug)]
pub struct NameNormalizer {
    parenthetical: Regex,
    abbreviations: Regex,
    suffixes: Regex,
    district_number_tail: Regex,
    bare_number_tail: Regex,
    non_alpha: Regex,
    whitespace: Regex,
}

impl NameNormalizer {
    /// Compiles the normalization patterns.
    #[must_use]
    pub fn new() -> Self {
        let mut phrases: Vec<&str> = SUFFIX_PHRASES.to_vec();
        // Longest first: the alternation prefers earlier branches, so
        // "public school district" wins over "school district".
        phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
        let suffix_pattern = format!(r"\b(?:{})\b", phrases.join("|"));

        let abbrev_pattern = format!(
            r"\b(?:{})\b",
            ABBREVIATIONS
                .iter()
                .map(|(short, _)| *short)
                .collect::<Vec<_>>()
                .join("|")
        );

        // The patterns are static; compilation cannot fail at runtime.
        Self {
            parenthetical: Regex::new(r"\([^)]*\)").expect("static pattern"),
            abbreviations: Regex::new(&abbrev_pattern).expect("static pattern"),
            suffixes: Regex::new(&suffix_pattern).expect("static pattern"),
            district_number_tail: Regex::new(r"\s*#?\s*(?:no\.?\s*)?(?:re-?)?\d+[a-z]?\s*$")
                .expect("static pattern"),
            bare_number_tail: Regex::new(r"\s*\d+[a-z]?\s*$").expect("static pattern"),
            non_alpha: Regex::new(r"[^a-z\s]").expect("static pattern"),
            whitespace: Regex::new(r"\s+").expect("static pattern"),
        }
    }

    /// Normalizes a raw name. Total over any string, never panics.
    #[must_use]
    pub fn normalize(&self, raw: &str) -> NormalizedName {
        let mut s = raw.to_lowercase().trim().to_string();

        // Parenthetical annotations: "(dupe)", "(District)", state tags.
        // Replaced with a space so surrounding words never fuse.
        s = self.parenthetical.replace_all(&s, " ").into_owned();

        // Expand abbreviations before suffix stripping.
        s = self
            .abbreviations
            .replace_all(&s, |caps: &regex::Captures<'_>| {
                let short = caps.get(0).map_or("", |m| m.as_str());
                ABBREVIATIONS
                    .iter()
                    .find(|(abbr, _)| *abbr == short)
                    .map_or(short, |(_, long)| *long)
                    .to_string()
            })
            .into_owned();

        // Remove the suffix vocabulary to a fixpoint: stripping one
        // phrase can expose another ("school charter district").
        loop {
            let next = self.suffixes.replace_all(&s, " ").into_owned();
            if next == s {
                break;
            }
            s = next;
        }

        // Trailing district identifiers: "#1", "No. 2", "RE-8", "201u".
        s = self.district_number_tail.replace(&s, "").into_owned();
        s = self.bare_number_tail.replace(&s, "").into_owned();

        s = self.non_alpha.replace_all(&s, "").into_owned();
        s = self.whitespace.replace_all(&s, " ").trim().to_string();

        NormalizedName::new(s)
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

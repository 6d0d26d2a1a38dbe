//! Jurisdiction codes partitioning the candidate search space.
//!
//! A jurisdiction is the state (or state-equivalent) scope a registry
//! entity belongs to. Hints arriving on input records are untrusted: an
//! unknown code simply selects an empty bucket, which widens the search
//! to the global pool. The sentinel code `INT` marks international
//! records, which are outside the registry's domain entirely.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State FIPS code to postal abbreviation, per the NCES LEAID layout.
const FIPS_TO_ABBREV: &[(&str, &str)] = &[
    ("01", "AL"), ("02", "AK"), ("04", "AZ"), ("05", "AR"), ("06", "CA"),
    ("08", "CO"), ("09", "CT"), ("10", "DE"), ("11", "DC"), ("12", "FL"),
    ("13", "GA"), ("15", "HI"), ("16", "ID"), ("17", "IL"), ("18", "IN"),
    ("19", "IA"), ("20", "KS"), ("21", "KY"), ("22", "LA"), ("23", "ME"),
    ("24", "MD"), ("25", "MA"), ("26", "MI"), ("27", "MN"), ("28", "MS"),
    ("29", "MO"), ("30", "MT"), ("31", "NE"), ("32", "NV"), ("33", "NH"),
    ("34", "NJ"), ("35", "NM"), ("36", "NY"), ("37", "NC"), ("38", "ND"),
    ("39", "OH"), ("40", "OK"), ("41", "OR"), ("42", "PA"), ("44", "RI"),
    ("45", "SC"), ("46", "SD"), ("47", "TN"), ("48", "TX"), ("49", "UT"),
    ("50", "VT"), ("51", "VA"), ("53", "WA"), ("54", "WV"), ("55", "WI"),
    ("56", "WY"), ("60", "AS"), ("66", "GU"), ("69", "MP"), ("72", "PR"),
    ("78", "VI"),
];

/// Full state names accepted by [`Jurisdiction::parse`].
const NAME_TO_ABBREV: &[(&str, &str)] = &[
    ("alabama", "AL"), ("alaska", "AK"), ("arizona", "AZ"), ("arkansas", "AR"),
    ("california", "CA"), ("colorado", "CO"), ("connecticut", "CT"), ("delaware", "DE"),
    ("district of columbia", "DC"), ("florida", "FL"), ("georgia", "GA"), ("hawaii", "HI"),
    ("idaho", "ID"), ("illinois", "IL"), ("indiana", "IN"), ("iowa", "IA"),
    ("kansas", "KS"), ("kentucky", "KY"), ("louisiana", "LA"), ("maine", "ME"),
    ("maryland", "MD"), ("massachusetts", "MA"), ("michigan", "MI"), ("minnesota", "MN"),
    ("mississippi", "MS"), ("missouri", "MO"), ("montana", "MT"), ("nebraska", "NE"),
    ("nevada", "NV"), ("new hampshire", "NH"), ("new jersey", "NJ"), ("new mexico", "NM"),
    ("new york", "NY"), ("north carolina", "NC"), ("north dakota", "ND"), ("ohio", "OH"),
    ("oklahoma", "OK"), ("oregon", "OR"), ("pennsylvania", "PA"), ("rhode island", "RI"),
    ("south carolina", "SC"), ("south dakota", "SD"), ("tennessee", "TN"), ("texas", "TX"),
    ("utah", "UT"), ("vermont", "VT"), ("virginia", "VA"), ("washington", "WA"),
    ("west virginia", "WV"), ("wisconsin", "WI"), ("wyoming", "WY"),
];

/// Sentinel code for international records.
const INTERNATIONAL: &str = "INT";

/// A jurisdiction scope key: an uppercase postal-style code.
///
/// # Examples
///
/// ```
/// use leamatch::Jurisdiction;
///
/// let tx = Jurisdiction::parse("Texas").unwrap();
/// assert_eq!(tx.code(), "TX");
/// assert_eq!(tx, Jurisdiction::new("tx"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jurisdiction(String);

impl Jurisdiction {
    /// Creates a jurisdiction from a code, trimming and uppercasing.
    ///
    /// No validation is performed: unknown codes are legal scope keys
    /// that select an empty candidate bucket.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    /// Parses a jurisdiction from an abbreviation or a full state name.
    ///
    /// Returns `None` for empty input.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        if let Some((_, abbrev)) = NAME_TO_ABBREV.iter().find(|(name, _)| *name == lower) {
            return Some(Self((*abbrev).to_string()));
        }
        Some(Self::new(trimmed))
    }

    /// Looks up a jurisdiction from a two-digit state FIPS code.
    #[must_use]
    pub fn from_fips(fips: &str) -> Option<Self> {
        FIPS_TO_ABBREV
            .iter()
            .find(|(f, _)| *f == fips)
            .map(|(_, abbrev)| Self((*abbrev).to_string()))
    }

    /// Returns the uppercase code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Returns the state FIPS code, if this is a known jurisdiction.
    #[must_use]
    pub fn fips(&self) -> Option<&'static str> {
        FIPS_TO_ABBREV
            .iter()
            .find(|(_, abbrev)| *abbrev == self.0)
            .map(|(fips, _)| *fips)
    }

    /// Returns true for the `INT` international sentinel.
    #[must_use]
    pub fn is_international(&self) -> bool {
        self.0 == INTERNATIONAL
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Jurisdiction {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

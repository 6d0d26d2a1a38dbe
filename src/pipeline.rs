//! Per-record orchestration and run statistics.
//!
//! The pipeline walks the input batch once: screen, resolve, override,
//! emit. One output row is produced per input record regardless of
//! outcome, so the downstream report is always complete. Statistics
//! have a single writer and are finalized when the run ends.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::LeaId;
use crate::jurisdiction::Jurisdiction;
use crate::overrides::{OverrideEntry, OverrideOutcome, OverrideTable};
use crate::resolve::{
    Alternate, ConfidenceTier, InputRecord, MatchResolver, ResolutionResult, SearchScope,
};
use crate::score::MatchMethod;

/// Placeholder rows that appear in source exports but are not
/// organizations at all; matching is skipped for them.
const SENTINEL_NAMES: &[&str] = &[
    "d2c",
    "events & engagement revenue",
    "events and engagement",
    "events & engagement",
];

/// Keywords marking an input as structurally non-K12: universities,
/// dioceses, state agencies, vendors. Screened before resolution.
const NON_K12_KEYWORDS: &[&str] = &[
    "university",
    "college",
    "upward bound",
    "gear up",
    "diocese",
    "metropolitan state",
    "state university",
    "community college",
    "technical college",
    "institute of technology",
    "d2c",
    "events & engagement",
    "events and engagement",
    "department of corrections",
    "board of education",
    "lulac national",
    "united friends",
    "parris foundation",
    "opportunity resource",
    "project stay",
    "learn inc",
    "catherine carlton",
    "methodist home",
];

/// Identifier for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new random run id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final classification of one output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordOutcome {
    /// Empty name or sentinel placeholder; matching skipped.
    Skipped,
    /// International record; outside the registry's domain.
    International,
    /// Caught by the non-K12 keyword screen.
    NonK12,
    /// Supplied id found in the registry.
    Verified,
    /// Supplied id absent from the registry.
    GivenNotFound,
    /// Automated name match.
    Matched(MatchMethod),
    /// No usable automated match.
    NoMatch,
    /// A curated override replaced the automated result.
    Overridden(OverrideOutcome),
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => write!(f, "SKIPPED"),
            Self::International => write!(f, "INTERNATIONAL"),
            Self::NonK12 => write!(f, "NON_K12"),
            Self::Verified => write!(f, "VERIFIED"),
            Self::GivenNotFound => write!(f, "GIVEN_NOT_FOUND"),
            Self::Matched(method) => write!(f, "{method}"),
            Self::NoMatch => write!(f, "NO_MATCH"),
            Self::Overridden(outcome) => write!(f, "{outcome}"),
        }
    }
}

/// One row of the output report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// Input name, verbatim.
    pub raw_name: String,
    /// Input jurisdiction hint, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Jurisdiction>,
    /// Input supplied id, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplied_id: Option<String>,

    /// Matched registry id, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_id: Option<LeaId>,
    /// Matched registry name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,

    /// Final classification.
    pub outcome: RecordOutcome,
    /// Final confidence tier.
    pub tier: ConfidenceTier,
    /// Search scope of the automated pass, where one ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<SearchScope>,
    /// Ranked runners-up from the automated pass.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<Alternate>,
    /// Curator or screen note.
    #[serde(default)]
    pub note: String,

    /// Source fields carried through untouched.
    #[serde(default)]
    pub passthrough: serde_json::Value,
}

/// Per-run counters, single-writer, finalized at run end.
///
/// DUPE rows are tracked separately and excluded from the per-outcome
/// counts and the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Run identifier.
    pub run_id: RunId,
    /// Fingerprint of the registry snapshot this run matched against.
    pub registry_fingerprint: String,
    /// Run start time.
    pub started_at: DateTime<Utc>,
    /// Run end time; set when the run finishes.
    pub finished_at: Option<DateTime<Utc>>,
    /// Rows counted (duplicates excluded).
    pub total: u64,
    /// Duplicate rows excluded from the counts.
    pub dupes: u64,
    /// Rows where a curated override replaced the automated result.
    pub overridden: u64,
    /// Counts per final outcome label.
    pub by_outcome: BTreeMap<String, u64>,
}

impl RunStatistics {
    fn new(registry_fingerprint: String) -> Self {
        Self {
            run_id: RunId::new(),
            registry_fingerprint,
            started_at: Utc::now(),
            finished_at: None,
            total: 0,
            dupes: 0,
            overridden: 0,
            by_outcome: BTreeMap::new(),
        }
    }

    fn record(&mut self, outcome: RecordOutcome) {
        if outcome == RecordOutcome::Overridden(OverrideOutcome::Dupe) {
            self.dupes += 1;
            return;
        }
        self.total += 1;
        if matches!(outcome, RecordOutcome::Overridden(_)) {
            self.overridden += 1;
        }
        *self.by_outcome.entry(outcome.to_string()).or_insert(0) += 1;
    }

    fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

impl fmt::Display for RunStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} records ({} overridden, {} dupes excluded)",
            self.run_id, self.total, self.overridden, self.dupes
        )?;
        for (outcome, count) in &self.by_outcome {
            write!(f, " {outcome}={count}")?;
        }
        Ok(())
    }
}

/// Batch driver: screen, resolve, override, emit.
pub struct Pipeline {
    resolver: MatchResolver,
    overrides: OverrideTable,
}

impl Pipeline {
    /// Creates a pipeline over a resolver and a curated override table.
    #[must_use]
    pub fn new(resolver: MatchResolver, overrides: OverrideTable) -> Self {
        Self {
            resolver,
            overrides,
        }
    }

    /// Processes the batch, emitting one output row per input record.
    #[must_use]
    pub fn run(&self, records: &[InputRecord]) -> (Vec<OutputRecord>, RunStatistics) {
        let mut stats = RunStatistics::new(self.resolver.index().fingerprint());
        info!(
            "resolving {} records against {} registry entities ({} overrides loaded)",
            records.len(),
            self.resolver.index().len(),
            self.overrides.len()
        );

        let mut output = Vec::with_capacity(records.len());
        for record in records {
            let row = self.process(record);
            debug!("'{}' -> {} ({})", row.raw_name, row.outcome, row.tier);
            stats.record(row.outcome);
            output.push(row);
        }

        stats.finish();
        info!("{stats}");
        (output, stats)
    }

    fn process(&self, record: &InputRecord) -> OutputRecord {
        let trimmed = record.raw_name.trim();
        let folded = trimmed.to_lowercase();

        let automated = if trimmed.is_empty() || SENTINEL_NAMES.contains(&folded.as_str()) {
            Automated::screened(RecordOutcome::Skipped, String::new())
        } else if record.jurisdiction.as_ref().is_some_and(Jurisdiction::is_international) {
            Automated::screened(
                RecordOutcome::International,
                "international - outside registry domain".to_string(),
            )
        } else if NON_K12_KEYWORDS.iter().any(|kw| folded.contains(kw)) {
            Automated::screened(
                RecordOutcome::NonK12,
                "university/college/non-K12 entity".to_string(),
            )
        } else {
            Automated::resolved(self.resolver.resolve(record))
        };

        // The override is applied last and unconditionally, including
        // over screened rows.
        let entry = self
            .overrides
            .lookup(&record.raw_name, record.jurisdiction.as_ref());
        match entry {
            Some(entry) => overridden_row(record, &automated, entry),
            None => automated_row(record, automated),
        }
    }
}

/// The automated portion of one row, before the override pass.
struct Automated {
    outcome: RecordOutcome,
    tier: ConfidenceTier,
    resolution: Option<ResolutionResult>,
    note: String,
}

impl Automated {
    fn screened(outcome: RecordOutcome, note: String) -> Self {
        Self {
            outcome,
            tier: ConfidenceTier::None,
            resolution: None,
            note,
        }
    }

    fn resolved(resolution: ResolutionResult) -> Self {
        let outcome = match (resolution.method, &resolution.chosen) {
            (Some(MatchMethod::Direct), _) => RecordOutcome::Verified,
            (Some(MatchMethod::GivenNotFound), _) => RecordOutcome::GivenNotFound,
            (Some(method), Some(_)) => RecordOutcome::Matched(method),
            _ => RecordOutcome::NoMatch,
        };
        Self {
            outcome,
            tier: resolution.tier,
            resolution: Some(resolution),
            note: String::new(),
        }
    }
}

fn automated_row(record: &InputRecord, automated: Automated) -> OutputRecord {
    let (matched_id, matched_name, scope, alternates) = match automated.resolution {
        Some(resolution) => (
            resolution.chosen.as_ref().map(|e| e.id.clone()),
            resolution.chosen.map(|e| e.primary_name),
            Some(resolution.scope),
            resolution.alternates,
        ),
        None => (None, None, None, Vec::new()),
    };

    OutputRecord {
        raw_name: record.raw_name.clone(),
        jurisdiction: record.jurisdiction.clone(),
        supplied_id: record.supplied_id.clone(),
        matched_id,
        matched_name,
        outcome: automated.outcome,
        tier: automated.tier,
        scope,
        alternates,
        note: automated.note,
        passthrough: record.passthrough.clone(),
    }
}

fn overridden_row(
    record: &InputRecord,
    automated: &Automated,
    entry: &OverrideEntry,
) -> OutputRecord {
    OutputRecord {
        raw_name: record.raw_name.clone(),
        jurisdiction: record.jurisdiction.clone(),
        supplied_id: record.supplied_id.clone(),
        matched_id: entry.resolved.as_ref().map(|r| r.id.clone()),
        matched_name: entry.resolved.as_ref().map(|r| r.name.clone()),
        outcome: RecordOutcome::Overridden(entry.outcome),
        tier: entry.confidence,
        scope: automated.resolution.as_ref().map(|r| r.scope),
        alternates: Vec::new(),
        note: entry.note.clone(),
        passthrough: record.passthrough.clone(),
    }
}

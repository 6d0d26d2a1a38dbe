//! # leamatch - District/LEA Entity Resolution
//!
//! leamatch matches free-text organization names from external
//! sales/data-source records against a canonical registry of Local
//! Education Agencies, producing a confidence-tiered match plus ranked
//! alternates. A curated override table deterministically supersedes
//! automated output, one entry per observed mismatch.
//!
//! ## Core Concepts
//!
//! - **CanonicalEntity**: one registry row, identified by a stable [`LeaId`]
//! - **NameNormalizer**: reduces raw names to a comparable token form
//! - **MatchResolver**: scope selection, scoring, ranking, tiering
//! - **OverrideTable**: curated corrections that replace automated output
//! - **Pipeline**: batch driver emitting one output row per input record
//!
//! ## Usage
//!
//! ```rust,ignore
//! use leamatch::{
//!     CanonicalEntity, InputRecord, Jurisdiction, LeaId, MatchResolver,
//!     NameNormalizer, OverrideTable, Pipeline, RegistryIndex,
//! };
//!
//! let normalizer = NameNormalizer::new();
//! let index = RegistryIndex::build(registry_snapshot, &normalizer)?;
//! let pipeline = Pipeline::new(
//!     MatchResolver::new(index, normalizer),
//!     OverrideTable::from_entries(curated_entries)?,
//! );
//! let (rows, stats) = pipeline.run(&input_records);
//! ```
//!
//! The crate owns no I/O: collaborators load the registry snapshot and
//! the override table, and serialize the output rows.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod entity;
pub mod error;
pub mod jurisdiction;
pub mod normalize;

// Matching engine
pub mod overrides;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod score;

// Re-export primary types at crate root for convenience
pub use entity::{CanonicalEntity, LeaId};
pub use error::{MatchError, MatchResult, SetupError, ValidationError};
pub use jurisdiction::Jurisdiction;
pub use normalize::{NameNormalizer, NormalizedName};
pub use overrides::{OverrideEntry, OverrideOutcome, OverrideTable, ResolvedOverride};
pub use pipeline::{OutputRecord, Pipeline, RecordOutcome, RunId, RunStatistics};
pub use registry::{IndexedEntity, RegistryIndex};
pub use resolve::{
    Alternate, ConfidenceTier, InputRecord, MatchResolver, ResolutionResult, SearchScope,
};
pub use score::{MatchMethod, ScoreQuery};

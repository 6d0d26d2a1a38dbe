//! Jurisdiction-partitioned index over the registry snapshot.
//!
//! Built once per run. Every entity lives in the global pool; entities
//! with a jurisdiction additionally live in exactly one jurisdiction
//! bucket. Candidate iteration order is registry insertion order, which
//! is what makes score ties deterministic downstream.

use std::collections::HashMap;

use crate::entity::{CanonicalEntity, LeaId};
use crate::error::{MatchResult, SetupError, ValidationError};
use crate::jurisdiction::Jurisdiction;
use crate::normalize::{NameNormalizer, NormalizedName};

/// A registry entity with its precomputed comparison forms.
#[derive(Debug, Clone)]
pub struct IndexedEntity {
    /// The canonical registry row.
    pub entity: CanonicalEntity,
    /// Normalized primary name.
    pub norm_primary: NormalizedName,
    /// Normalized alias, where an alias exists.
    pub norm_alias: Option<NormalizedName>,
    /// Raw alias, trimmed and case-folded, for the exact-account rule.
    pub alias_folded: Option<String>,
}

/// Read-only lookup structure over one registry snapshot.
///
/// # Examples
///
/// ```
/// use leamatch::{CanonicalEntity, Jurisdiction, LeaId, NameNormalizer, RegistryIndex};
///
/// let normalizer = NameNormalizer::new();
/// let entities = vec![
///     CanonicalEntity::new(LeaId::parse("4807530").unwrap(), "Alief Independent School District")
///         .with_jurisdiction(Jurisdiction::new("TX")),
/// ];
/// let index = RegistryIndex::build(entities, &normalizer).unwrap();
/// assert_eq!(index.len(), 1);
/// ```
#[derive(Debug)]
pub struct RegistryIndex {
    records: Vec<IndexedEntity>,
    by_id: HashMap<LeaId, usize>,
    by_jurisdiction: HashMap<Jurisdiction, Vec<usize>>,
}

impl RegistryIndex {
    /// Builds the index from a registry snapshot.
    ///
    /// Fails on an empty snapshot, a duplicate id, or an entity with an
    /// empty primary name; all are fatal setup conditions.
    pub fn build(
        entities: Vec<CanonicalEntity>,
        normalizer: &NameNormalizer,
    ) -> MatchResult<Self> {
        if entities.is_empty() {
            return Err(SetupError::EmptyRegistry.into());
        }

        let mut records = Vec::with_capacity(entities.len());
        let mut by_id = HashMap::with_capacity(entities.len());
        let mut by_jurisdiction: HashMap<Jurisdiction, Vec<usize>> = HashMap::new();

        for entity in entities {
            if entity.primary_name.trim().is_empty() {
                return Err(ValidationError::EmptyPrimaryName {
                    id: entity.id.as_str().to_string(),
                }
                .into());
            }

            let idx = records.len();
            if by_id.insert(entity.id.clone(), idx).is_some() {
                return Err(SetupError::DuplicateEntityId {
                    id: entity.id.as_str().to_string(),
                }
                .into());
            }

            if let Some(jurisdiction) = &entity.jurisdiction {
                by_jurisdiction
                    .entry(jurisdiction.clone())
                    .or_default()
                    .push(idx);
            }

            let norm_primary = normalizer.normalize(&entity.primary_name);
            let norm_alias = entity
                .alias_name
                .as_deref()
                .map(|alias| normalizer.normalize(alias));
            let alias_folded = entity
                .alias_name
                .as_deref()
                .map(|alias| alias.trim().to_lowercase());

            records.push(IndexedEntity {
                entity,
                norm_primary,
                norm_alias,
                alias_folded,
            });
        }

        Ok(Self {
            records,
            by_id,
            by_jurisdiction,
        })
    }

    /// Returns the entity for an id, if present.
    #[must_use]
    pub fn get(&self, id: &LeaId) -> Option<&CanonicalEntity> {
        self.by_id.get(id).map(|&idx| &self.records[idx].entity)
    }

    /// Returns true if the jurisdiction has a non-empty candidate bucket.
    #[must_use]
    pub fn has_jurisdiction(&self, jurisdiction: &Jurisdiction) -> bool {
        self.by_jurisdiction
            .get(jurisdiction)
            .is_some_and(|bucket| !bucket.is_empty())
    }

    /// Iterates a jurisdiction's candidates in registry order.
    pub fn candidates_local<'a>(
        &'a self,
        jurisdiction: &Jurisdiction,
    ) -> impl Iterator<Item = &'a IndexedEntity> {
        self.by_jurisdiction
            .get(jurisdiction)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&idx| &self.records[idx])
    }

    /// Iterates the global candidate pool in registry order.
    pub fn candidates_global(&self) -> impl Iterator<Item = &IndexedEntity> {
        self.records.iter()
    }

    /// Number of entities in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the snapshot holds no entities.
    ///
    /// Unreachable through [`RegistryIndex::build`], which rejects empty
    /// snapshots, but kept for API completeness.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable blake3 fingerprint of the snapshot.
    ///
    /// Two runs that report the same fingerprint matched against the
    /// same registry content in the same order.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for record in &self.records {
            hasher.update(record.entity.id.as_str().as_bytes());
            hasher.update(b"\x1f");
            hasher.update(record.entity.primary_name.as_bytes());
            hasher.update(b"\x1f");
            if let Some(alias) = &record.entity.alias_name {
                hasher.update(alias.as_bytes());
            }
            hasher.update(b"\x1f");
            if let Some(jurisdiction) = &record.entity.jurisdiction {
                hasher.update(jurisdiction.code().as_bytes());
            }
            hasher.update(b"\x1e");
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, name: &str, jurisdiction: Option<&str>) -> CanonicalEntity {
        let mut e = CanonicalEntity::new(LeaId::parse(id).unwrap(), name);
        if let Some(j) = jurisdiction {
            e = e.with_jurisdiction(Jurisdiction::new(j));
        }
        e
    }

    fn build(entities: Vec<CanonicalEntity>) -> MatchResult<RegistryIndex> {
        RegistryIndex::build(entities, &NameNormalizer::new())
    }

    #[test]
    fn test_empty_snapshot_rejected() {
        let err = build(vec![]).unwrap_err();
        assert!(err.is_setup());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let err = build(vec![
            entity("4807530", "Alief Independent School District", Some("TX")),
            entity("4807530", "Alief ISD (again)", Some("TX")),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::MatchError::Setup(SetupError::DuplicateEntityId { .. })
        ));
    }

    #[test]
    fn test_empty_primary_name_rejected() {
        let err = build(vec![entity("4807530", "   ", Some("TX"))]).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_id_lookup() {
        let index = build(vec![
            entity("4807530", "Alief Independent School District", Some("TX")),
            entity("3904384", "Dayton City School District", Some("OH")),
        ])
        .unwrap();

        let id = LeaId::parse("3904384").unwrap();
        assert_eq!(index.get(&id).unwrap().primary_name, "Dayton City School District");
        assert!(index.get(&LeaId::parse("9999999").unwrap()).is_none());
    }

    #[test]
    fn test_jurisdiction_buckets() {
        let index = build(vec![
            entity("4807530", "Alief Independent School District", Some("TX")),
            entity("4811550", "Brownsville Independent School District", Some("TX")),
            entity("3904384", "Dayton City School District", Some("OH")),
            entity("0100005", "Statewide Virtual Program", None),
        ])
        .unwrap();

        let tx = Jurisdiction::new("TX");
        assert!(index.has_jurisdiction(&tx));
        assert_eq!(index.candidates_local(&tx).count(), 2);
        assert!(!index.has_jurisdiction(&Jurisdiction::new("CA")));
        assert_eq!(index.candidates_local(&Jurisdiction::new("CA")).count(), 0);

        // Every entity lives in the global pool, bucketed or not.
        assert_eq!(index.candidates_global().count(), 4);
    }

    #[test]
    fn test_precomputed_forms() {
        let index = build(vec![entity("3904384", "Dayton City School District", Some("OH"))
            .with_alias("Dayton Public Schools")])
        .unwrap();

        let record = index.candidates_global().next().unwrap();
        assert_eq!(record.norm_primary.as_str(), "dayton");
        assert_eq!(record.norm_alias.as_ref().unwrap().as_str(), "dayton");
        assert_eq!(record.alias_folded.as_deref(), Some("dayton public schools"));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive_and_stable() {
        let a = build(vec![
            entity("4807530", "Alief Independent School District", Some("TX")),
            entity("3904384", "Dayton City School District", Some("OH")),
        ])
        .unwrap();
        let b = build(vec![
            entity("4807530", "Alief Independent School District", Some("TX")),
            entity("3904384", "Dayton City School District", Some("OH")),
        ])
        .unwrap();
        let c = build(vec![
            entity("3904384", "Dayton City School District", Some("OH")),
            entity("4807530", "Alief Independent School District", Some("TX")),
        ])
        .unwrap();

        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }
}

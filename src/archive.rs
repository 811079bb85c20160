//! The topology archive: a content-addressed map from canonical genomes
//! to net identifiers. The archive is an explicit handle constructed at
//! startup and passed through the pipeline; there is no process-global
//! state.

use std::collections::BTreeMap;
use std::path::Path;

use log::warn;
use rayon::prelude::*;
use thiserror::Error;

use crate::io::{arc, Error as IoError};
use crate::topology::{canonical_genome, parse_genome};

/// Nets whose unstable equilibrium placement is known to defeat the
/// archival round-trip; validation failures for these are expected.
pub const KNOWN_UNSTABLE: &[&str] = &["sxt", "llw-z"];

pub fn is_known_unstable(id: &str) -> bool {
    id.split(", ").any(|alias| KNOWN_UNSTABLE.contains(&alias))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("identifier '{id}' already maps to a different genome")]
    IdTaken { id: String },

    #[error("genome is already archived under '{existing}'")]
    GenomeTaken { existing: String },
}

/// One failed entry from [`Archive::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub id: String,
    pub archived: String,
    /// The re-canonicalized genome, or the error that prevented it.
    pub computed: Result<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct Archive {
    by_genome: BTreeMap<String, String>,
    by_id: BTreeMap<String, String>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// The starter archive embedded in the binary.
    pub fn builtin() -> Self {
        let contents = arc::read(include_str!("data/known.arc").as_bytes())
            .expect("embedded archive is well-formed");
        Self::from_contents(contents)
    }

    pub fn load(path: &Path) -> Result<Self, IoError> {
        Ok(Self::from_contents(arc::read_file(path)?))
    }

    /// Builds the archive from parsed contents. Keys of external
    /// (unstamped) archives are re-canonicalized; entries whose genome
    /// cannot be canonicalized are skipped with a warning.
    pub fn from_contents(contents: arc::ArcContents) -> Self {
        let external = contents.is_external();
        let mut archive = Self::new();
        for (genome, id) in contents.entries {
            let key = if external {
                match recanonicalize(&genome) {
                    Ok(key) => key,
                    Err(details) => {
                        warn!("skipping archive entry '{}': {}", id, details);
                        continue;
                    }
                }
            } else {
                genome
            };
            archive.insert_merging(&id, &key);
        }
        archive
    }

    pub fn len(&self) -> usize {
        self.by_genome.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_genome.is_empty()
    }

    /// The identifier (with aliases) archived for a canonical genome.
    pub fn lookup(&self, genome: &str) -> Option<&str> {
        self.by_genome.get(genome).map(String::as_str)
    }

    /// The genome archived for an identifier or any of its aliases.
    pub fn reverse_lookup(&self, id: &str) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_genome
            .iter()
            .map(|(g, i)| (g.as_str(), i.as_str()))
    }

    /// Inserts an entry, rejecting any clash with existing mappings.
    pub fn insert(&mut self, id: &str, genome: &str) -> Result<(), ConflictError> {
        if let Some(existing) = self.by_genome.get(genome) {
            if existing != id {
                return Err(ConflictError::GenomeTaken {
                    existing: existing.clone(),
                });
            }
        }
        for alias in id.split(", ") {
            if let Some(existing) = self.by_id.get(alias) {
                if existing != genome {
                    return Err(ConflictError::IdTaken {
                        id: alias.to_string(),
                    });
                }
            }
        }
        self.insert_override(id, genome);
        Ok(())
    }

    /// Inserts an entry, displacing whatever it clashes with in either
    /// direction.
    pub fn insert_override(&mut self, id: &str, genome: &str) {
        for alias in id.split(", ") {
            if let Some(old_genome) = self.by_id.remove(alias) {
                if old_genome != genome {
                    if let Some(old_id) = self.by_genome.remove(&old_genome) {
                        for stale in old_id.split(", ") {
                            self.by_id.remove(stale);
                        }
                    }
                }
            }
        }
        if let Some(old_id) = self.by_genome.insert(genome.to_string(), id.to_string()) {
            for stale in old_id.split(", ") {
                self.by_id.remove(stale);
            }
        }
        for alias in id.split(", ") {
            self.by_id.insert(alias.to_string(), genome.to_string());
        }
    }

    /// Inserts an entry, concatenating identifiers (`", "`-separated,
    /// deduplicated) when the genome is already archived.
    pub fn insert_merging(&mut self, id: &str, genome: &str) {
        let merged = match self.by_genome.get(genome) {
            Some(existing) => {
                let mut aliases: Vec<&str> = existing.split(", ").collect();
                for alias in id.split(", ") {
                    if !aliases.contains(&alias) {
                        aliases.push(alias);
                    }
                }
                aliases.join(", ")
            }
            None => id.to_string(),
        };
        self.insert_override(&merged, genome);
    }

    /// Merges another archive into this one, combining aliases.
    pub fn merge(&mut self, other: &Archive) {
        for (genome, id) in other.iter() {
            self.insert_merging(id, genome);
        }
    }

    /// Writes the archive in the stamped format.
    pub fn write_to(&self, path: &Path) -> Result<(), IoError> {
        arc::write_file(path, self.iter())
    }

    /// Re-canonicalizes every key and reports mismatches. Entries for
    /// [`KNOWN_UNSTABLE`] identifiers are still reported; callers decide
    /// whether to treat them as expected failures.
    pub fn validate(&self) -> Vec<ValidationFailure> {
        self.by_genome
            .par_iter()
            .filter_map(|(genome, id)| match recanonicalize(genome) {
                Ok(computed) if computed == *genome => None,
                computed => Some(ValidationFailure {
                    id: id.clone(),
                    archived: genome.clone(),
                    computed,
                }),
            })
            .collect()
    }
}

fn recanonicalize(genome: &str) -> Result<String, String> {
    let graph = parse_genome(genome).map_err(|e| e.to_string())?;
    if !graph.is_connected() {
        return Err("genome graph is disconnected".to_string());
    }
    canonical_genome(&graph)
        .map(|net| net.genome)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_archive_loads_and_validates() {
        let archive = Archive::builtin();
        assert_eq!(archive.len(), 8);
        assert!(archive.reverse_lookup("dia").is_some());
        assert!(archive.reverse_lookup("pcu").is_some());
        // After load-time re-canonicalization every key is a fixpoint.
        assert!(archive.validate().is_empty());
    }

    #[test]
    fn builtin_keys_are_canonical_not_raw() {
        let archive = Archive::builtin();
        let dia_key = archive.reverse_lookup("dia").unwrap();
        assert_eq!(archive.lookup(dia_key), Some("dia"));
    }

    #[test]
    fn insert_detects_conflicts() {
        let mut archive = Archive::new();
        archive.insert("dia", "3 1 2 0 0 0").unwrap();
        assert_eq!(
            archive.insert("dia", "3 1 2 0 0 1"),
            Err(ConflictError::IdTaken { id: "dia".into() })
        );
        assert_eq!(
            archive.insert("other", "3 1 2 0 0 0"),
            Err(ConflictError::GenomeTaken {
                existing: "dia".into()
            })
        );
        // Re-inserting the identical pair is fine.
        archive.insert("dia", "3 1 2 0 0 0").unwrap();
    }

    #[test]
    fn insert_override_displaces_stale_aliases() {
        let mut archive = Archive::new();
        archive.insert("sra, ABW", "3 1 2 0 0 0").unwrap();
        assert_eq!(archive.reverse_lookup("ABW"), Some("3 1 2 0 0 0"));
        archive.insert_override("sra", "3 1 2 0 0 1");
        assert_eq!(archive.lookup("3 1 2 0 0 1"), Some("sra"));
        assert_eq!(archive.lookup("3 1 2 0 0 0"), None);
        assert_eq!(archive.reverse_lookup("ABW"), None);
    }

    #[test]
    fn merging_concatenates_aliases() {
        let mut a = Archive::new();
        a.insert("sra", "3 1 2 0 0 0").unwrap();
        let mut b = Archive::new();
        b.insert("ABW", "3 1 2 0 0 0").unwrap();
        a.merge(&b);
        assert_eq!(a.lookup("3 1 2 0 0 0"), Some("sra, ABW"));
        assert_eq!(a.reverse_lookup("ABW"), Some("3 1 2 0 0 0"));
        assert_eq!(a.reverse_lookup("sra"), Some("3 1 2 0 0 0"));
    }

    #[test]
    fn unstable_allow_list_matches_aliases() {
        assert!(is_known_unstable("sxt"));
        assert!(is_known_unstable("llw-z, something"));
        assert!(!is_known_unstable("dia"));
    }

    #[test]
    fn unstable_entries_fail_validation_expectedly() {
        // An entry archived under a non-canonical key (here: the legacy
        // form without a vertex count, which serialization never emits)
        // must show up in validate(). Filtering by the unstable
        // allow-list is how callers tolerate it; asserting that it is
        // STILL failing means a fix would be noticed, not suppressed.
        let mut archive = Archive::new();
        archive
            .insert("sxt", "3 1 2 0 0 0 1 2 0 0 1 1 2 0 1 0 1 2 1 0 0")
            .unwrap();
        let failures = archive.validate();
        let unexpected: Vec<_> = failures
            .iter()
            .filter(|f| !is_known_unstable(&f.id))
            .collect();
        assert!(unexpected.is_empty());
        assert_eq!(failures.len(), 1, "expected failure no longer fails");
    }
}

//! Dependency classification
//!
//! Takes the usage sets produced by bytecode scanning and partitions the
//! project's dependencies into four views:
//!
//! 1. **Used and declared** - referenced by compiled output, present in
//!    the dependency list
//! 2. **Used but undeclared** - referenced, but only reachable as a
//!    transitive dependency
//! 3. **Declared but unused** - in the dependency list, never referenced
//! 4. **Test-only with non-test scope** - only test code needs them, yet
//!    they are declared with compile scope

pub mod analyzer;
pub mod index;

pub use analyzer::ProjectDependencyAnalyzer;
pub use index::ArtifactClassIndex;

use std::collections::{BTreeMap, BTreeSet};

use crate::artifact::{Artifact, Scope};
use crate::error::{AnalyzerError, Result};
use crate::usage::ReferenceSet;

/// Immutable outcome of one dependency analysis.
///
/// The used/unused views partition the declared dependency set: their
/// keys are disjoint and union to everything declared. Transforms return
/// new instances and never mutate in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDependencyAnalysis {
    used_declared: BTreeMap<Artifact, ReferenceSet>,
    used_undeclared: BTreeMap<Artifact, ReferenceSet>,
    unused_declared: BTreeSet<Artifact>,
    test_artifacts_with_non_test_scope: BTreeSet<Artifact>,
}

impl ProjectDependencyAnalysis {
    pub fn new(
        used_declared: BTreeMap<Artifact, ReferenceSet>,
        used_undeclared: BTreeMap<Artifact, ReferenceSet>,
        unused_declared: BTreeSet<Artifact>,
        test_artifacts_with_non_test_scope: BTreeSet<Artifact>,
    ) -> Self {
        Self {
            used_declared,
            used_undeclared,
            unused_declared,
            test_artifacts_with_non_test_scope,
        }
    }

    /// Declared dependencies the compiled output references, with the
    /// usage pairs that prove it.
    pub fn used_declared(&self) -> &BTreeMap<Artifact, ReferenceSet> {
        &self.used_declared
    }

    /// Referenced artifacts that are only on the classpath transitively,
    /// with the offending usage pairs.
    pub fn used_undeclared(&self) -> &BTreeMap<Artifact, ReferenceSet> {
        &self.used_undeclared
    }

    /// Declared dependencies nothing references.
    pub fn unused_declared(&self) -> &BTreeSet<Artifact> {
        &self.unused_declared
    }

    /// Dependencies only test code uses, declared with compile scope.
    pub fn test_artifacts_with_non_test_scope(&self) -> &BTreeSet<Artifact> {
        &self.test_artifacts_with_non_test_scope
    }

    /// True when any view besides used-declared is non-empty.
    pub fn has_warnings(&self) -> bool {
        !self.used_undeclared.is_empty()
            || !self.unused_declared.is_empty()
            || !self.test_artifacts_with_non_test_scope.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.used_undeclared.len()
            + self.unused_declared.len()
            + self.test_artifacts_with_non_test_scope.len()
    }

    /// Drop every non-compile artifact from the unused view. Runtime,
    /// provided and test dependencies are invisible to bytecode
    /// analysis, so reporting them as unused is mostly noise.
    pub fn ignore_non_compile(&self) -> Self {
        let mut next = self.clone();
        next.unused_declared
            .retain(|artifact| artifact.scope == Scope::Compile);
        next
    }

    /// Move each `group:artifact` id from the unused view into the used
    /// view, with an empty usage set. Ids that cannot be moved fail the
    /// whole transform with one aggregated error: ids naming nothing in
    /// the declared set, and ids naming artifacts already detected as
    /// used.
    pub fn force_declared_dependencies_usage(&self, ids: &[String]) -> Result<Self> {
        let mut not_declared = Vec::new();
        let mut already_used = Vec::new();
        for id in ids {
            let in_unused = self
                .unused_declared
                .iter()
                .any(|artifact| artifact.conflict_id() == *id);
            if in_unused {
                continue;
            }
            let in_used = self
                .used_declared
                .keys()
                .any(|artifact| artifact.conflict_id() == *id);
            if in_used {
                if !already_used.contains(id) {
                    already_used.push(id.clone());
                }
            } else if !not_declared.contains(id) {
                not_declared.push(id.clone());
            }
        }
        if !not_declared.is_empty() || !already_used.is_empty() {
            return Err(AnalyzerError::ForceUsage {
                not_declared,
                already_used,
            });
        }

        let mut next = self.clone();
        let forced: Vec<Artifact> = next
            .unused_declared
            .iter()
            .filter(|artifact| ids.iter().any(|id| artifact.conflict_id() == *id))
            .cloned()
            .collect();
        for artifact in forced {
            next.unused_declared.remove(&artifact);
            next.used_declared.insert(artifact, ReferenceSet::new());
        }
        Ok(next)
    }
}

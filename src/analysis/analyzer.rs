//! Project-level usage analysis
//!
//! Orchestrates one full run: index the classpath, scan the main and
//! test compiled output (plus `web.xml` for war projects), then run the
//! set algebra that classifies every declared dependency.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info};

use super::index::ArtifactClassIndex;
use super::ProjectDependencyAnalysis;
use crate::artifact::{Artifact, Scope};
use crate::classfile;
use crate::config::ProjectModel;
use crate::discovery;
use crate::error::{AnalyzerError, Result};
use crate::exclusion::ExclusionPatterns;
use crate::usage::ReferenceSet;
use crate::webapp;

/// Artifacts whose classes shipped with the JDK long ago. References to
/// their classes resolve against the runtime, so usage attributed to
/// them is dropped instead of reported.
const JDK_SUPERSEDED: [(&str, &str); 2] = [("xml-apis", "xml-apis"), ("xerces", "xmlParserAPIs")];

fn is_superseded_by_jdk(artifact: &Artifact) -> bool {
    JDK_SUPERSEDED
        .iter()
        .any(|(group, name)| artifact.group_id == *group && artifact.artifact_id == *name)
}

/// Scans a project's compiled output and classifies its dependencies.
pub struct ProjectDependencyAnalyzer {
    exclusions: ExclusionPatterns,
    /// Scan class files on the rayon pool
    parallel: bool,
}

impl ProjectDependencyAnalyzer {
    pub fn new() -> Self {
        Self {
            exclusions: ExclusionPatterns::default(),
            parallel: true,
        }
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionPatterns) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the full analysis for one project.
    pub fn analyze(&self, project: &ProjectModel) -> Result<ProjectDependencyAnalysis> {
        let index = ArtifactClassIndex::build(&project.indexed_entries(), &self.exclusions)?;
        info!("Indexed {} classpath artifacts", index.len());

        let mut main_usage = self.scan_output(&project.classes_dir)?;
        if let Some(web_xml) = &project.web_xml {
            let descriptor_usage = webapp::web_xml_usages(web_xml, &self.exclusions)?;
            debug!(
                "web descriptor contributed {} references",
                descriptor_usage.len()
            );
            main_usage.extend(descriptor_usage);
        }
        let test_usage = self.scan_output(&project.test_classes_dir)?;
        info!(
            "Collected {} main and {} test references",
            main_usage.len(),
            test_usage.len()
        );

        let declared = project.declared_artifacts();
        let analysis = classify(&index, &declared, &main_usage, &test_usage);
        info!(
            "Classified dependencies: {} used, {} undeclared, {} unused, {} mis-scoped",
            analysis.used_declared().len(),
            analysis.used_undeclared().len(),
            analysis.unused_declared().len(),
            analysis.test_artifacts_with_non_test_scope().len()
        );
        Ok(analysis)
    }

    /// Scan one compiled-output directory into a reference set. A
    /// missing directory is an empty scan, not an error: modules without
    /// test sources have no test-classes directory at all.
    fn scan_output(&self, dir: &Path) -> Result<ReferenceSet> {
        let entries = match discovery::find_classes(dir) {
            Ok(entries) => entries,
            Err(AnalyzerError::UnresolvedBinary { path }) => {
                debug!("no compiled output at {}, skipping", path.display());
                return Ok(ReferenceSet::new());
            }
            Err(other) => return Err(other),
        };
        debug!("scanning {} classes under {}", entries.len(), dir.display());

        if self.parallel {
            entries
                .par_iter()
                .map(|entry| {
                    classfile::scan_class(&entry.class_name, &entry.bytes, &self.exclusions)
                })
                .try_reduce(ReferenceSet::new, |mut merged, refs| {
                    merged.extend(refs);
                    Ok(merged)
                })
        } else {
            let mut merged = ReferenceSet::new();
            for entry in &entries {
                merged.extend(classfile::scan_class(
                    &entry.class_name,
                    &entry.bytes,
                    &self.exclusions,
                )?);
            }
            Ok(merged)
        }
    }
}

impl Default for ProjectDependencyAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Attribute each usage to the first classpath artifact providing its
/// class. Usage of JDK-superseded artifacts is consumed here: the first
/// match wins even when it is superseded, and the usage is then dropped
/// rather than attributed to a later artifact.
fn attribute_usage(
    index: &ArtifactClassIndex,
    usage: &ReferenceSet,
) -> BTreeMap<Artifact, ReferenceSet> {
    let mut attributed: BTreeMap<Artifact, ReferenceSet> = BTreeMap::new();
    for pair in usage {
        if let Some(artifact) = index.find_artifact(&pair.dependency_class) {
            if is_superseded_by_jdk(artifact) {
                continue;
            }
            attributed
                .entry(artifact.clone())
                .or_default()
                .insert(pair.clone());
        }
    }
    attributed
}

/// Pure classification over already-collected reference sets.
fn classify(
    index: &ArtifactClassIndex,
    declared: &[&Artifact],
    main_usage: &ReferenceSet,
    test_usage: &ReferenceSet,
) -> ProjectDependencyAnalysis {
    let mut all_usage = main_usage.clone();
    all_usage.extend(test_usage.iter().cloned());
    let used_artifacts = attribute_usage(index, &all_usage);

    let main_used_ids: BTreeSet<String> = attribute_usage(index, main_usage)
        .keys()
        .map(Artifact::conflict_id)
        .collect();

    // Test-only usage: test references to classes main never touches.
    let main_classes: BTreeSet<&str> = main_usage
        .iter()
        .map(|pair| pair.dependency_class.as_str())
        .collect();
    let test_only_usage: ReferenceSet = test_usage
        .iter()
        .filter(|pair| !main_classes.contains(pair.dependency_class.as_str()))
        .cloned()
        .collect();
    let test_only_artifacts: BTreeSet<Artifact> = attribute_usage(index, &test_only_usage)
        .into_keys()
        .filter(|artifact| !main_used_ids.contains(&artifact.conflict_id()))
        .collect();

    let declared_ids: BTreeSet<String> = declared.iter().map(|a| a.conflict_id()).collect();
    let used_ids: BTreeSet<String> = used_artifacts.keys().map(Artifact::conflict_id).collect();

    // Used-declared keeps the declared artifact value (its scope and
    // version), folding in usage detail matched by conflict id.
    let mut used_declared: BTreeMap<Artifact, ReferenceSet> = BTreeMap::new();
    for artifact in declared {
        let id = artifact.conflict_id();
        if !used_ids.contains(&id) {
            continue;
        }
        let mut detail = ReferenceSet::new();
        for (used, usage) in &used_artifacts {
            if used.conflict_id() == id {
                detail.extend(usage.iter().cloned());
            }
        }
        used_declared.insert((*artifact).clone(), detail);
    }

    let used_undeclared: BTreeMap<Artifact, ReferenceSet> = used_artifacts
        .into_iter()
        .filter(|(artifact, _)| !declared_ids.contains(&artifact.conflict_id()))
        .collect();

    let unused_declared: BTreeSet<Artifact> = declared
        .iter()
        .filter(|artifact| !used_ids.contains(&artifact.conflict_id()))
        .map(|artifact| (*artifact).clone())
        .collect();

    let test_artifacts_with_non_test_scope: BTreeSet<Artifact> = test_only_artifacts
        .into_iter()
        .filter(|artifact| artifact.scope == Scope::Compile)
        .collect();

    ProjectDependencyAnalysis::new(
        used_declared,
        used_undeclared,
        unused_declared,
        test_artifacts_with_non_test_scope,
    )
}

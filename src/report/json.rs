//! JSON reporter for machine-readable output

use std::fs;
use std::path::PathBuf;

use serde::Serialize;

use crate::analysis::ProjectDependencyAnalysis;
use crate::artifact::Artifact;
use crate::error::{AnalyzerError, Result};
use crate::usage::ReferenceSet;

/// Writes the analysis as a JSON document, to a file or stdout.
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    used_declared: Vec<ArtifactUsage<'a>>,
    used_undeclared: Vec<ArtifactUsage<'a>>,
    unused_declared: Vec<Coordinates<'a>>,
    test_artifacts_with_non_test_scope: Vec<Coordinates<'a>>,
    summary: Summary,
}

#[derive(Serialize)]
struct Coordinates<'a> {
    group: &'a str,
    artifact: &'a str,
    version: &'a str,
    scope: &'a str,
    kind: &'a str,
}

impl<'a> From<&'a Artifact> for Coordinates<'a> {
    fn from(artifact: &'a Artifact) -> Self {
        Self {
            group: &artifact.group_id,
            artifact: &artifact.artifact_id,
            version: &artifact.version,
            scope: artifact.scope.as_str(),
            kind: &artifact.kind,
        }
    }
}

#[derive(Serialize)]
struct ArtifactUsage<'a> {
    #[serde(flatten)]
    coordinates: Coordinates<'a>,
    usages: Vec<UsagePair<'a>>,
}

#[derive(Serialize)]
struct UsagePair<'a> {
    class: &'a str,
    used_by: &'a str,
}

#[derive(Serialize)]
struct Summary {
    used_declared: usize,
    used_undeclared: usize,
    unused_declared: usize,
    test_artifacts_with_non_test_scope: usize,
}

fn artifact_usages<'a>(view: &'a ReferenceSet) -> Vec<UsagePair<'a>> {
    view.iter()
        .map(|pair| UsagePair {
            class: &pair.dependency_class,
            used_by: &pair.used_by,
        })
        .collect()
}

fn build_report(analysis: &ProjectDependencyAnalysis) -> JsonReport<'_> {
    JsonReport {
        used_declared: analysis
            .used_declared()
            .iter()
            .map(|(artifact, usage)| ArtifactUsage {
                coordinates: artifact.into(),
                usages: artifact_usages(usage),
            })
            .collect(),
        used_undeclared: analysis
            .used_undeclared()
            .iter()
            .map(|(artifact, usage)| ArtifactUsage {
                coordinates: artifact.into(),
                usages: artifact_usages(usage),
            })
            .collect(),
        unused_declared: analysis.unused_declared().iter().map(Into::into).collect(),
        test_artifacts_with_non_test_scope: analysis
            .test_artifacts_with_non_test_scope()
            .iter()
            .map(Into::into)
            .collect(),
        summary: Summary {
            used_declared: analysis.used_declared().len(),
            used_undeclared: analysis.used_undeclared().len(),
            unused_declared: analysis.unused_declared().len(),
            test_artifacts_with_non_test_scope: analysis
                .test_artifacts_with_non_test_scope()
                .len(),
        },
    }
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, analysis: &ProjectDependencyAnalysis) -> Result<()> {
        let report = build_report(analysis);
        let json = serde_json::to_string_pretty(&report)
            .map_err(|source| AnalyzerError::Report { source })?;
        match &self.output_path {
            Some(path) => fs::write(path, json).map_err(|source| AnalyzerError::io(path, source))?,
            None => println!("{json}"),
        }
        Ok(())
    }
}

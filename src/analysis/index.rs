//! Artifact → provided-classes index
//!
//! Built once per analysis, in declared-dependency order. Keeping the
//! order makes class attribution deterministic when several artifacts
//! provide the same class: the first declared wins, mirroring classpath
//! shadowing.

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::artifact::Artifact;
use crate::discovery;
use crate::error::{AnalyzerError, Result};
use crate::exclusion::ExclusionPatterns;

/// Ordered mapping from each declared artifact to the top-level class
/// names its binary provides.
#[derive(Debug, Clone)]
pub struct ArtifactClassIndex {
    entries: Vec<(Artifact, BTreeSet<String>)>,
}

impl ArtifactClassIndex {
    /// Index every declared artifact. An artifact with no resolvable
    /// binary is kept with an empty class set so it participates in
    /// classification as always-unused.
    pub fn build(
        declared: &[(Artifact, Option<PathBuf>)],
        exclusions: &ExclusionPatterns,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(declared.len());
        for (artifact, path) in declared {
            let classes = match path {
                None => {
                    warn!("no binary resolved for {artifact}; indexing as empty");
                    BTreeSet::new()
                }
                Some(path) => match provided_classes(path, exclusions) {
                    Ok(classes) => classes,
                    Err(AnalyzerError::UnresolvedBinary { path }) => {
                        warn!(
                            "binary for {artifact} missing at {}; indexing as empty",
                            path.display()
                        );
                        BTreeSet::new()
                    }
                    Err(other) => return Err(other),
                },
            };
            debug!("{artifact} provides {} classes", classes.len());
            entries.push((artifact.clone(), classes));
        }
        Ok(Self { entries })
    }

    /// First artifact, in declared order, providing `class_name`.
    pub fn find_artifact(&self, class_name: &str) -> Option<&Artifact> {
        self.entries
            .iter()
            .find(|(_, classes)| classes.contains(class_name))
            .map(|(artifact, _)| artifact)
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.iter().map(|(artifact, _)| artifact)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-level class names provided by one binary. Inner-class entries
/// fold into their container; exclusions match against the full name
/// before folding, as everywhere else.
fn provided_classes(
    path: &std::path::Path,
    exclusions: &ExclusionPatterns,
) -> Result<BTreeSet<String>> {
    let mut classes = BTreeSet::new();
    for name in discovery::find_class_names(path)? {
        if exclusions.is_match(&name) {
            continue;
        }
        match name.find('$') {
            None => {
                classes.insert(name);
            }
            Some(0) => {}
            Some(ix) => {
                let folded = name[..ix].to_string();
                classes.insert(folded);
            }
        }
    }
    Ok(classes)
}

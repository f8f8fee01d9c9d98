//! Dependency usage pairs and the reference collector
//!
//! A [`DependencyUsage`] records that one class references another. The
//! [`ReferenceCollector`] is the single policy point turning raw names
//! coming out of the bytecode readers into clean usage pairs: it unwraps
//! array forms, converts internal slash names to dotted names, applies
//! the exclusion patterns and folds inner classes into their top-level
//! container.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::exclusion::ExclusionPatterns;

/// One referenced-class / referencing-class fact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DependencyUsage {
    /// The class being depended on, dotted top-level form.
    pub dependency_class: String,
    /// The class (or descriptor file) the reference was found in, verbatim.
    pub used_by: String,
}

impl DependencyUsage {
    pub fn new(dependency_class: impl Into<String>, used_by: impl Into<String>) -> Self {
        Self {
            dependency_class: dependency_class.into(),
            used_by: used_by.into(),
        }
    }
}

/// Ordered, deduplicated set of usage pairs. The ordering makes report
/// output reproducible and parallel merges independent of scheduling.
pub type ReferenceSet = BTreeSet<DependencyUsage>;

/// Accumulates references found while scanning one source (a class file
/// or a deployment descriptor), tagging each with that source's name.
#[derive(Debug)]
pub struct ReferenceCollector<'a> {
    used_by: String,
    exclusions: &'a ExclusionPatterns,
    refs: ReferenceSet,
}

impl<'a> ReferenceCollector<'a> {
    pub fn new(used_by: impl Into<String>, exclusions: &'a ExclusionPatterns) -> Self {
        Self {
            used_by: used_by.into(),
            exclusions,
            refs: ReferenceSet::new(),
        }
    }

    /// Record a referenced class given in internal (`a/b/C`), dotted
    /// (`a.b.C`) or array-descriptor (`[La/b/C;`) form. Arrays of scalar
    /// types contribute nothing.
    pub fn add_name(&mut self, name: &str) {
        let Some(element) = decode_array(name) else {
            return;
        };
        self.insert(element.replace('/', "."));
    }

    /// Record every name in an iterator, with [`add_name`](Self::add_name)
    /// semantics.
    pub fn add_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add_name(name.as_ref());
        }
    }

    /// Apply the collection policy to a normalized dotted name: drop
    /// exclusion matches, fold inner classes to their container, insert.
    fn insert(&mut self, dotted: String) {
        if self.exclusions.is_match(&dotted) {
            return;
        }
        let folded = match dotted.find('$') {
            None => dotted,
            Some(0) => return,
            Some(ix) => dotted[..ix].to_string(),
        };
        self.refs
            .insert(DependencyUsage::new(folded, self.used_by.clone()));
    }

    pub fn into_set(self) -> ReferenceSet {
        self.refs
    }
}

/// Strip array dimensions from a name. Returns the element class (still
/// in its original slash or dotted spelling) or `None` for scalar arrays.
fn decode_array(name: &str) -> Option<&str> {
    if !name.starts_with('[') {
        return Some(name);
    }
    let element = name.trim_start_matches('[');
    let object = element.strip_prefix('L')?;
    Some(object.strip_suffix(';').unwrap_or(object))
}

//! Class-name exclusion patterns
//!
//! Patterns are regular expressions matched against the full dotted class
//! name. A pattern must cover the whole name to exclude it, so `Test1.*`
//! excludes `Test1.Test2` but `Test` alone does not exclude `TestCase`.

use regex::RegexSet;

/// Compiled set of class-name exclusion rules. The empty set matches
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct ExclusionPatterns {
    set: RegexSet,
}

impl ExclusionPatterns {
    /// Compile a pattern list. Each pattern is anchored so that it must
    /// match the entire class name.
    pub fn compile<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let anchored: Vec<String> = patterns
            .into_iter()
            .map(|p| format!("^(?:{})$", p.as_ref()))
            .collect();
        Ok(Self {
            set: RegexSet::new(anchored)?,
        })
    }

    /// True when any pattern covers the whole class name.
    pub fn is_match(&self, class_name: &str) -> bool {
        !self.set.is_empty() && self.set.is_match(class_name)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

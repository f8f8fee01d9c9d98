//! depscan - Dependency usage analysis for JVM projects
//!
//! This library reads compiled bytecode to determine which classpath
//! artifacts a project actually references, then classifies every
//! declared dependency as used, unused or mis-scoped.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Indexing** - Map each classpath artifact to the classes it provides
//! 2. **Discovery** - Find `.class` entries in jars and output directories
//! 3. **Extraction** - Collect referenced class names from constant pools
//!    and class structure (signatures, annotations, instructions)
//! 4. **Attribution** - Match collected references to providing artifacts
//! 5. **Classification** - Partition dependencies into used-declared,
//!    used-undeclared, unused-declared and test-only-but-compile-scoped
//! 6. **Reporting** - Output results for terminals or machines

pub mod analysis;
pub mod artifact;
pub mod classfile;
pub mod config;
pub mod discovery;
pub mod error;
pub mod exclusion;
pub mod report;
pub mod usage;
pub mod webapp;

pub use analysis::{ArtifactClassIndex, ProjectDependencyAnalysis, ProjectDependencyAnalyzer};
pub use artifact::{Artifact, Scope};
pub use classfile::scan_class;
pub use config::{Config, Packaging, ProjectModel};
pub use error::{AnalyzerError, ParseError, Result};
pub use exclusion::ExclusionPatterns;
pub use report::{ReportFormat, Reporter};
pub use usage::{DependencyUsage, ReferenceCollector, ReferenceSet};

//! Configuration loading and the resolved project model
//!
//! A project is described by a TOML or YAML file with three sections:
//!
//! - `[project]` - packaging and the compiled output directories
//! - `[[dependencies]]` - the classpath, one entry per artifact
//! - `[analysis]` - exclusion patterns and reporting policy
//!
//! Dependency entries marked `transitive = true` are indexed (their
//! classes can be attributed) but are not part of the declared set, so
//! referencing them surfaces as used-undeclared.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::artifact::{Artifact, Scope};

/// File names probed, in order, when no `--config` path is given.
pub const DEFAULT_FILE_NAMES: [&str; 4] =
    ["depscan.toml", ".depscan.toml", "depscan.yaml", "depscan.yml"];

const DEFAULT_WEB_XML: &str = "src/main/webapp/WEB-INF/web.xml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unable to read config file `{}`", .path.display())]
    #[diagnostic(code(depscan::config_io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config file `{}`: {message}", .path.display())]
    #[diagnostic(code(depscan::config_parse))]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config file format: `{}`", .path.display())]
    #[diagnostic(
        code(depscan::config_format),
        help("supported formats are TOML (.toml) and YAML (.yaml, .yml)")
    )]
    UnknownFormat { path: PathBuf },
}

/// How the project's compiled output is packaged. War projects get their
/// `web.xml` scanned in addition to the bytecode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Packaging {
    #[default]
    Jar,
    War,
}

impl Packaging {
    pub fn as_str(&self) -> &'static str {
        match self {
            Packaging::Jar => "jar",
            Packaging::War => "war",
        }
    }
}

impl fmt::Display for Packaging {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw configuration file contents. All sections are optional; defaults
/// follow the standard Maven layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub project: ProjectSection,
    pub dependencies: Vec<DependencyDecl>,
    pub analysis: AnalysisSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProjectSection {
    pub packaging: Packaging,
    pub classes_dir: PathBuf,
    pub test_classes_dir: PathBuf,
    /// Overrides the standard `src/main/webapp/WEB-INF/web.xml` location.
    pub web_xml: Option<PathBuf>,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            packaging: Packaging::Jar,
            classes_dir: PathBuf::from("target/classes"),
            test_classes_dir: PathBuf::from("target/test-classes"),
            web_xml: None,
        }
    }
}

/// One classpath entry as written in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyDecl {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Resolved binary: a jar file or an exploded classes directory.
    /// Entries without a path contribute no classes to the index.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// True for artifacts pulled in by other dependencies rather than
    /// declared directly.
    #[serde(default)]
    pub transitive: bool,
}

fn default_kind() -> String {
    "jar".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalysisSection {
    /// Regex patterns for classes to ignore entirely, matched against
    /// the full dotted name.
    pub exclude_classes: Vec<String>,
    /// `group:artifact` ids to force from unused into used.
    pub force_used: Vec<String>,
    /// Only report compile-scoped artifacts as unused.
    pub ignore_non_compile: bool,
    /// Exit non-zero when any warning view is non-empty.
    pub fail_on_warning: bool,
}

impl Config {
    /// Load and parse one config file, dispatching on its extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match extension {
            "toml" => toml::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?,
            _ => {
                return Err(ConfigError::UnknownFormat {
                    path: path.to_path_buf(),
                })
            }
        };
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Probe the project root for a config file, falling back to the
    /// built-in defaults when none exists.
    pub fn from_default_locations(root: &Path) -> Result<Self, ConfigError> {
        for name in DEFAULT_FILE_NAMES {
            let candidate = root.join(name);
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }
        debug!("no config file under {}, using defaults", root.display());
        Ok(Self::default())
    }

    /// Resolve relative paths against the project root and produce the
    /// model the analyzer consumes.
    pub fn resolve(&self, root: &Path) -> ProjectModel {
        let web_xml = match self.project.packaging {
            Packaging::War => {
                let path = self
                    .project
                    .web_xml
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_WEB_XML));
                Some(resolve_path(root, &path))
            }
            Packaging::Jar => None,
        };
        ProjectModel {
            packaging: self.project.packaging,
            classes_dir: resolve_path(root, &self.project.classes_dir),
            test_classes_dir: resolve_path(root, &self.project.test_classes_dir),
            web_xml,
            dependencies: self
                .dependencies
                .iter()
                .map(|decl| decl.resolve(root))
                .collect(),
        }
    }
}

impl DependencyDecl {
    fn resolve(&self, root: &Path) -> DependencyEntry {
        let artifact = Artifact::new(
            self.group.as_str(),
            self.artifact.as_str(),
            self.version.as_str(),
        )
        .with_scope(self.scope)
        .with_kind(self.kind.as_str());
        DependencyEntry {
            artifact,
            path: self.path.as_deref().map(|p| resolve_path(root, p)),
            transitive: self.transitive,
        }
    }
}

fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// A fully resolved project: absolute-ish paths, artifacts split into
/// declared and transitive. This is the analyzer's only input.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectModel {
    pub packaging: Packaging,
    pub classes_dir: PathBuf,
    pub test_classes_dir: PathBuf,
    /// Present only for war packaging.
    pub web_xml: Option<PathBuf>,
    /// Classpath in declaration order. Order decides attribution when
    /// two artifacts provide the same class.
    pub dependencies: Vec<DependencyEntry>,
}

/// One resolved classpath entry.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEntry {
    pub artifact: Artifact,
    pub path: Option<PathBuf>,
    pub transitive: bool,
}

impl ProjectModel {
    /// Directly declared dependencies, in declaration order.
    pub fn declared_artifacts(&self) -> Vec<&Artifact> {
        self.dependencies
            .iter()
            .filter(|entry| !entry.transitive)
            .map(|entry| &entry.artifact)
            .collect()
    }

    /// Every classpath entry paired with its binary path, in declaration
    /// order. This is the artifact index input.
    pub fn indexed_entries(&self) -> Vec<(Artifact, Option<PathBuf>)> {
        self.dependencies
            .iter()
            .map(|entry| (entry.artifact.clone(), entry.path.clone()))
            .collect()
    }
}

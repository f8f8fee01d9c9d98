//! Error types for bytecode parsing and dependency analysis

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Low-level class-file parse failures, before any class-name context is
/// attached. `scan_class` wraps these into [`AnalyzerError::MalformedClass`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The buffer ended before a required field could be read.
    #[error("class file truncated at offset {offset}")]
    Truncated { offset: usize },

    /// The first four bytes were not 0xCAFEBABE.
    #[error("bad magic number {found:#010x}")]
    BadMagic { found: u32 },

    /// A constant pool entry carried a tag outside the known set.
    #[error("unknown constant pool tag {tag}")]
    UnknownPoolTag { tag: u8 },

    /// A constant pool reference pointed outside the pool or at an entry
    /// of the wrong kind.
    #[error("invalid constant pool reference {index}")]
    BadPoolIndex { index: u16 },

    /// A CONSTANT_Utf8 entry did not decode as modified UTF-8.
    #[error("malformed modified UTF-8 in constant pool entry {index}")]
    BadUtf8 { index: u16 },

    /// A Code attribute contained an opcode outside the instruction set.
    #[error("unknown opcode {opcode:#04x} at code offset {offset}")]
    BadOpcode { opcode: u8, offset: usize },

    /// A field or method descriptor did not follow the descriptor grammar.
    #[error("malformed type descriptor `{desc}`")]
    BadDescriptor { desc: String },

    /// An annotation element value carried an unknown tag.
    #[error("unknown annotation element tag {tag:#04x}")]
    BadAnnotationTag { tag: u8 },

    /// A generic signature did not follow the signature grammar.
    #[error("malformed generic signature `{signature}`")]
    BadSignature { signature: String },
}

/// Top-level analyzer errors.
#[derive(Error, Debug, Diagnostic)]
pub enum AnalyzerError {
    /// A class file could not be parsed. Always labeled with the class it
    /// belongs to so multi-class scans can attribute the failure.
    #[error("unable to process class {class_name}")]
    #[diagnostic(code(depscan::malformed_class))]
    MalformedClass {
        class_name: String,
        #[source]
        source: ParseError,
    },

    /// A declared dependency's binary path does not exist. Index building
    /// downgrades this to an empty class set; it is fatal only when the
    /// path was requested directly.
    #[error("no class content at `{}`", .path.display())]
    #[diagnostic(code(depscan::unresolved_binary))]
    UnresolvedBinary { path: PathBuf },

    /// A path exists but is neither a jar archive nor a class directory.
    #[error("cannot scan `{}`: not a jar archive or class directory", .path.display())]
    #[diagnostic(
        code(depscan::unscannable_path),
        help("point the dependency path at a .jar file or an exploded classes directory")
    )]
    UnscannablePath { path: PathBuf },

    /// The jar archive could not be opened or one of its entries could
    /// not be read.
    #[error("cannot process jar entry in `{}`", .path.display())]
    #[diagnostic(code(depscan::jar_entry))]
    Jar {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// An underlying read failed, wrapped with the offending path.
    #[error("i/o failure reading `{}`", .path.display())]
    #[diagnostic(code(depscan::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON report could not be encoded.
    #[error("unable to encode report as JSON")]
    #[diagnostic(code(depscan::report))]
    Report {
        #[source]
        source: serde_json::Error,
    },

    /// `force_declared_dependencies_usage` was handed ids it cannot move.
    #[error(
        "trying to force use of dependencies which are {}",
        force_usage_summary(.not_declared, .already_used)
    )]
    #[diagnostic(
        code(depscan::force_usage),
        help("force-used ids must name declared dependencies that were not already detected as used")
    )]
    ForceUsage {
        not_declared: Vec<String>,
        already_used: Vec<String>,
    },
}

impl AnalyzerError {
    pub fn malformed(class_name: impl Into<String>, source: ParseError) -> Self {
        Self::MalformedClass {
            class_name: class_name.into(),
            source,
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn force_usage_summary(not_declared: &[String], already_used: &[String]) -> String {
    let mut parts = Vec::new();
    if !not_declared.is_empty() {
        parts.push(format!("not declared: [{}]", not_declared.join(", ")));
    }
    if !already_used.is_empty() {
        parts.push(format!(
            "declared but already detected as used: [{}]",
            already_used.join(", ")
        ));
    }
    parts.join(" and ")
}

/// Result type for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;

//! Class-file scanning: from raw bytes to a set of referenced classes
//!
//! Two independent streams run over the same buffer and are unioned:
//!
//! 1. **Constant pool scan** - reads the pool table raw, catching
//!    references only reachable through `invokedynamic` bootstrap
//!    arguments and method-handle constants.
//! 2. **Structural walk** - follows the declared structure (hierarchy,
//!    fields, methods, annotations, signatures, instruction operands),
//!    catching descriptor types the pool stores only as strings.
//!
//! [`scan_class`] is the sole integration point between binary parsing
//! and the analysis layer above it.

pub mod constant_pool;
pub mod descriptor;
pub mod reader;
pub mod structure;

use std::collections::BTreeSet;

use crate::error::{AnalyzerError, ParseError, Result};
use crate::exclusion::ExclusionPatterns;
use crate::usage::{ReferenceCollector, ReferenceSet};

use constant_pool::ConstantPool;
use reader::Reader;

const MAGIC: u32 = 0xCAFE_BABE;

/// Scan one class and return every dependency reference it makes,
/// tagged with `class_name` as the referencing class.
///
/// A class matching the exclusion patterns is skipped wholesale. Any
/// parse failure comes back as a single error labeled with
/// `class_name`, so callers scanning many classes can attribute it.
pub fn scan_class(
    class_name: &str,
    bytes: &[u8],
    exclusions: &ExclusionPatterns,
) -> Result<ReferenceSet> {
    if exclusions.is_match(class_name) {
        return Ok(ReferenceSet::new());
    }
    let raw = raw_references(bytes)
        .map_err(|source| AnalyzerError::malformed(class_name, source))?;
    let mut collector = ReferenceCollector::new(class_name, exclusions);
    collector.add_names(&raw);
    Ok(collector.into_set())
}

/// Both scan streams over one buffer, as internal names.
fn raw_references(bytes: &[u8]) -> std::result::Result<BTreeSet<String>, ParseError> {
    let mut reader = Reader::new(bytes);
    let magic = reader.u32()?;
    if magic != MAGIC {
        return Err(ParseError::BadMagic { found: magic });
    }
    reader.skip(4)?; // minor_version, major_version
    let pool = ConstantPool::parse(&mut reader)?;
    let mut refs = structure::referenced_classes(&mut reader, &pool)?;
    for name in pool.referenced_classes()? {
        refs.insert(name.to_string());
    }
    Ok(refs)
}

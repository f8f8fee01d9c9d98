//! Web deployment descriptor scanning
//!
//! War projects can reference classes from `web.xml` alone: servlet,
//! filter and listener declarations name classes no bytecode mentions.
//! This module extracts those names so the analyzer can count them as
//! main usage, with the descriptor path as the referencing side.
//!
//! Descriptors are matched namespace-aware. For each class-bearing tag
//! the schema namespaces are tried newest first, and the first namespace
//! that contains the tag at all wins; mixed-namespace documents do not
//! get their declarations merged across schema generations.

use std::fs;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use tracing::{debug, warn};

use crate::error::{AnalyzerError, Result};
use crate::exclusion::ExclusionPatterns;
use crate::usage::{ReferenceCollector, ReferenceSet};

/// Schema namespaces a `web.xml` may use, newest first.
const WEB_XML_NAMESPACES: [&str; 3] = [
    "https://jakarta.ee/xml/ns/jakartaee",
    "http://xmlns.jcp.org/xml/ns/javaee",
    "http://java.sun.com/xml/ns/javaee",
];

/// Elements whose text content is a class name.
const CLASS_TAGS: [&str; 3] = ["filter-class", "listener-class", "servlet-class"];

/// Collect the classes a deployment descriptor references. A missing
/// file or an unparseable document yields an empty set; only failing to
/// read an existing file is an error.
pub fn web_xml_usages(path: &Path, exclusions: &ExclusionPatterns) -> Result<ReferenceSet> {
    if !path.is_file() {
        debug!("no web descriptor at {}", path.display());
        return Ok(ReferenceSet::new());
    }
    let raw = fs::read_to_string(path).map_err(|source| AnalyzerError::io(path, source))?;
    let class_names = match descriptor_classes(&raw) {
        Ok(names) => names,
        Err(err) => {
            warn!("Error parsing web descriptor {}: {err}", path.display());
            return Ok(ReferenceSet::new());
        }
    };
    let mut collector = ReferenceCollector::new(path.display().to_string(), exclusions);
    collector.add_names(&class_names);
    Ok(collector.into_set())
}

/// Pull the raw class names out of a descriptor document, before any
/// exclusion or folding policy is applied.
fn descriptor_classes(raw: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    // Per (tag, namespace): how many elements appeared, and their
    // trimmed non-empty text contents.
    let mut hits: Vec<Vec<(usize, Vec<String>)>> =
        vec![vec![(0, Vec::new()); WEB_XML_NAMESPACES.len()]; CLASS_TAGS.len()];

    let mut reader = NsReader::from_str(raw);
    // (tag index, namespace index, accumulated text) of the open element
    let mut current: Option<(usize, usize, String)> = None;
    loop {
        match reader.read_resolved_event()? {
            (resolve, Event::Start(start)) => {
                if let Some((tag, ns)) = locate(&resolve, start.local_name().as_ref()) {
                    hits[tag][ns].0 += 1;
                    current = Some((tag, ns, String::new()));
                }
            }
            (resolve, Event::Empty(start)) => {
                if let Some((tag, ns)) = locate(&resolve, start.local_name().as_ref()) {
                    hits[tag][ns].0 += 1;
                }
            }
            (_, Event::Text(text)) => {
                if let Some((_, _, acc)) = current.as_mut() {
                    acc.push_str(&quick_xml::escape::unescape(&text.decode()?)?);
                }
            }
            (_, Event::CData(cdata)) => {
                if let Some((_, _, acc)) = current.as_mut() {
                    acc.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            (_, Event::End(end)) => {
                if let Some((tag, ns, acc)) = current.take() {
                    if end.local_name().as_ref() == CLASS_TAGS[tag].as_bytes() {
                        let trimmed = acc.trim();
                        if !trimmed.is_empty() {
                            hits[tag][ns].1.push(trimmed.to_string());
                        }
                    } else {
                        current = Some((tag, ns, acc));
                    }
                }
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    let mut classes = Vec::new();
    for tag in 0..CLASS_TAGS.len() {
        for ns in 0..WEB_XML_NAMESPACES.len() {
            let (elements, texts) = &hits[tag][ns];
            if *elements > 0 {
                classes.extend(texts.iter().cloned());
                break;
            }
        }
    }
    Ok(classes)
}

/// Map a resolved element to its (tag, namespace) slot, if interesting.
fn locate(resolve: &ResolveResult, local_name: &[u8]) -> Option<(usize, usize)> {
    let ResolveResult::Bound(Namespace(url)) = resolve else {
        return None;
    };
    let tag = CLASS_TAGS
        .iter()
        .position(|tag| local_name == tag.as_bytes())?;
    let ns = WEB_XML_NAMESPACES
        .iter()
        .position(|known| *url == known.as_bytes())?;
    Some((tag, ns))
}

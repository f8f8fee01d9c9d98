//! Class discovery in jar archives and exploded class directories
//!
//! Produces the `(class_name, bytes)` pairs the scanning layer consumes.
//! Jars are memory-mapped and read in place; directories are walked
//! recursively. Either way the same filter applies: only `.class`
//! entries whose path is free of `-` are handed on, which drops
//! `module-info`, `package-info` and multi-release `META-INF/versions`
//! shadow copies. Results come back sorted by class name.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{AnalyzerError, Result};

/// One discovered class: dotted name plus its raw bytes.
#[derive(Debug, Clone)]
pub struct ClassEntry {
    pub class_name: String,
    pub bytes: Vec<u8>,
}

/// Enumerate the classes a path provides.
///
/// A missing path raises [`AnalyzerError::UnresolvedBinary`] so callers
/// can decide whether absence is fatal; a path that exists but is
/// neither a jar nor a directory is always an error.
pub fn find_classes(path: &Path) -> Result<Vec<ClassEntry>> {
    if !path.exists() {
        return Err(AnalyzerError::UnresolvedBinary {
            path: path.to_path_buf(),
        });
    }
    let mut entries = if path.is_dir() {
        directory_classes(path)?
    } else if is_jar(path) {
        jar_classes(path)?
    } else {
        return Err(AnalyzerError::UnscannablePath {
            path: path.to_path_buf(),
        });
    };
    entries.sort_by(|a, b| a.class_name.cmp(&b.class_name));
    debug!("discovered {} classes in {}", entries.len(), path.display());
    Ok(entries)
}

/// Enumerate class names only, without reading any class bytes. This is
/// the fast path for indexing dependency jars, where the entry listing
/// already carries everything needed.
pub fn find_class_names(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(AnalyzerError::UnresolvedBinary {
            path: path.to_path_buf(),
        });
    }
    let mut names = if path.is_dir() {
        directory_class_names(path)?
    } else if is_jar(path) {
        jar_class_names(path)?
    } else {
        return Err(AnalyzerError::UnscannablePath {
            path: path.to_path_buf(),
        });
    };
    names.sort();
    Ok(names)
}

fn is_jar(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("jar")
}

/// `.class`, no `-` anywhere in the relative path.
fn is_scannable(relative_path: &str) -> bool {
    relative_path.ends_with(".class") && !relative_path.contains('-')
}

fn entry_class_name(relative_path: &str) -> String {
    relative_path.trim_end_matches(".class").replace('/', ".")
}

fn jar_classes(path: &Path) -> Result<Vec<ClassEntry>> {
    let file = File::open(path).map_err(|source| AnalyzerError::io(path, source))?;
    let mmap =
        unsafe { Mmap::map(&file) }.map_err(|source| AnalyzerError::io(path, source))?;
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..])).map_err(|source| {
        AnalyzerError::Jar {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index).map_err(|source| AnalyzerError::Jar {
            path: path.to_path_buf(),
            source,
        })?;
        if !entry.is_file() || !is_scannable(entry.name()) {
            continue;
        }
        let class_name = entry_class_name(entry.name());
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut bytes)
            .map_err(|source| AnalyzerError::io(path, source))?;
        entries.push(ClassEntry { class_name, bytes });
    }
    Ok(entries)
}

fn directory_classes(root: &Path) -> Result<Vec<ClassEntry>> {
    let mut entries = Vec::new();
    for walked in WalkDir::new(root).sort_by_file_name() {
        let walked = walked.map_err(|err| walk_error(root, err))?;
        if !walked.file_type().is_file() {
            continue;
        }
        let Ok(relative) = walked.path().strip_prefix(root) else {
            continue;
        };
        let relative_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if !is_scannable(&relative_name) {
            continue;
        }
        let bytes = std::fs::read(walked.path())
            .map_err(|source| AnalyzerError::io(walked.path(), source))?;
        entries.push(ClassEntry {
            class_name: entry_class_name(&relative_name),
            bytes,
        });
    }
    Ok(entries)
}

fn jar_class_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|source| AnalyzerError::io(path, source))?;
    let mmap =
        unsafe { Mmap::map(&file) }.map_err(|source| AnalyzerError::io(path, source))?;
    let archive = ZipArchive::new(Cursor::new(&mmap[..])).map_err(|source| {
        AnalyzerError::Jar {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(archive
        .file_names()
        .filter(|name| is_scannable(name))
        .map(entry_class_name)
        .collect())
}

fn directory_class_names(root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for walked in WalkDir::new(root).sort_by_file_name() {
        let walked = walked.map_err(|err| walk_error(root, err))?;
        if !walked.file_type().is_file() {
            continue;
        }
        let Ok(relative) = walked.path().strip_prefix(root) else {
            continue;
        };
        let relative_name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if is_scannable(&relative_name) {
            names.push(entry_class_name(&relative_name));
        }
    }
    Ok(names)
}

fn walk_error(root: &Path, err: walkdir::Error) -> AnalyzerError {
    let path: PathBuf = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.into_io_error() {
        Some(source) => AnalyzerError::Io { path, source },
        None => AnalyzerError::Io {
            path,
            source: std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"),
        },
    }
}

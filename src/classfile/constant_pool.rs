//! Constant pool parsing
//!
//! The pool is the class file's table of literals and symbolic
//! references. Reading it raw recovers class references the structural
//! walk cannot see, notably classes reachable only through
//! `invokedynamic` bootstrap arguments and method-handle constants.
//!
//! Layout quirks handled here:
//! - entries are 1-indexed and the declared count is one past the last
//!   index;
//! - `long` and `double` entries occupy two slots, the second of which
//!   is unusable;
//! - strings use the JVM's modified UTF-8, not standard UTF-8.

use crate::classfile::reader::Reader;
use crate::error::ParseError;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACEMETHODREF: u8 = 11;
const TAG_NAMEANDTYPE: u8 = 12;
const TAG_METHODHANDLE: u8 = 15;
const TAG_METHODTYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKEDYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// One parsed constant pool slot. Payloads that the analysis never looks
/// at (numeric values, bootstrap indices) are dropped at parse time;
/// only the entry kind and the indices needed for class-name resolution
/// are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolEntry {
    /// Index 0 and the shadow slot after a `long`/`double` entry.
    Unused,
    Utf8(String),
    Integer,
    Float,
    Long,
    Double,
    Class { name_index: u16 },
    String,
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle,
    MethodType,
    Dynamic,
    InvokeDynamic { name_and_type_index: u16 },
    Module,
    Package,
}

#[derive(Debug)]
pub struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    /// Parse the pool from a reader positioned at the entry count (right
    /// after the version fields). On return the reader sits at the
    /// class access flags.
    pub fn parse(reader: &mut Reader<'_>) -> Result<Self, ParseError> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(PoolEntry::Unused);

        let mut ix = 1u16;
        while ix < count {
            let tag = reader.u8()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = reader.u16()? as usize;
                    let raw = reader.bytes(len)?;
                    PoolEntry::Utf8(decode_modified_utf8(raw, ix)?)
                }
                TAG_INTEGER => {
                    reader.skip(4)?;
                    PoolEntry::Integer
                }
                TAG_FLOAT => {
                    reader.skip(4)?;
                    PoolEntry::Float
                }
                TAG_LONG => {
                    reader.skip(8)?;
                    PoolEntry::Long
                }
                TAG_DOUBLE => {
                    reader.skip(8)?;
                    PoolEntry::Double
                }
                TAG_CLASS => PoolEntry::Class {
                    name_index: reader.u16()?,
                },
                TAG_STRING => {
                    reader.skip(2)?;
                    PoolEntry::String
                }
                TAG_FIELDREF => PoolEntry::FieldRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                TAG_METHODREF => PoolEntry::MethodRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                TAG_INTERFACEMETHODREF => PoolEntry::InterfaceMethodRef {
                    class_index: reader.u16()?,
                    name_and_type_index: reader.u16()?,
                },
                TAG_NAMEANDTYPE => PoolEntry::NameAndType {
                    name_index: reader.u16()?,
                    descriptor_index: reader.u16()?,
                },
                TAG_METHODHANDLE => {
                    reader.skip(3)?;
                    PoolEntry::MethodHandle
                }
                TAG_METHODTYPE => {
                    reader.skip(2)?;
                    PoolEntry::MethodType
                }
                TAG_DYNAMIC => {
                    reader.skip(4)?;
                    PoolEntry::Dynamic
                }
                TAG_INVOKEDYNAMIC => {
                    reader.skip(2)?;
                    PoolEntry::InvokeDynamic {
                        name_and_type_index: reader.u16()?,
                    }
                }
                TAG_MODULE => {
                    reader.skip(2)?;
                    PoolEntry::Module
                }
                TAG_PACKAGE => {
                    reader.skip(2)?;
                    PoolEntry::Package
                }
                other => return Err(ParseError::UnknownPoolTag { tag: other }),
            };

            let wide = matches!(entry, PoolEntry::Long | PoolEntry::Double);
            entries.push(entry);
            ix += 1;
            if wide {
                // the second slot of an 8-byte constant is not addressable
                entries.push(PoolEntry::Unused);
                ix += 1;
            }
        }

        Ok(Self { entries })
    }

    pub fn entry(&self, index: u16) -> Result<&PoolEntry, ParseError> {
        match self.entries.get(index as usize) {
            None | Some(PoolEntry::Unused) => Err(ParseError::BadPoolIndex { index }),
            Some(entry) => Ok(entry),
        }
    }

    /// Resolve a CONSTANT_Utf8 entry.
    pub fn utf8(&self, index: u16) -> Result<&str, ParseError> {
        match self.entry(index)? {
            PoolEntry::Utf8(text) => Ok(text),
            _ => Err(ParseError::BadPoolIndex { index }),
        }
    }

    /// Resolve a CONSTANT_Class entry to its internal name. The name may
    /// be an array descriptor (`[La/b/C;`) for array class literals.
    pub fn class_name(&self, index: u16) -> Result<&str, ParseError> {
        match self.entry(index)? {
            PoolEntry::Class { name_index } => self.utf8(*name_index),
            _ => Err(ParseError::BadPoolIndex { index }),
        }
    }

    /// Resolve the descriptor string behind a field/method/indy entry's
    /// NameAndType.
    pub fn name_and_type_descriptor(&self, index: u16) -> Result<&str, ParseError> {
        match self.entry(index)? {
            PoolEntry::NameAndType {
                descriptor_index, ..
            } => self.utf8(*descriptor_index),
            _ => Err(ParseError::BadPoolIndex { index }),
        }
    }

    /// Every class name the pool mentions, excluding unnamed-package
    /// names: those are compiler scaffolding (lambda proxies and the
    /// like) that can never belong to a dependency artifact.
    pub fn referenced_classes(&self) -> Result<Vec<&str>, ParseError> {
        let mut names = Vec::new();
        for entry in &self.entries {
            if let PoolEntry::Class { name_index } = entry {
                let name = self.utf8(*name_index)?;
                if name.contains('/') {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}

/// Decode the JVM's modified UTF-8: no embedded NUL bytes, supplementary
/// characters carried as surrogate pairs of 3-byte sequences.
fn decode_modified_utf8(raw: &[u8], index: u16) -> Result<String, ParseError> {
    let bad = ParseError::BadUtf8 { index };
    let mut units: Vec<u16> = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        let b = raw[i];
        if (1..=0x7F).contains(&b) {
            units.push(b as u16);
            i += 1;
        } else {
            let b2 = *raw.get(i + 1).ok_or(bad.clone())?;
            if (b & 0xF0) != 0xE0 {
                units.push(((b as u16 & 0x1F) << 6) | (b2 as u16 & 0x3F));
                i += 2;
            } else {
                let b3 = *raw.get(i + 2).ok_or(bad.clone())?;
                units.push(
                    ((b as u16 & 0x0F) << 12) | ((b2 as u16 & 0x3F) << 6) | (b3 as u16 & 0x3F),
                );
                i += 3;
            }
        }
    }
    String::from_utf16(&units).map_err(|_| bad)
}

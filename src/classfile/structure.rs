//! Structural walk of a class file
//!
//! Traverses everything the class declares (hierarchy, fields, methods,
//! annotations, generic signatures, method bodies) and collects every
//! class name referenced along the way. Each structural element is
//! scanned by its own function returning that element's reference set;
//! callers union the pieces.
//!
//! Coverage rules:
//! - a generic signature supersedes the raw descriptor or hierarchy
//!   names it describes; declared `throws` types are always added
//! - instruction operands contribute type references (`new`, casts,
//!   field/method owners and descriptors, `ldc` class constants,
//!   `multianewarray`, try-catch types, local variable types)
//! - `invokedynamic` contributes its call-site descriptor; bootstrap
//!   arguments are left to the constant-pool scan
//! - type annotations are not walked

use std::collections::{BTreeMap, BTreeSet};

use crate::classfile::constant_pool::{ConstantPool, PoolEntry};
use crate::classfile::descriptor;
use crate::classfile::reader::Reader;
use crate::error::ParseError;

/// Walk a class positioned right after its constant pool and return
/// every internal class name its structure references.
pub fn referenced_classes(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<BTreeSet<String>, ParseError> {
    let mut refs = BTreeSet::new();

    reader.skip(2)?; // access_flags
    reader.skip(2)?; // this_class
    let super_index = reader.u16()?;
    let interface_count = reader.u16()?;
    let mut interface_indices = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interface_indices.push(reader.u16()?);
    }

    let field_count = reader.u16()?;
    for _ in 0..field_count {
        refs.extend(field_references(reader, pool)?);
    }

    let method_count = reader.u16()?;
    for _ in 0..method_count {
        refs.extend(method_references(reader, pool)?);
    }

    // Class attributes come last, but the Signature attribute decides
    // how the hierarchy read earlier contributes.
    let mut class_signature: Option<String> = None;
    let attr_count = reader.u16()?;
    for _ in 0..attr_count {
        let (name, payload) = attribute(reader, pool)?;
        let mut attr = Reader::new(payload);
        match name {
            "Signature" => {
                class_signature = Some(pool.utf8(attr.u16()?)?.to_string());
            }
            "NestHost" => {
                add_entry_name(pool.class_name(attr.u16()?)?, &mut refs)?;
            }
            "NestMembers" => {
                let count = attr.u16()?;
                for _ in 0..count {
                    add_entry_name(pool.class_name(attr.u16()?)?, &mut refs)?;
                }
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                annotations(&mut attr, pool, &mut refs)?;
            }
            _ => {}
        }
    }

    match class_signature {
        Some(sig) => refs.extend(descriptor::class_signature_classes(&sig)?),
        None => {
            if super_index != 0 {
                add_entry_name(pool.class_name(super_index)?, &mut refs)?;
            }
            for index in interface_indices {
                add_entry_name(pool.class_name(index)?, &mut refs)?;
            }
        }
    }

    Ok(refs)
}

/// One field: declared type (signature over descriptor), class-kind
/// constant values, annotations.
fn field_references(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<BTreeSet<String>, ParseError> {
    let mut refs = BTreeSet::new();
    reader.skip(2)?; // access_flags
    reader.skip(2)?; // name_index
    let desc_index = reader.u16()?;

    let mut signature: Option<String> = None;
    let attr_count = reader.u16()?;
    for _ in 0..attr_count {
        let (name, payload) = attribute(reader, pool)?;
        let mut attr = Reader::new(payload);
        match name {
            "Signature" => {
                signature = Some(pool.utf8(attr.u16()?)?.to_string());
            }
            "ConstantValue" => {
                let value_index = attr.u16()?;
                if let PoolEntry::Class { .. } = pool.entry(value_index)? {
                    add_entry_name(pool.class_name(value_index)?, &mut refs)?;
                }
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                annotations(&mut attr, pool, &mut refs)?;
            }
            _ => {}
        }
    }

    match signature {
        Some(sig) => refs.extend(descriptor::type_signature_classes(&sig)?),
        None => add_type_descriptor(pool.utf8(desc_index)?, &mut refs)?,
    }
    Ok(refs)
}

/// One method: descriptor or signature, throws clause, annotations,
/// defaults, and the code attribute.
fn method_references(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<BTreeSet<String>, ParseError> {
    let mut refs = BTreeSet::new();
    reader.skip(2)?; // access_flags
    reader.skip(2)?; // name_index
    let desc_index = reader.u16()?;

    let mut signature: Option<String> = None;
    let attr_count = reader.u16()?;
    for _ in 0..attr_count {
        let (name, payload) = attribute(reader, pool)?;
        let mut attr = Reader::new(payload);
        match name {
            "Signature" => {
                signature = Some(pool.utf8(attr.u16()?)?.to_string());
            }
            "Exceptions" => {
                let count = attr.u16()?;
                for _ in 0..count {
                    add_entry_name(pool.class_name(attr.u16()?)?, &mut refs)?;
                }
            }
            "Code" => {
                refs.extend(code_references(&mut attr, pool)?);
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                annotations(&mut attr, pool, &mut refs)?;
            }
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                let params = attr.u8()?;
                for _ in 0..params {
                    annotations(&mut attr, pool, &mut refs)?;
                }
            }
            "AnnotationDefault" => {
                element_value(&mut attr, pool, &mut refs)?;
            }
            _ => {}
        }
    }

    match signature {
        Some(sig) => refs.extend(descriptor::method_signature_classes(&sig)?),
        None => {
            for class in descriptor::method_descriptor_classes(pool.utf8(desc_index)?)? {
                refs.insert(class.to_string());
            }
        }
    }
    Ok(refs)
}

/// The Code attribute: instruction operands, try-catch types, local
/// variable tables.
fn code_references(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
) -> Result<BTreeSet<String>, ParseError> {
    let mut refs = BTreeSet::new();
    reader.skip(4)?; // max_stack, max_locals
    let code_len = reader.u32()? as usize;
    let code = reader.bytes(code_len)?;
    instruction_references(code, pool, &mut refs)?;

    let handler_count = reader.u16()?;
    for _ in 0..handler_count {
        reader.skip(6)?; // start_pc, end_pc, handler_pc
        let catch_type = reader.u16()?;
        // catch_type 0 is the catch-all handler of finally blocks
        if catch_type != 0 {
            add_entry_name(pool.class_name(catch_type)?, &mut refs)?;
        }
    }

    // A variable that appears in the type table uses its generic
    // signature in place of the raw descriptor. The two tables pair by
    // (start_pc, slot); attribute order is unspecified, so buffer both.
    let mut var_descs: Vec<((u16, u16), u16)> = Vec::new();
    let mut var_sigs: BTreeMap<(u16, u16), u16> = BTreeMap::new();
    let attr_count = reader.u16()?;
    for _ in 0..attr_count {
        let (name, payload) = attribute(reader, pool)?;
        let mut attr = Reader::new(payload);
        match name {
            "LocalVariableTable" => {
                let count = attr.u16()?;
                for _ in 0..count {
                    let start_pc = attr.u16()?;
                    attr.skip(4)?; // length, name_index
                    let desc_index = attr.u16()?;
                    let slot = attr.u16()?;
                    var_descs.push(((start_pc, slot), desc_index));
                }
            }
            "LocalVariableTypeTable" => {
                let count = attr.u16()?;
                for _ in 0..count {
                    let start_pc = attr.u16()?;
                    attr.skip(4)?;
                    let sig_index = attr.u16()?;
                    let slot = attr.u16()?;
                    var_sigs.insert((start_pc, slot), sig_index);
                }
            }
            _ => {}
        }
    }
    for (key, desc_index) in var_descs {
        if !var_sigs.contains_key(&key) {
            add_type_descriptor(pool.utf8(desc_index)?, &mut refs)?;
        }
    }
    for sig_index in var_sigs.into_values() {
        refs.extend(descriptor::type_signature_classes(pool.utf8(sig_index)?)?);
    }

    Ok(refs)
}

/// Decode the instruction stream, collecting type references from the
/// operands that carry them and skipping everything else by width.
fn instruction_references(
    code: &[u8],
    pool: &ConstantPool,
    refs: &mut BTreeSet<String>,
) -> Result<(), ParseError> {
    let mut pos = 0usize;
    while pos < code.len() {
        let opcode = code[pos];
        match opcode {
            // new, anewarray, checkcast, instanceof
            0xbb | 0xbd | 0xc0 | 0xc1 => {
                let index = read_u16_at(code, pos + 1)?;
                add_entry_name(pool.class_name(index)?, refs)?;
                pos += 3;
            }
            // getstatic, putstatic, getfield, putfield
            0xb2..=0xb5 => {
                let (owner_index, nat_index) = member_ref(pool, read_u16_at(code, pos + 1)?)?;
                add_entry_name(pool.class_name(owner_index)?, refs)?;
                add_type_descriptor(pool.name_and_type_descriptor(nat_index)?, refs)?;
                pos += 3;
            }
            // invokevirtual, invokespecial, invokestatic, invokeinterface
            0xb6..=0xb9 => {
                let (owner_index, nat_index) = member_ref(pool, read_u16_at(code, pos + 1)?)?;
                add_entry_name(pool.class_name(owner_index)?, refs)?;
                add_method_descriptor(pool.name_and_type_descriptor(nat_index)?, refs)?;
                pos += if opcode == 0xb9 { 5 } else { 3 };
            }
            // invokedynamic: the call-site descriptor carries the types
            0xba => {
                let index = read_u16_at(code, pos + 1)?;
                match pool.entry(index)? {
                    PoolEntry::InvokeDynamic {
                        name_and_type_index,
                    } => {
                        add_method_descriptor(
                            pool.name_and_type_descriptor(*name_and_type_index)?,
                            refs,
                        )?;
                    }
                    _ => return Err(ParseError::BadPoolIndex { index }),
                }
                pos += 5;
            }
            // ldc
            0x12 => {
                let index = *code
                    .get(pos + 1)
                    .ok_or(ParseError::Truncated { offset: pos + 1 })?
                    as u16;
                add_loadable_class(pool, index, refs)?;
                pos += 2;
            }
            // ldc_w, ldc2_w
            0x13 | 0x14 => {
                add_loadable_class(pool, read_u16_at(code, pos + 1)?, refs)?;
                pos += 3;
            }
            // multianewarray
            0xc5 => {
                let index = read_u16_at(code, pos + 1)?;
                add_entry_name(pool.class_name(index)?, refs)?;
                pos += 4;
            }
            // tableswitch
            0xaa => {
                let base = pos + 1 + switch_padding(pos);
                let low = read_i32_at(code, base + 4)?;
                let high = read_i32_at(code, base + 8)?;
                let count = (high as i64) - (low as i64) + 1;
                if count < 0 {
                    return Err(ParseError::BadOpcode { opcode, offset: pos });
                }
                pos = base + 12 + (count as usize) * 4;
            }
            // lookupswitch
            0xab => {
                let base = pos + 1 + switch_padding(pos);
                let npairs = read_i32_at(code, base + 4)?;
                if npairs < 0 {
                    return Err(ParseError::BadOpcode { opcode, offset: pos });
                }
                pos = base + 8 + (npairs as usize) * 8;
            }
            // wide
            0xc4 => {
                let widened = *code
                    .get(pos + 1)
                    .ok_or(ParseError::Truncated { offset: pos + 1 })?;
                pos += if widened == 0x84 { 6 } else { 4 };
            }
            other => {
                pos += 1 + operand_width(other, pos)?;
            }
        }
        if pos > code.len() {
            return Err(ParseError::Truncated { offset: code.len() });
        }
    }
    Ok(())
}

/// Operand byte count for instructions without type references.
fn operand_width(opcode: u8, offset: usize) -> Result<usize, ParseError> {
    let width = match opcode {
        0x00..=0x0f => 0, // nop, constant pushes
        0x10 => 1,        // bipush
        0x11 => 2,        // sipush
        0x15..=0x19 => 1, // load with slot operand
        0x1a..=0x35 => 0, // shorthand and array loads
        0x36..=0x3a => 1, // store with slot operand
        0x3b..=0x56 => 0, // shorthand and array stores
        0x57..=0x5f => 0, // stack manipulation
        0x60..=0x83 => 0, // arithmetic and logic
        0x84 => 2,        // iinc
        0x85..=0x98 => 0, // conversions and comparisons
        0x99..=0xa8 => 2, // conditional branches, goto, jsr
        0xa9 => 1,        // ret
        0xac..=0xb1 => 0, // returns
        0xbc => 1,        // newarray
        0xbe | 0xbf => 0, // arraylength, athrow
        0xc2 | 0xc3 => 0, // monitorenter, monitorexit
        0xc6 | 0xc7 => 2, // ifnull, ifnonnull
        0xc8 | 0xc9 => 4, // goto_w, jsr_w
        other => return Err(ParseError::BadOpcode { opcode: other, offset }),
    };
    Ok(width)
}

/// Switch payloads are 4-byte aligned relative to the code start.
fn switch_padding(opcode_offset: usize) -> usize {
    (4 - ((opcode_offset + 1) % 4)) % 4
}

/// Read one attribute header and borrow its payload.
fn attribute<'a, 'p>(
    reader: &mut Reader<'a>,
    pool: &'p ConstantPool,
) -> Result<(&'p str, &'a [u8]), ParseError> {
    let name = pool.utf8(reader.u16()?)?;
    let len = reader.u32()? as usize;
    let payload = reader.bytes(len)?;
    Ok((name, payload))
}

/// `annotations` counted list: `u16 count` then that many annotations.
fn annotations(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    refs: &mut BTreeSet<String>,
) -> Result<(), ParseError> {
    let count = reader.u16()?;
    for _ in 0..count {
        annotation(reader, pool, refs)?;
    }
    Ok(())
}

fn annotation(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    refs: &mut BTreeSet<String>,
) -> Result<(), ParseError> {
    add_type_descriptor(pool.utf8(reader.u16()?)?, refs)?;
    let pairs = reader.u16()?;
    for _ in 0..pairs {
        reader.skip(2)?; // element_name_index
        element_value(reader, pool, refs)?;
    }
    Ok(())
}

fn element_value(
    reader: &mut Reader<'_>,
    pool: &ConstantPool,
    refs: &mut BTreeSet<String>,
) -> Result<(), ParseError> {
    let tag = reader.u8()?;
    match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => reader.skip(2)?,
        b'e' => {
            add_type_descriptor(pool.utf8(reader.u16()?)?, refs)?;
            reader.skip(2)?; // const_name_index
        }
        b'c' => {
            // class literal; the descriptor may be V or a primitive
            add_type_descriptor(pool.utf8(reader.u16()?)?, refs)?;
        }
        b'@' => annotation(reader, pool, refs)?,
        b'[' => {
            let count = reader.u16()?;
            for _ in 0..count {
                element_value(reader, pool, refs)?;
            }
        }
        other => return Err(ParseError::BadAnnotationTag { tag: other }),
    }
    Ok(())
}

/// Record a name out of a CONSTANT_Class entry, which may be an array
/// descriptor for array class literals.
fn add_entry_name(name: &str, refs: &mut BTreeSet<String>) -> Result<(), ParseError> {
    if name.starts_with('[') {
        if let Some(element) = descriptor::type_descriptor_class(name)? {
            refs.insert(element.to_string());
        }
    } else {
        refs.insert(name.to_string());
    }
    Ok(())
}

fn add_type_descriptor(desc: &str, refs: &mut BTreeSet<String>) -> Result<(), ParseError> {
    if let Some(element) = descriptor::type_descriptor_class(desc)? {
        refs.insert(element.to_string());
    }
    Ok(())
}

fn add_method_descriptor(desc: &str, refs: &mut BTreeSet<String>) -> Result<(), ParseError> {
    for class in descriptor::method_descriptor_classes(desc)? {
        refs.insert(class.to_string());
    }
    Ok(())
}

/// Only CONSTANT_Class loads contribute a reference; other loadable
/// constants (numbers, strings, method types/handles, condy) do not.
fn add_loadable_class(
    pool: &ConstantPool,
    index: u16,
    refs: &mut BTreeSet<String>,
) -> Result<(), ParseError> {
    if let PoolEntry::Class { .. } = pool.entry(index)? {
        add_entry_name(pool.class_name(index)?, refs)?;
    }
    Ok(())
}

fn member_ref(pool: &ConstantPool, index: u16) -> Result<(u16, u16), ParseError> {
    match pool.entry(index)? {
        PoolEntry::FieldRef {
            class_index,
            name_and_type_index,
        }
        | PoolEntry::MethodRef {
            class_index,
            name_and_type_index,
        }
        | PoolEntry::InterfaceMethodRef {
            class_index,
            name_and_type_index,
        } => Ok((*class_index, *name_and_type_index)),
        _ => Err(ParseError::BadPoolIndex { index }),
    }
}

fn read_u16_at(code: &[u8], offset: usize) -> Result<u16, ParseError> {
    let bytes = code
        .get(offset..offset + 2)
        .ok_or(ParseError::Truncated { offset })?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_i32_at(code: &[u8], offset: usize) -> Result<i32, ParseError> {
    let bytes = code
        .get(offset..offset + 4)
        .ok_or(ParseError::Truncated { offset })?;
    Ok(i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

//! Descriptor and generic-signature readers
//!
//! Both grammars compress type references into strings; these readers
//! pull out every class name they mention. Uniform decoding rules:
//! arrays unwrap to their element type, primitives and type variables
//! contribute nothing, method forms decompose into return plus argument
//! types. Names come back in internal slash form.

use crate::error::ParseError;

fn bad_desc(desc: &str) -> ParseError {
    ParseError::BadDescriptor {
        desc: desc.to_string(),
    }
}

/// The class named by one field/type descriptor, if any. `[[La/b/C;`
/// yields `a/b/C`; primitive and void descriptors yield `None`.
pub fn type_descriptor_class(desc: &str) -> Result<Option<&str>, ParseError> {
    let element = desc.trim_start_matches('[');
    match element.as_bytes().first() {
        Some(b'L') => {
            let name = element[1..].strip_suffix(';').ok_or_else(|| bad_desc(desc))?;
            if name.is_empty() {
                return Err(bad_desc(desc));
            }
            Ok(Some(name))
        }
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V')
            if element.len() == 1 =>
        {
            Ok(None)
        }
        _ => Err(bad_desc(desc)),
    }
}

/// Every class in a method descriptor: the argument types left to right,
/// then the return type.
pub fn method_descriptor_classes(desc: &str) -> Result<Vec<&str>, ParseError> {
    let bytes = desc.as_bytes();
    if bytes.first() != Some(&b'(') {
        return Err(bad_desc(desc));
    }
    let mut classes = Vec::new();
    let mut pos = 1;
    while bytes.get(pos).is_some_and(|b| *b != b')') {
        pos = consume_type(desc, pos, &mut classes)?;
    }
    if bytes.get(pos) != Some(&b')') {
        return Err(bad_desc(desc));
    }
    pos = consume_type(desc, pos + 1, &mut classes)?;
    if pos != bytes.len() {
        return Err(bad_desc(desc));
    }
    Ok(classes)
}

/// Consume one type descriptor starting at `pos`, pushing its class name
/// if it has one. Returns the position after the type.
fn consume_type<'a>(
    desc: &'a str,
    mut pos: usize,
    classes: &mut Vec<&'a str>,
) -> Result<usize, ParseError> {
    let bytes = desc.as_bytes();
    while bytes.get(pos) == Some(&b'[') {
        pos += 1;
    }
    match bytes.get(pos) {
        Some(b'L') => {
            let semi = desc[pos..].find(';').ok_or_else(|| bad_desc(desc))? + pos;
            if semi == pos + 1 {
                return Err(bad_desc(desc));
            }
            classes.push(&desc[pos + 1..semi]);
            Ok(semi + 1)
        }
        Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V') => Ok(pos + 1),
        _ => Err(bad_desc(desc)),
    }
}

/// Classes named by a class signature: superclass, superinterfaces,
/// type-parameter bounds and every type argument, recursively.
pub fn class_signature_classes(sig: &str) -> Result<Vec<String>, ParseError> {
    let mut parser = SignatureParser::new(sig);
    parser.type_params()?;
    parser.class_type_signature()?; // superclass
    while !parser.at_end() {
        parser.class_type_signature()?; // superinterfaces
    }
    Ok(parser.classes)
}

/// Classes named by a method signature: parameter and return types,
/// throws clause and type-parameter bounds.
pub fn method_signature_classes(sig: &str) -> Result<Vec<String>, ParseError> {
    let mut parser = SignatureParser::new(sig);
    parser.type_params()?;
    parser.expect(b'(')?;
    while parser.peek() != Some(b')') {
        parser.type_signature(false)?;
    }
    parser.expect(b')')?;
    parser.type_signature(true)?;
    while parser.peek() == Some(b'^') {
        parser.advance()?;
        match parser.peek() {
            Some(b'T') => parser.type_variable()?,
            _ => parser.class_type_signature()?,
        }
    }
    parser.expect_end()?;
    Ok(parser.classes)
}

/// Classes named by a field or local-variable type signature.
pub fn type_signature_classes(sig: &str) -> Result<Vec<String>, ParseError> {
    let mut parser = SignatureParser::new(sig);
    parser.type_signature(false)?;
    parser.expect_end()?;
    Ok(parser.classes)
}

/// Recursive-descent reader over the signature grammar. Only collects
/// class names; generic structure is validated but otherwise discarded.
struct SignatureParser<'a> {
    sig: &'a str,
    pos: usize,
    classes: Vec<String>,
}

impl<'a> SignatureParser<'a> {
    fn new(sig: &'a str) -> Self {
        Self {
            sig,
            pos: 0,
            classes: Vec::new(),
        }
    }

    fn error(&self) -> ParseError {
        ParseError::BadSignature {
            signature: self.sig.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.sig.as_bytes().get(self.pos).copied()
    }

    fn advance(&mut self) -> Result<u8, ParseError> {
        let byte = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        Ok(byte)
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        if self.advance()? == byte {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn at_end(&self) -> bool {
        self.pos == self.sig.len()
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Scan past identifier characters. Identifiers never contain
    /// `. ; [ / < > :`; package-qualified names allow `/` between
    /// identifiers, which `allow_slash` opts into.
    fn scan_name(&mut self, allow_slash: bool) -> Result<&'a str, ParseError> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            let stop = matches!(byte, b'.' | b';' | b'[' | b'<' | b'>' | b':')
                || (!allow_slash && byte == b'/');
            if stop {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error());
        }
        Ok(&self.sig[start..self.pos])
    }

    /// `<T:Bound:Bound;U:...>`, the optional leading type parameters.
    fn type_params(&mut self) -> Result<(), ParseError> {
        if self.peek() != Some(b'<') {
            return Ok(());
        }
        self.advance()?;
        while self.peek() != Some(b'>') {
            self.scan_name(false)?;
            self.expect(b':')?;
            // the class bound may be empty
            if matches!(self.peek(), Some(b'L' | b'[' | b'T')) {
                self.field_type_signature()?;
            }
            while self.peek() == Some(b':') {
                self.advance()?;
                self.field_type_signature()?;
            }
        }
        self.expect(b'>')
    }

    fn type_signature(&mut self, allow_void: bool) -> Result<(), ParseError> {
        match self.peek().ok_or_else(|| self.error())? {
            b'L' | b'[' | b'T' => self.field_type_signature(),
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
                self.advance().map(|_| ())
            }
            b'V' if allow_void => self.advance().map(|_| ()),
            _ => Err(self.error()),
        }
    }

    fn field_type_signature(&mut self) -> Result<(), ParseError> {
        match self.peek().ok_or_else(|| self.error())? {
            b'L' => self.class_type_signature(),
            b'T' => self.type_variable(),
            b'[' => {
                self.advance()?;
                self.type_signature(false)
            }
            _ => Err(self.error()),
        }
    }

    fn type_variable(&mut self) -> Result<(), ParseError> {
        self.expect(b'T')?;
        self.scan_name(false)?;
        self.expect(b';')
    }

    /// `La/b/Outer<Args>.Inner<Args>;` collects the top-level class
    /// name; inner-class suffixes only add their own type arguments,
    /// since the reference folds to the container anyway.
    fn class_type_signature(&mut self) -> Result<(), ParseError> {
        self.expect(b'L')?;
        let name = self.scan_name(true)?;
        self.classes.push(name.to_string());
        if self.peek() == Some(b'<') {
            self.type_arguments()?;
        }
        while self.peek() == Some(b'.') {
            self.advance()?;
            self.scan_name(false)?;
            if self.peek() == Some(b'<') {
                self.type_arguments()?;
            }
        }
        self.expect(b';')
    }

    fn type_arguments(&mut self) -> Result<(), ParseError> {
        self.expect(b'<')?;
        if self.peek() == Some(b'>') {
            return Err(self.error());
        }
        while self.peek() != Some(b'>') {
            match self.peek().ok_or_else(|| self.error())? {
                b'*' => {
                    self.advance()?;
                }
                b'+' | b'-' => {
                    self.advance()?;
                    self.field_type_signature()?;
                }
                _ => self.field_type_signature()?,
            }
        }
        self.expect(b'>')
    }
}

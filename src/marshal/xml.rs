//! Marshaler for application/xml data.
//!
//! The format specifics match the server side's content-negotiation based
//! entity marshaler: scalar fields whose key carries an `@` prefix become
//! attributes, every other field becomes one child element per value, and
//! sequence fields become sibling elements sharing the field name. Records
//! are represented as [`serde_json::Value`] trees, whose maps preserve key
//! order; joint references to the same subtree are emitted once per
//! occurrence, and cyclic graphs cannot be expressed in this data model.

use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::marshal::error::MarshalError;
use crate::marshal::scalar_text;

const DOC_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>";

/// Recursively marshals the given record into an XML document rooted at the
/// given element name. Fails with [`MarshalError::InvalidArgument`] if the
/// value is null or a sequence, as neither may form a document root.
pub fn marshal(object: &Value, root_element_name: &str) -> Result<String, MarshalError> {
    if object.is_null() || object.is_array() {
        return Err(MarshalError::InvalidArgument(
            "only a record may form the document root",
        ));
    }

    let mut text = String::from(DOC_DECLARATION);
    write_element(root_element_name, object, &mut text)?;
    Ok(text)
}

/// Recursively unmarshals the given XML text into a record. A root element
/// without attributes and child elements yields an empty record, not its text
/// content; this asymmetry with [`marshal`] is part of the wire contract.
/// Otherwise each element contributes its attributes as `@`-prefixed keys and
/// one key per distinct child element name, with recurring names accumulating
/// into sequences in encounter order. The result always carries a synthetic
/// `type` field holding the root element name, so callers can dispatch on the
/// entity kind.
pub fn unmarshal(xml: &str) -> Result<Value, MarshalError> {
    let root_element = XmlReader::new(xml).read_document()?;

    let mut object = if root_element.attributes.is_empty() && root_element.children.is_empty() {
        Map::new()
    } else {
        convert_record(&root_element)
    };
    object.insert("type".to_string(), Value::String(root_element.name));

    Ok(Value::Object(object))
}

fn write_element(name: &str, value: &Value, text: &mut String) -> Result<(), MarshalError> {
    match value {
        // null sequence items map to empty elements
        Value::Null => {
            text.push('<');
            text.push_str(name);
            text.push_str("/>");
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) => {
            let content = scalar_text(value).unwrap_or_default();
            if content.is_empty() {
                text.push('<');
                text.push_str(name);
                text.push_str("/>");
            } else {
                text.push('<');
                text.push_str(name);
                text.push('>');
                escape_text(&content, text);
                text.push_str("</");
                text.push_str(name);
                text.push('>');
            }
        }
        Value::Array(_) => {
            return Err(MarshalError::InvalidArgument(
                "sequences cannot nest directly within sequences",
            ));
        }
        Value::Object(map) => {
            text.push('<');
            text.push_str(name);

            for (key, value) in map {
                if value.is_null() {
                    continue;
                }
                if let Some(attribute_name) = key.strip_prefix('@') {
                    let content = scalar_text(value).ok_or(MarshalError::InvalidArgument(
                        "attribute values must be scalar",
                    ))?;
                    text.push(' ');
                    text.push_str(attribute_name);
                    text.push_str("=\"");
                    escape_attribute(&content, text);
                    text.push('"');
                }
            }

            let mut content = String::new();
            for (key, value) in map {
                if value.is_null() || key.starts_with('@') {
                    continue;
                }
                match value {
                    Value::Array(elements) => {
                        for element in elements {
                            write_element(key, element, &mut content)?;
                        }
                    }
                    _ => write_element(key, value, &mut content)?,
                }
            }

            if content.is_empty() {
                text.push_str("/>");
            } else {
                text.push('>');
                text.push_str(&content);
                text.push_str("</");
                text.push_str(name);
                text.push('>');
            }
        }
    }

    Ok(())
}

fn convert(element: &XmlElement) -> Value {
    if element.attributes.is_empty() && element.children.is_empty() {
        return Value::String(element.text.clone());
    }
    Value::Object(convert_record(element))
}

fn convert_record(element: &XmlElement) -> Map<String, Value> {
    let mut object = Map::new();

    for (name, value) in &element.attributes {
        object.insert(format!("@{name}"), Value::String(value.clone()));
    }

    for child in &element.children {
        let value = convert(child);
        match object.entry(child.name.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Value::Array(elements) => elements.push(value),
                existing => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            },
            Entry::Vacant(vacant) => {
                vacant.insert(value);
            }
        }
    }

    object
}

fn escape_text(content: &str, text: &mut String) {
    for character in content.chars() {
        match character {
            '&' => text.push_str("&amp;"),
            '<' => text.push_str("&lt;"),
            '>' => text.push_str("&gt;"),
            _ => text.push(character),
        }
    }
}

fn escape_attribute(content: &str, text: &mut String) {
    for character in content.chars() {
        match character {
            '&' => text.push_str("&amp;"),
            '<' => text.push_str("&lt;"),
            '>' => text.push_str("&gt;"),
            '"' => text.push_str("&quot;"),
            _ => text.push(character),
        }
    }
}

struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: String,
}

/// Minimal reader for the XML subset the entity marshalers exchange:
/// declarations, comments, CDATA sections, elements, attributes and character
/// data with the predefined and numeric entity references. Doctype internal
/// subsets and processing beyond that are out of contract.
struct XmlReader<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> XmlReader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, position: 0 }
    }

    fn read_document(mut self) -> Result<XmlElement, MarshalError> {
        self.skip_misc()?;
        let element = self.read_element()?;
        self.skip_misc()?;
        if self.position < self.input.len() {
            return Err(MarshalError::syntax(
                self.position,
                "content after the document element",
            ));
        }
        Ok(element)
    }

    fn read_element(&mut self) -> Result<XmlElement, MarshalError> {
        self.expect(b'<')?;
        let name = self.read_name()?;
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'/') => {
                    self.position += 1;
                    self.expect(b'>')?;
                    return Ok(XmlElement {
                        name,
                        attributes,
                        children: Vec::new(),
                        text: String::new(),
                    });
                }
                Some(b'>') => {
                    self.position += 1;
                    break;
                }
                Some(_) => {
                    let attribute_name = self.read_name()?;
                    self.skip_whitespace();
                    self.expect(b'=')?;
                    self.skip_whitespace();
                    let value = self.read_quoted()?;
                    attributes.push((attribute_name, value));
                }
                None => {
                    return Err(MarshalError::syntax(self.position, "unterminated start tag"));
                }
            }
        }

        let mut children = Vec::new();
        let mut text = String::new();

        loop {
            if self.remainder().starts_with("</") {
                self.position += 2;
                let end_name = self.read_name()?;
                if end_name != name {
                    return Err(MarshalError::syntax(
                        self.position,
                        format!("end tag </{end_name}> does not match <{name}>"),
                    ));
                }
                self.skip_whitespace();
                self.expect(b'>')?;
                break;
            } else if self.remainder().starts_with("<!--") {
                self.skip_comment()?;
            } else if self.remainder().starts_with("<![CDATA[") {
                self.read_cdata(&mut text)?;
            } else if self.remainder().starts_with("<?") {
                self.skip_instruction()?;
            } else if self.peek() == Some(b'<') {
                children.push(self.read_element()?);
            } else if self.peek().is_some() {
                self.read_character_data(&mut text)?;
            } else {
                return Err(MarshalError::syntax(
                    self.position,
                    format!("unexpected end of input inside <{name}>"),
                ));
            }
        }

        Ok(XmlElement {
            name,
            attributes,
            children,
            text,
        })
    }

    fn read_name(&mut self) -> Result<String, MarshalError> {
        let start = self.position;
        for character in self.remainder().chars() {
            let accepted = if self.position == start {
                character.is_ascii_alphabetic() || matches!(character, '_' | ':') || !character.is_ascii()
            } else {
                character.is_ascii_alphanumeric()
                    || matches!(character, '-' | '_' | '.' | ':')
                    || !character.is_ascii()
            };
            if !accepted {
                break;
            }
            self.position += character.len_utf8();
        }
        if self.position == start {
            return Err(MarshalError::syntax(start, "expected a name"));
        }
        Ok(self.input[start..self.position].to_string())
    }

    fn read_quoted(&mut self) -> Result<String, MarshalError> {
        let quote = match self.peek() {
            Some(quote @ (b'"' | b'\'')) => quote,
            _ => return Err(MarshalError::syntax(self.position, "expected a quoted value")),
        };
        self.position += 1;

        let mut value = String::new();
        loop {
            match self.peek() {
                Some(byte) if byte == quote => {
                    self.position += 1;
                    return Ok(value);
                }
                Some(b'&') => {
                    let character = self.read_entity()?;
                    value.push(character);
                }
                Some(_) => {
                    let character = self.current_char()?;
                    value.push(character);
                    self.position += character.len_utf8();
                }
                None => {
                    return Err(MarshalError::syntax(self.position, "unterminated attribute value"));
                }
            }
        }
    }

    fn read_character_data(&mut self, text: &mut String) -> Result<(), MarshalError> {
        while let Some(byte) = self.peek() {
            match byte {
                b'<' => break,
                b'&' => {
                    let character = self.read_entity()?;
                    text.push(character);
                }
                _ => {
                    let character = self.current_char()?;
                    text.push(character);
                    self.position += character.len_utf8();
                }
            }
        }
        Ok(())
    }

    fn read_entity(&mut self) -> Result<char, MarshalError> {
        let start = self.position;
        self.expect(b'&')?;
        let Some(end) = self.remainder().find(';') else {
            return Err(MarshalError::syntax(start, "unterminated entity reference"));
        };
        let name = &self.remainder()[..end];
        let character = match name {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            _ => {
                let code = if let Some(hexadecimal) = name.strip_prefix("#x") {
                    u32::from_str_radix(hexadecimal, 16).ok()
                } else if let Some(decimal) = name.strip_prefix('#') {
                    decimal.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| MarshalError::syntax(start, format!("unknown entity &{name};")))?
            }
        };
        self.position += end + 1;
        Ok(character)
    }

    fn read_cdata(&mut self, text: &mut String) -> Result<(), MarshalError> {
        self.position += "<![CDATA[".len();
        let Some(end) = self.remainder().find("]]>") else {
            return Err(MarshalError::syntax(self.position, "unterminated CDATA section"));
        };
        text.push_str(&self.remainder()[..end]);
        self.position += end + "]]>".len();
        Ok(())
    }

    fn skip_comment(&mut self) -> Result<(), MarshalError> {
        self.position += "<!--".len();
        let Some(end) = self.remainder().find("-->") else {
            return Err(MarshalError::syntax(self.position, "unterminated comment"));
        };
        self.position += end + "-->".len();
        Ok(())
    }

    fn skip_instruction(&mut self) -> Result<(), MarshalError> {
        self.position += "<?".len();
        let Some(end) = self.remainder().find("?>") else {
            return Err(MarshalError::syntax(self.position, "unterminated processing instruction"));
        };
        self.position += end + "?>".len();
        Ok(())
    }

    fn skip_misc(&mut self) -> Result<(), MarshalError> {
        loop {
            self.skip_whitespace();
            if self.remainder().starts_with("\u{feff}") {
                self.position += "\u{feff}".len();
            } else if self.remainder().starts_with("<?") {
                self.skip_instruction()?;
            } else if self.remainder().starts_with("<!--") {
                self.skip_comment()?;
            } else if self.remainder().starts_with("<!DOCTYPE") {
                let Some(end) = self.remainder().find('>') else {
                    return Err(MarshalError::syntax(self.position, "unterminated doctype"));
                };
                self.position += end + 1;
            } else {
                return Ok(());
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(byte) = self.peek() {
            if !byte.is_ascii_whitespace() {
                break;
            }
            self.position += 1;
        }
    }

    fn remainder(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn current_char(&self) -> Result<char, MarshalError> {
        self.remainder()
            .chars()
            .next()
            .ok_or_else(|| MarshalError::syntax(self.position, "unexpected end of input"))
    }

    fn expect(&mut self, byte: u8) -> Result<(), MarshalError> {
        if self.peek() == Some(byte) {
            self.position += 1;
            Ok(())
        } else {
            Err(MarshalError::syntax(
                self.position,
                format!("expected '{}'", char::from(byte)),
            ))
        }
    }
}

//! Generic XML tree with optional-path access.
//!
//! Documents are parsed into [`XmlElement`] nodes whose children are kept as
//! `name -> Vec<XmlElement>`, so a repeatable element is always a list even
//! when it occurs once. Element names lose their namespace prefix
//! (`ns:return` -> `return`); attribute names keep it (`xsi:nil`), because
//! the prefix is what tells a nil marker apart from an ordinary attribute.
//!
//! SOAP responses omit absent fields instead of sending empty ones, so every
//! accessor takes a path and yields `None` (or a caller default) as soon as
//! any segment is missing.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::fields::parse_numeric_text;
use crate::ValidationError;

/// One element of a parsed XML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub attributes: BTreeMap<String, String>,
    pub children: BTreeMap<String, Vec<XmlElement>>,
    pub text: String,
}

impl XmlElement {
    /// Parses a document and returns a synthetic root whose children are the top-level elements.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<(String, XmlElement)> = vec![(String::new(), XmlElement::default())];

        loop {
            let event = reader.read_event().map_err(|error| ValidationError::MalformedXml {
                reason: format!("{error} at byte {}", reader.buffer_position()),
            })?;

            match event {
                Event::Start(start) => {
                    let element = element_from_start(&start)?;
                    stack.push((local_name(&start), element));
                }
                Event::Empty(start) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, local_name(&start), element)?;
                }
                Event::Text(text) => {
                    let value = text.unescape().map_err(|error| ValidationError::MalformedXml {
                        reason: error.to_string(),
                    })?;
                    append_text(&mut stack, &value);
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    append_text(&mut stack, &value);
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(ValidationError::MalformedXml {
                            reason: String::from("unexpected closing tag"),
                        });
                    }
                    if let Some((name, element)) = stack.pop() {
                        attach(&mut stack, name, element)?;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() != 1 {
            return Err(ValidationError::MalformedXml {
                reason: String::from("document ended with unclosed elements"),
            });
        }

        stack
            .pop()
            .map(|(_, root)| root)
            .ok_or_else(|| ValidationError::MalformedXml {
                reason: String::from("empty document"),
            })
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.get(name).and_then(|list| list.first())
    }

    /// All children with the given local name, in document order.
    pub fn children_named(&self, name: &str) -> &[XmlElement] {
        self.children.get(name).map_or(&[], Vec::as_slice)
    }

    /// Follows `path`, taking the first element of each list along the way.
    pub fn at(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter()
            .try_fold(self, |current, segment| current.child(segment))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// True when the element carries `xsi:nil="true"`, the SOAP spelling of null.
    pub fn is_nil(&self) -> bool {
        self.attributes
            .iter()
            .any(|(name, value)| {
                (name == "nil" || name.ends_with(":nil")) && value.trim().eq_ignore_ascii_case("true")
            })
    }

    /// Trimmed text at `path`; nil elements and empty text count as absent.
    pub fn text_at(&self, path: &[&str]) -> Option<&str> {
        self.at(path)
            .filter(|element| !element.is_nil())
            .map(|element| element.text.trim())
            .filter(|text| !text.is_empty())
    }

    pub fn text_or(&self, path: &[&str], default: &str) -> String {
        self.text_at(path).unwrap_or(default).to_owned()
    }

    pub fn number_at(&self, path: &[&str]) -> Option<f64> {
        self.text_at(path).and_then(parse_numeric_text)
    }

    pub fn number_or(&self, path: &[&str], default: f64) -> f64 {
        self.number_at(path).unwrap_or(default)
    }

    pub fn bool_or(&self, path: &[&str], default: bool) -> bool {
        match self.text_at(path).map(str::to_ascii_lowercase).as_deref() {
            Some("true") | Some("1") | Some("y") => true,
            Some("false") | Some("0") | Some("n") => false,
            _ => default,
        }
    }
}

/// Escapes text for use inside a hand-built XML document.
pub fn escape_text(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}

/// Renders `<{tag}>{escaped value}</{tag}>`.
pub fn leaf(tag: &str, value: impl std::fmt::Display) -> String {
    format!("<{tag}>{}</{tag}>", escape_text(&value.to_string()))
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, ValidationError> {
    let mut element = XmlElement::default();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|error| ValidationError::MalformedXml {
            reason: error.to_string(),
        })?;
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|error| ValidationError::MalformedXml {
                reason: error.to_string(),
            })?
            .into_owned();
        element.attributes.insert(name, value);
    }
    Ok(element)
}

fn attach(
    stack: &mut [(String, XmlElement)],
    name: String,
    element: XmlElement,
) -> Result<(), ValidationError> {
    let (_, parent) = stack.last_mut().ok_or_else(|| ValidationError::MalformedXml {
        reason: String::from("element outside of document root"),
    })?;
    parent.children.entry(name).or_default().push(element);
    Ok(())
}

fn append_text(stack: &mut [(String, XmlElement)], value: &str) {
    if let Some((_, current)) = stack.last_mut() {
        current.text.push_str(value);
    }
}

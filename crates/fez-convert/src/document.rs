//! Owned XML element tree with the small query surface the converters need.
//!
//! Documents are pull-parsed with quick-xml into [`Element`] values. Numeric
//! attributes are parsed culture-invariantly (`.` decimal separator), and a
//! malformed value is reported with the element and attribute it came from.

use crate::error::ConvertError;
use glam::{Quat, Vec2, Vec3};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    pub text: String,
}

/// Load and parse an XML document from disk, returning its root element.
pub fn load(path: &Path) -> Result<Element, ConvertError> {
    if !path.is_file() {
        return Err(ConvertError::MissingDocument {
            path: path.to_path_buf(),
        });
    }
    let xml = fs::read_to_string(path)?;
    parse_document(&xml, path)
}

/// Parse an XML string, returning its root element.
pub fn parse_str(xml: &str) -> Result<Element, ConvertError> {
    parse_document(xml, Path::new("<string>"))
}

fn parse_document(xml: &str, source: &Path) -> Result<Element, ConvertError> {
    let xml_error = |message: String| ConvertError::Xml {
        path: source.to_path_buf(),
        message,
    };

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => stack.push(start_element(e).map_err(xml_error)?),
            Ok(Event::Empty(ref e)) => {
                let element = start_element(e).map_err(xml_error)?;
                attach(&mut stack, &mut root, element).map_err(xml_error)?;
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| xml_error("unbalanced closing tag".into()))?;
                attach(&mut stack, &mut root, element).map_err(xml_error)?;
            }
            Ok(Event::Text(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| xml_error(e.to_string()))?;
                    top.text.push_str(text.trim());
                }
            }
            Ok(Event::CData(ref t)) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&t[..]));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(xml_error("unexpected EOF inside element".into()));
    }
    root.ok_or_else(|| xml_error("document has no root element".into()))
}

fn start_element(e: &BytesStart) -> Result<Element, String> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| err.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|err| err.to_string())?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Element {
        name,
        attributes,
        ..Default::default()
    })
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(format!("second root element <{}>", element.name)),
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn require_attr(&self, name: &str) -> Result<&str, ConvertError> {
        self.attr(name)
            .ok_or_else(|| ConvertError::MissingAttribute {
                attribute: name.to_string(),
                element: self.name.clone(),
            })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn require_child(&self, name: &str) -> Result<&Element, ConvertError> {
        self.child(name).ok_or_else(|| ConvertError::MissingElement {
            element: name.to_string(),
            parent: self.name.clone(),
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a chain of child names, taking the first match at each step.
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |el, name| el.child(name))
    }

    pub fn require_path(&self, names: &[&str]) -> Result<&Element, ConvertError> {
        names
            .iter()
            .try_fold(self, |el, name| el.require_child(name))
    }

    /// All elements reachable by the chain of child names, in document order.
    pub fn path_all(&self, names: &[&str]) -> Vec<&Element> {
        let mut current = vec![self];
        for name in names {
            current = current
                .into_iter()
                .flat_map(|el| el.children.iter().filter(move |c| c.name == *name))
                .collect();
        }
        current
    }

    /// Every descendant (excluding `self`) with the given name, pre-order.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_descendants(self, name, &mut found);
        found
    }

    pub fn parse_attr<T: FromStr>(&self, name: &str) -> Result<T, ConvertError> {
        let value = self.require_attr(name)?;
        value.trim().parse().map_err(|_| ConvertError::InvalidNumber {
            element: self.name.clone(),
            attribute: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn parse_text<T: FromStr>(&self) -> Result<T, ConvertError> {
        self.text.trim().parse().map_err(|_| ConvertError::InvalidNumber {
            element: self.name.clone(),
            attribute: "#text".to_string(),
            value: self.text.clone(),
        })
    }

    pub fn f32_attr(&self, name: &str) -> Result<f32, ConvertError> {
        self.parse_attr(name)
    }

    pub fn i32_attr(&self, name: &str) -> Result<i32, ConvertError> {
        self.parse_attr(name)
    }

    /// `"True"` is true; any other value, or no attribute at all, is false.
    pub fn bool_attr(&self, name: &str) -> bool {
        self.attr(name) == Some("True")
    }

    pub fn vector2(&self) -> Result<Vec2, ConvertError> {
        Ok(Vec2::new(self.f32_attr("x")?, self.f32_attr("y")?))
    }

    pub fn vector3(&self) -> Result<Vec3, ConvertError> {
        Ok(Vec3::new(
            self.f32_attr("x")?,
            self.f32_attr("y")?,
            self.f32_attr("z")?,
        ))
    }

    pub fn quaternion(&self) -> Result<Quat, ConvertError> {
        Ok(Quat::from_xyzw(
            self.f32_attr("x")?,
            self.f32_attr("y")?,
            self.f32_attr("z")?,
            self.f32_attr("w")?,
        ))
    }

    /// Read `<name><Vector3 .../></name>` below this element.
    pub fn vector3_at(&self, name: &str) -> Result<Vec3, ConvertError> {
        self.require_path(&[name, "Vector3"])?.vector3()
    }

    pub fn vector2_at(&self, name: &str) -> Result<Vec2, ConvertError> {
        self.require_path(&[name, "Vector2"])?.vector2()
    }

    pub fn quaternion_at(&self, name: &str) -> Result<Quat, ConvertError> {
        self.require_path(&[name, "Quaternion"])?.quaternion()
    }
}

fn collect_descendants<'a>(el: &'a Element, name: &str, found: &mut Vec<&'a Element>) {
    for child in &el.children {
        if child.name == name {
            found.push(child);
        }
        collect_descendants(child, name, found);
    }
}

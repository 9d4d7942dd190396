//! Namespace-aware in-memory XML element tree built from quick-xml events.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::trace;

use ogc_common::{OgcError, OgcResult};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// A parsed XML document.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    root: XmlElement,
}

/// An attribute with its resolved namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlAttribute {
    pub prefix: Option<String>,
    pub local_name: String,
    pub namespace: Option<String>,
    pub value: String,
}

/// An element with resolved namespace, attributes, text and child elements.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    prefix: Option<String>,
    local_name: String,
    namespace: Option<String>,
    attributes: Vec<XmlAttribute>,
    /// Namespace declarations made on this element: (prefix, uri).
    declarations: Vec<(Option<String>, String)>,
    children: Vec<XmlElement>,
    text: String,
}

/// Namespace declarations in scope while parsing, innermost last.
type Scopes = Vec<Vec<(Option<String>, String)>>;

impl XmlDocument {
    /// Parse a complete document from bytes.
    ///
    /// The encoding comes from the BOM or the XML declaration, defaulting to
    /// UTF-8. Bytes that do not decode in that encoding are an error.
    pub fn parse(bytes: &[u8]) -> OgcResult<Self> {
        let mut reader = Reader::from_reader(bytes);

        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut scopes: Scopes = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = open_element(&reader, &e, &mut scopes)?;
                    stack.push(element);
                }
                Ok(Event::Empty(e)) => {
                    let element = open_element(&reader, &e, &mut scopes)?;
                    scopes.pop();
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OgcError::Xml("unbalanced end tag".to_string()))?;
                    scopes.pop();
                    attach(&mut stack, &mut root, element)?;
                }
                // Text is kept untrimmed so runs split by CDATA join with
                // their whitespace; `text()` trims the result.
                Ok(Event::Text(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = t.unescape().map_err(|e| xml_error(&reader, e))?;
                        if !(current.text.is_empty() && text.trim().is_empty()) {
                            current.text.push_str(&text);
                        }
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = reader
                            .decoder()
                            .decode(&t)
                            .map_err(|e| xml_error(&reader, e))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(xml_error(&reader, e)),
                _ => {}
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OgcError::Xml(format!(
                "unexpected end of document inside <{}>",
                stack.last().map(|e| e.qualified_name()).unwrap_or_default()
            )));
        }

        let root = root.ok_or_else(|| OgcError::Xml("document has no root element".to_string()))?;
        trace!(
            root = %root.qualified_name(),
            encoding = reader.decoder().encoding().name(),
            "Parsed XML document"
        );
        Ok(Self { root })
    }

    pub fn parse_str(xml: &str) -> OgcResult<Self> {
        Self::parse(xml.as_bytes())
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Take ownership of the root element.
    pub fn into_root(self) -> XmlElement {
        self.root
    }

    /// Resolve a namespace prefix declared anywhere in the document.
    ///
    /// Declarations on the root win; otherwise the first declaration in
    /// document order is used. Used to resolve QName-valued attributes such
    /// as `type="gml:PointPropertyType"` in schemas.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<&str> {
        if prefix == "xml" {
            return Some(XML_NAMESPACE);
        }
        std::iter::once(&self.root)
            .chain(self.root.descendants())
            .flat_map(|e| e.declarations.iter())
            .find(|(p, _)| p.as_deref() == Some(prefix))
            .map(|(_, uri)| uri.as_str())
    }
}

impl XmlElement {
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The name as written in the document (`prefix:local`).
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// True when the element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref().unwrap_or("") == namespace
    }

    pub fn attributes(&self) -> &[XmlAttribute] {
        &self.attributes
    }

    /// Value of an un-namespaced attribute.
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.namespace.is_none() && a.local_name == local_name)
            .map(|a| a.value.as_str())
    }

    /// Value of a namespaced attribute.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    /// Namespace declarations made on this element.
    pub fn declarations(&self) -> &[(Option<String>, String)] {
        &self.declarations
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Take ownership of the child elements.
    pub fn into_children(self) -> Vec<XmlElement> {
        self.children
    }

    /// First child with the given namespace and local name.
    pub fn child(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.is(namespace, local_name))
    }

    /// First child with the given local name, in any namespace.
    pub fn child_by_local_name(&self, local_name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.local_name == local_name)
    }

    /// Text content of this element, trimmed.
    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// Text content, or `None` when empty.
    pub fn text_opt(&self) -> Option<&str> {
        let text = self.text();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Depth-first pre-order iterator over all descendant elements (excluding self).
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Iterator returned by [`XmlElement::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.children.iter().rev());
        Some(next)
    }
}

fn xml_error<R>(reader: &Reader<R>, err: impl std::fmt::Display) -> OgcError {
    OgcError::Xml(format!(
        "parse error at position {}: {}",
        reader.buffer_position(),
        err
    ))
}

fn split_qname(name: &str) -> (Option<String>, String) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, name.to_string()),
    }
}

fn resolve(scopes: &Scopes, prefix: Option<&str>) -> Option<String> {
    if prefix == Some("xml") {
        return Some(XML_NAMESPACE.to_string());
    }
    scopes
        .iter()
        .rev()
        .flat_map(|scope| scope.iter())
        .find(|(p, _)| p.as_deref() == prefix)
        .map(|(_, uri)| uri.clone())
        .filter(|uri| !uri.is_empty())
}

/// Build an element from a start tag, pushing its namespace scope.
fn open_element<R>(
    reader: &Reader<R>,
    start: &BytesStart<'_>,
    scopes: &mut Scopes,
) -> OgcResult<XmlElement> {
    let decoder = reader.decoder();
    let name = decoder
        .decode(start.name().as_ref())
        .map_err(|e| xml_error(reader, e))?
        .into_owned();
    let (prefix, local_name) = split_qname(&name);

    let mut declarations = Vec::new();
    let mut raw_attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| OgcError::Xml(format!("bad attribute in <{}>: {}", name, e)))?;
        let key = decoder
            .decode(attr.key.as_ref())
            .map_err(|e| xml_error(reader, e))?
            .into_owned();
        let value = attr
            .decode_and_unescape_value(reader)
            .map_err(|e| OgcError::Xml(format!("bad attribute value in <{}>: {}", name, e)))?
            .into_owned();

        if key == "xmlns" {
            declarations.push((None, value));
        } else if let Some(declared) = key.strip_prefix("xmlns:") {
            declarations.push((Some(declared.to_string()), value));
        } else {
            raw_attributes.push((key, value));
        }
    }
    scopes.push(declarations.clone());

    let namespace = resolve(scopes, prefix.as_deref());
    let attributes = raw_attributes
        .into_iter()
        .map(|(key, value)| {
            let (prefix, local_name) = split_qname(&key);
            // Un-prefixed attributes are never in the default namespace.
            let namespace = match prefix.as_deref() {
                Some(p) => resolve(scopes, Some(p)),
                None => None,
            };
            XmlAttribute {
                prefix,
                local_name,
                namespace,
                value,
            }
        })
        .collect();

    Ok(XmlElement {
        prefix,
        local_name,
        namespace,
        attributes,
        declarations,
        children: Vec::new(),
        text: String::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> OgcResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(OgcError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

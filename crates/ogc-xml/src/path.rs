//! Compact XPath-subset expressions over [`XmlElement`] trees.

use ogc_common::{OgcError, OgcResult};

use crate::document::XmlElement;
use crate::namespaces::NamespaceTable;

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Context,
    AnyElement,
    Element(QName),
    Attribute(QName),
}

#[derive(Debug, Clone, PartialEq)]
struct QName {
    prefix: Option<String>,
    local: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    HasAttribute(QName),
    NoAttribute(QName),
    AttributeEquals(QName, String),
    AttributeStartsWith(QName, String),
    ChildEquals(QName, String),
}

/// Result of evaluating a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    Elements(Vec<&'a XmlElement>),
    Attributes(Vec<&'a str>),
}

impl<'a> Selection<'a> {
    /// String values: attribute values, or trimmed element text.
    pub fn values(&self) -> Vec<&'a str> {
        match self {
            Selection::Elements(elements) => elements.iter().map(|&e| e.text()).collect(),
            Selection::Attributes(values) => values.clone(),
        }
    }
}

impl NodePath {
    /// Compile an expression.
    pub fn parse(expr: &str) -> OgcResult<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(invalid(expr, "empty expression"));
        }

        let absolute = expr.starts_with('/');
        let mut steps = Vec::new();
        let mut rest = expr;

        while !rest.is_empty() {
            let axis = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                Axis::Descendant
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                Axis::Child
            } else if steps.is_empty() {
                Axis::Child
            } else {
                return Err(invalid(expr, "expected '/'"));
            };

            let end = step_end(rest);
            let (step, remaining) = rest.split_at(end);
            if step.is_empty() {
                return Err(invalid(expr, "empty step"));
            }
            steps.push(parse_step(expr, step, axis)?);
            rest = remaining;
        }

        if let Some(pos) = steps
            .iter()
            .position(|s| matches!(s.test, NodeTest::Attribute(_)))
        {
            if pos + 1 != steps.len() {
                return Err(invalid(expr, "attribute step must be last"));
            }
        }

        Ok(Self { absolute, steps })
    }

    /// True when the final step selects attributes.
    pub fn selects_attributes(&self) -> bool {
        matches!(
            self.steps.last().map(|s| &s.test),
            Some(NodeTest::Attribute(_))
        )
    }

    /// Evaluate against a document root, relative paths starting at `context`.
    pub fn evaluate<'a>(
        &self,
        root: &'a XmlElement,
        context: &'a XmlElement,
        namespaces: &NamespaceTable,
    ) -> OgcResult<Selection<'a>> {
        // With an absolute path the initial node is the document node, whose
        // only child is the root element.
        let mut at_document = self.absolute;
        let mut current: Vec<&'a XmlElement> = if self.absolute {
            Vec::new()
        } else {
            vec![context]
        };

        for step in &self.steps {
            if let NodeTest::Attribute(name) = &step.test {
                let owners = expand(&current, at_document, root, step.axis, true);
                let mut values = Vec::new();
                for owner in owners {
                    if let Some(value) = find_attribute(owner, name, namespaces)? {
                        values.push(value);
                    }
                }
                return Ok(Selection::Attributes(values));
            }

            if step.test == NodeTest::Context {
                if step.axis == Axis::Descendant {
                    current = expand(&current, at_document, root, Axis::Descendant, true);
                    at_document = false;
                }
                current = filter_predicates(current, &step.predicates, namespaces)?;
                continue;
            }

            let candidates = expand(&current, at_document, root, step.axis, false);
            at_document = false;

            let mut selected = Vec::new();
            for candidate in candidates {
                let name_ok = match &step.test {
                    NodeTest::AnyElement => true,
                    NodeTest::Element(name) => element_matches(candidate, name, namespaces)?,
                    NodeTest::Context | NodeTest::Attribute(_) => false,
                };
                if name_ok {
                    selected.push(candidate);
                }
            }
            current = filter_predicates(selected, &step.predicates, namespaces)?;
        }

        if at_document {
            current = vec![root];
        }
        Ok(Selection::Elements(current))
    }
}

impl std::str::FromStr for NodePath {
    type Err = OgcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePath::parse(s)
    }
}

fn invalid(expr: &str, reason: &str) -> OgcError {
    OgcError::Xml(format!("invalid path '{}': {}", expr, reason))
}

/// Candidate nodes for the next step.
///
/// `include_self` applies to the descendant axis: attribute and context steps
/// after `//` consider the context nodes themselves as well.
fn expand<'a>(
    current: &[&'a XmlElement],
    at_document: bool,
    root: &'a XmlElement,
    axis: Axis,
    include_self: bool,
) -> Vec<&'a XmlElement> {
    match (at_document, axis) {
        (true, Axis::Child) => vec![root],
        (true, Axis::Descendant) => std::iter::once(root).chain(root.descendants()).collect(),
        (false, Axis::Child) => {
            if include_self {
                current.to_vec()
            } else {
                current.iter().copied().flat_map(|e| e.children().iter()).collect()
            }
        }
        (false, Axis::Descendant) => {
            // Nested context nodes would otherwise yield the same descendant twice.
            let dedup = current.len() > 1;
            let mut out: Vec<&'a XmlElement> = Vec::new();
            for &element in current {
                let nodes = include_self
                    .then_some(element)
                    .into_iter()
                    .chain(element.descendants());
                for node in nodes {
                    if !dedup || !out.iter().any(|e| std::ptr::eq(*e, node)) {
                        out.push(node);
                    }
                }
            }
            out
        }
    }
}

fn filter_predicates<'a>(
    elements: Vec<&'a XmlElement>,
    predicates: &[Predicate],
    namespaces: &NamespaceTable,
) -> OgcResult<Vec<&'a XmlElement>> {
    if predicates.is_empty() {
        return Ok(elements);
    }
    let mut kept = Vec::with_capacity(elements.len());
    'elements: for element in elements {
        for predicate in predicates {
            if !predicate_holds(element, predicate, namespaces)? {
                continue 'elements;
            }
        }
        kept.push(element);
    }
    Ok(kept)
}

fn predicate_holds(
    element: &XmlElement,
    predicate: &Predicate,
    namespaces: &NamespaceTable,
) -> OgcResult<bool> {
    Ok(match predicate {
        Predicate::HasAttribute(name) => find_attribute(element, name, namespaces)?.is_some(),
        Predicate::NoAttribute(name) => find_attribute(element, name, namespaces)?.is_none(),
        Predicate::AttributeEquals(name, value) => {
            find_attribute(element, name, namespaces)? == Some(value.as_str())
        }
        Predicate::AttributeStartsWith(name, value) => find_attribute(element, name, namespaces)?
            .map(|v| v.starts_with(value.as_str()))
            .unwrap_or(false),
        Predicate::ChildEquals(name, value) => {
            for child in element.children() {
                if element_matches(child, name, namespaces)? && child.text() == value {
                    return Ok(true);
                }
            }
            false
        }
    })
}

/// Namespace URI required by a prefixed name; `None` means "no namespace".
fn required_namespace<'t>(
    name: &QName,
    namespaces: &'t NamespaceTable,
) -> OgcResult<Option<&'t str>> {
    match &name.prefix {
        None => Ok(None),
        Some(prefix) => {
            let uri = namespaces.resolve(prefix).ok_or_else(|| {
                OgcError::Xml(format!("unbound namespace prefix '{}'", prefix))
            })?;
            Ok(if uri.is_empty() { None } else { Some(uri) })
        }
    }
}

fn element_matches(
    element: &XmlElement,
    name: &QName,
    namespaces: &NamespaceTable,
) -> OgcResult<bool> {
    if name.local != "*" && element.local_name() != name.local {
        return Ok(false);
    }
    Ok(element.namespace() == required_namespace(name, namespaces)?)
}

fn find_attribute<'a>(
    element: &'a XmlElement,
    name: &QName,
    namespaces: &NamespaceTable,
) -> OgcResult<Option<&'a str>> {
    let namespace = required_namespace(name, namespaces)?;
    Ok(element
        .attributes()
        .iter()
        .find(|a| a.local_name == name.local && a.namespace.as_deref() == namespace)
        .map(|a| a.value.as_str()))
}

/// Index of the `/` ending the current step, ignoring brackets and quotes.
fn step_end(s: &str) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, '[') | (None, '(') => depth += 1,
            (None, ']') | (None, ')') => depth = depth.saturating_sub(1),
            (None, '/') if depth == 0 => return i,
            _ => {}
        }
    }
    s.len()
}

fn parse_qname(expr: &str, s: &str) -> OgcResult<QName> {
    let s = s.trim();
    if s.is_empty() {
        return Err(invalid(expr, "empty name"));
    }
    Ok(match s.split_once(':') {
        Some((prefix, local)) => QName {
            prefix: Some(prefix.to_string()),
            local: local.to_string(),
        },
        None => QName {
            prefix: None,
            local: s.to_string(),
        },
    })
}

fn parse_step(expr: &str, step: &str, axis: Axis) -> OgcResult<Step> {
    if let Some(attr) = step.strip_prefix('@') {
        return Ok(Step {
            axis,
            test: NodeTest::Attribute(parse_qname(expr, attr)?),
            predicates: Vec::new(),
        });
    }

    let (name, mut rest) = match step.find('[') {
        Some(i) => step.split_at(i),
        None => (step, ""),
    };
    let test = match name.trim() {
        "." => NodeTest::Context,
        "*" => NodeTest::AnyElement,
        other => NodeTest::Element(parse_qname(expr, other)?),
    };

    let mut predicates = Vec::new();
    while !rest.is_empty() {
        let inner_start = rest
            .strip_prefix('[')
            .ok_or_else(|| invalid(expr, "expected '['"))?;
        let close = closing_bracket(inner_start).ok_or_else(|| invalid(expr, "unclosed '['"))?;
        predicates.push(parse_predicate(expr, &inner_start[..close])?);
        rest = &inner_start[close + 1..];
    }

    Ok(Step {
        axis,
        test,
        predicates,
    })
}

fn closing_bracket(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, ']') => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_literal(expr: &str, s: &str) -> OgcResult<String> {
    let s = s.trim();
    let quoted = s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')));
    if !quoted {
        return Err(invalid(expr, "expected quoted literal"));
    }
    Ok(s[1..s.len() - 1].to_string())
}

fn parse_attribute_ref(expr: &str, s: &str) -> OgcResult<QName> {
    let name = s
        .trim()
        .strip_prefix('@')
        .ok_or_else(|| invalid(expr, "expected attribute reference"))?;
    parse_qname(expr, name)
}

fn parse_predicate(expr: &str, inner: &str) -> OgcResult<Predicate> {
    let inner = inner.trim();

    if let Some(args) = inner
        .strip_prefix("starts-with(")
        .and_then(|a| a.strip_suffix(')'))
    {
        let (attr, literal) = args
            .split_once(',')
            .ok_or_else(|| invalid(expr, "starts-with needs two arguments"))?;
        return Ok(Predicate::AttributeStartsWith(
            parse_attribute_ref(expr, attr)?,
            parse_literal(expr, literal)?,
        ));
    }

    if let Some(arg) = inner.strip_prefix("not(").and_then(|a| a.strip_suffix(')')) {
        return Ok(Predicate::NoAttribute(parse_attribute_ref(expr, arg)?));
    }

    if let Some((lhs, rhs)) = inner.split_once('=') {
        let literal = parse_literal(expr, rhs)?;
        let lhs = lhs.trim();
        return Ok(if lhs.starts_with('@') {
            Predicate::AttributeEquals(parse_attribute_ref(expr, lhs)?, literal)
        } else {
            Predicate::ChildEquals(parse_qname(expr, lhs)?, literal)
        });
    }

    if inner.starts_with('@') {
        return Ok(Predicate::HasAttribute(parse_attribute_ref(expr, inner)?));
    }

    Err(invalid(expr, "unsupported predicate"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::XmlDocument;

    const DOC: &str = r#"<root xmlns="urn:a" xmlns:b="urn:b" xmlns:xlink="http://www.w3.org/1999/xlink">
  <item name="one" kind="gml:Point"><label>first</label></item>
  <item name="two"><label>second</label><b:extra xlink:href="http://x/"/></item>
  <group><item name="three"/></group>
</root>"#;

    fn table() -> NamespaceTable {
        NamespaceTable::new()
            .with("a", "urn:a")
            .with("b", "urn:b")
            .with("xlink", "http://www.w3.org/1999/xlink")
    }

    fn eval<'a>(doc: &'a XmlDocument, path: &str) -> Selection<'a> {
        NodePath::parse(path)
            .unwrap()
            .evaluate(doc.root(), doc.root(), &table())
            .unwrap()
    }

    #[test]
    fn test_absolute_child_steps() {
        let doc = XmlDocument::parse_str(DOC).unwrap();
        match eval(&doc, "/a:root/a:item") {
            Selection::Elements(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_descendant_and_attribute() {
        let doc = XmlDocument::parse_str(DOC).unwrap();
        assert_eq!(eval(&doc, "//a:item/@name").values(), vec!["one", "two", "three"]);
        assert_eq!(
            eval(&doc, "/a:root/a:item/b:extra/@xlink:href").values(),
            vec!["http://x/"]
        );
    }

    #[test]
    fn test_predicates() {
        let doc = XmlDocument::parse_str(DOC).unwrap();
        assert_eq!(eval(&doc, "a:item[@name='two']/a:label").values(), vec!["second"]);
        assert_eq!(eval(&doc, "a:item[a:label='first']/@name").values(), vec!["one"]);
        assert_eq!(
            eval(&doc, "a:item[starts-with(@kind,'gml:')]/@name").values(),
            vec!["one"]
        );
        assert_eq!(eval(&doc, "a:item[not(@kind)]/@name").values(), vec!["two"]);
        assert_eq!(eval(&doc, "//a:item[@kind]/@name").values(), vec!["one"]);
    }

    #[test]
    fn test_wildcard_and_context() {
        let doc = XmlDocument::parse_str(DOC).unwrap();
        match eval(&doc, "*") {
            Selection::Elements(all) => assert_eq!(all.len(), 3),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(eval(&doc, ".//a:item/@name").values().len(), 3);
    }

    #[test]
    fn test_unbound_prefix_is_an_error() {
        let doc = XmlDocument::parse_str(DOC).unwrap();
        let path = NodePath::parse("/zz:root").unwrap();
        assert!(path.evaluate(doc.root(), doc.root(), &table()).is_err());
    }

    #[test]
    fn test_empty_uri_matches_no_namespace() {
        let doc = XmlDocument::parse_str("<Caps><Service><Title>t</Title></Service></Caps>").unwrap();
        let ns = NamespaceTable::new().with("sm", "");
        let selection = NodePath::parse("/sm:Caps/sm:Service/sm:Title")
            .unwrap()
            .evaluate(doc.root(), doc.root(), &ns)
            .unwrap();
        assert_eq!(selection.values(), vec!["t"]);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(NodePath::parse("").is_err());
        assert!(NodePath::parse("a/@b/c").is_err());
        assert!(NodePath::parse("a[@b='x'").is_err());
        assert!(NodePath::parse("a[@b=x]").is_err());
    }
}

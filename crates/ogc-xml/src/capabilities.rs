//! Shared capabilities document with a per-context namespace table.

use std::sync::Arc;

use ogc_common::{OgcError, OgcResult};

use crate::document::{XmlDocument, XmlElement};
use crate::namespaces::NamespaceTable;
use crate::path::{NodePath, Selection};

/// A parsed document plus the namespace bindings used to query it.
///
/// The document itself is immutable and shared behind an `Arc`. Cloning
/// produces a new query context (own namespace table, same document), so a
/// handle passed between providers can be branched without cross-mutation.
#[derive(Debug, Clone)]
pub struct CapabilitiesDocument {
    document: Arc<XmlDocument>,
    namespaces: NamespaceTable,
}

impl CapabilitiesDocument {
    pub fn new(document: XmlDocument) -> Self {
        Self {
            document: Arc::new(document),
            namespaces: NamespaceTable::new(),
        }
    }

    pub fn parse(bytes: &[u8]) -> OgcResult<Self> {
        Ok(Self::new(XmlDocument::parse(bytes)?))
    }

    /// A new context over a different document, keeping this context's
    /// namespace bindings.
    pub fn with_document(&self, document: XmlDocument) -> Self {
        Self {
            document: Arc::new(document),
            namespaces: self.namespaces.clone(),
        }
    }

    pub fn bind_namespace(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.namespaces.bind(prefix, uri);
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.bind_namespace(prefix, uri);
        self
    }

    pub fn namespaces(&self) -> &NamespaceTable {
        &self.namespaces
    }

    pub fn document(&self) -> &XmlDocument {
        &self.document
    }

    pub fn root(&self) -> &XmlElement {
        self.document.root()
    }

    /// True when both handles share the same underlying document.
    pub fn shares_document_with(&self, other: &CapabilitiesDocument) -> bool {
        Arc::ptr_eq(&self.document, &other.document)
    }

    fn evaluate<'a>(&'a self, context: &'a XmlElement, path: &str) -> OgcResult<Selection<'a>> {
        NodePath::parse(path)?.evaluate(self.root(), context, &self.namespaces)
    }

    /// Elements selected by `path`, relative paths starting at the root.
    pub fn select(&self, path: &str) -> OgcResult<Vec<&XmlElement>> {
        self.select_from(self.root(), path)
    }

    /// Elements selected by `path` evaluated in a sub-context.
    pub fn select_from<'a>(
        &'a self,
        context: &'a XmlElement,
        path: &str,
    ) -> OgcResult<Vec<&'a XmlElement>> {
        match self.evaluate(context, path)? {
            Selection::Elements(elements) => Ok(elements),
            Selection::Attributes(_) => Err(OgcError::Xml(format!(
                "path '{}' selects attributes, not elements",
                path
            ))),
        }
    }

    pub fn select_one(&self, path: &str) -> OgcResult<Option<&XmlElement>> {
        Ok(self.select(path)?.into_iter().next())
    }

    pub fn select_one_from<'a>(
        &'a self,
        context: &'a XmlElement,
        path: &str,
    ) -> OgcResult<Option<&'a XmlElement>> {
        Ok(self.select_from(context, path)?.into_iter().next())
    }

    /// First value selected by `path`; empty text counts as absent.
    pub fn value(&self, path: &str) -> OgcResult<Option<String>> {
        self.value_from(self.root(), path)
    }

    pub fn value_from(&self, context: &XmlElement, path: &str) -> OgcResult<Option<String>> {
        Ok(self
            .evaluate(context, path)?
            .values()
            .into_iter()
            .map(str::trim)
            .find(|v| !v.is_empty())
            .map(str::to_string))
    }

    /// All non-empty values selected by `path`, in document order.
    pub fn values_from(&self, context: &XmlElement, path: &str) -> OgcResult<Vec<String>> {
        Ok(self
            .evaluate(context, path)?
            .values()
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn values(&self, path: &str) -> OgcResult<Vec<String>> {
        self.values_from(self.root(), path)
    }
}

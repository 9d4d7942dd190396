//! WMS layer tree model.
//!
//! Layers are built once by the capabilities parser and never mutated. CRS
//! and style inheritance between parent and child layers is not resolved;
//! each node exposes exactly what its document element declares.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ogc_common::{BoundingBox, OgcError, OgcResult};

/// Name given to the root layer synthesized when a document declares more
/// than one top-level `Layer`.
pub const SYNTHESIZED_ROOT_NAME: &str = "__synthesized_root__";

/// A layer in the capabilities layer tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Absent for grouping layers that cannot be requested.
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub queryable: bool,
    pub keywords: Vec<String>,
    /// CRS identifiers in document order, `SRS` values before `CRS` values.
    pub crs: Vec<String>,
    /// Bounding boxes keyed by CRS identifier.
    pub bounding_boxes: BTreeMap<String, BoundingBox>,
    pub lat_lon_bounding_box: Option<BoundingBox>,
    pub styles: Vec<Style>,
    pub children: Vec<Layer>,
}

/// A named rendering style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub name: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub legend: Option<LegendUrl>,
    pub style_sheet_url: Option<String>,
}

/// Legend graphic reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendUrl {
    pub url: String,
    pub format: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Layer {
    /// Root layer wrapping several top-level layers.
    pub fn synthesized_root(children: Vec<Layer>) -> Self {
        Layer {
            name: Some(SYNTHESIZED_ROOT_NAME.to_string()),
            title: Some(String::new()),
            children,
            ..Layer::default()
        }
    }

    pub fn is_synthesized_root(&self) -> bool {
        self.name.as_deref() == Some(SYNTHESIZED_ROOT_NAME)
    }

    /// Label used in diagnostics: the name, else the title.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.title.as_deref())
            .unwrap_or("<unnamed>")
    }

    /// Depth-first pre-order traversal, starting with `self`.
    pub fn iter(&self) -> LayerIter<'_> {
        LayerIter { stack: vec![self] }
    }

    /// First layer named `name` in depth-first order, if any.
    pub fn find(&self, name: &str) -> Option<&Layer> {
        self.iter().find(|layer| layer.name.as_deref() == Some(name))
    }

    /// First layer named `name` in depth-first order.
    pub fn find_layer(&self, name: &str) -> OgcResult<&Layer> {
        self.find(name)
            .ok_or_else(|| OgcError::LayerNotFound(name.to_string()))
    }

    /// All layers that carry a name (requestable layers), depth-first.
    pub fn named_layers(&self) -> Vec<&Layer> {
        self.iter()
            .filter(|layer| layer.name.is_some() && !layer.is_synthesized_root())
            .collect()
    }

    /// Style with the given name.
    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.iter().find(|s| s.name.as_deref() == Some(name))
    }

    /// Legend of the first declared style.
    pub fn default_legend(&self) -> Option<&LegendUrl> {
        self.styles.first().and_then(|s| s.legend.as_ref())
    }

    /// Bounding box declared for `crs`.
    pub fn bounding_box(&self, crs: &str) -> Option<&BoundingBox> {
        self.bounding_boxes.get(crs)
    }

    /// Number of levels in the subtree rooted here (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Layer::depth).max().unwrap_or(0)
    }
}

/// Iterator returned by [`Layer::iter`].
pub struct LayerIter<'a> {
    stack: Vec<&'a Layer>,
}

impl<'a> Iterator for LayerIter<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<Self::Item> {
        let layer = self.stack.pop()?;
        self.stack.extend(layer.children.iter().rev());
        Some(layer)
    }
}

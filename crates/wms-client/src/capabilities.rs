//! WMS GetCapabilities parsing.
//!
//! Parsing is strict about structure and coordinates and lenient about
//! descriptive text:
//! - a missing `Service`, `Capability`, `Layer` or `GetMap` element aborts the parse
//! - a malformed `BoundingBox` or `LatLonBoundingBox` aborts the parse rather
//!   than yielding a wrong extent
//! - absent optional text becomes `None`

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use ogc_common::version::{WMS_NAMESPACE, XLINK_NAMESPACE, XSI_NAMESPACE};
use ogc_common::{BoundingBox, OgcError, OgcResult, WmsVersion};
use ogc_xml::{CapabilitiesDocument, XmlDocument, XmlElement};

use crate::layer::{Layer, LegendUrl, Style};
use crate::service::{ContactAddress, ContactInformation, ServiceDescription};

/// Prefix bound to the version-invariant WMS namespace.
pub const DEFAULT_PREFIX: &str = "sm";
/// Prefix bound to the versioned alias used in every query below.
pub const ALIAS_PREFIX: &str = "wms";

/// HTTP method of a request binding, taken from the `DCPType/HTTP` child name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Other(String),
}

impl HttpMethod {
    pub fn from_element_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("get") {
            HttpMethod::Get
        } else if name.eq_ignore_ascii_case("post") {
            HttpMethod::Post
        } else {
            HttpMethod::Other(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Other(name) => name,
        }
    }
}

/// An endpoint for one operation and HTTP method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineResource {
    pub url: String,
    pub method: HttpMethod,
}

/// Formats and endpoints advertised for one operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationType {
    pub formats: Vec<String>,
    pub bindings: Vec<OnlineResource>,
}

impl OperationType {
    /// Binding to use: GET, else POST, else the first declared.
    pub fn preferred_binding(&self) -> Option<&OnlineResource> {
        self.bindings
            .iter()
            .find(|b| b.method == HttpMethod::Get)
            .or_else(|| self.bindings.iter().find(|b| b.method == HttpMethod::Post))
            .or_else(|| self.bindings.first())
    }

    pub fn supports_format(&self, format: &str) -> bool {
        self.formats.iter().any(|f| f.eq_ignore_ascii_case(format))
    }
}

/// Parsed WMS capabilities.
#[derive(Debug, Clone)]
pub struct WmsCapabilities {
    pub version: WmsVersion,
    pub update_sequence: Option<String>,
    pub service: ServiceDescription,
    /// Root of the layer tree, synthesized when the document has several.
    pub root_layer: Layer,
    pub get_capabilities: Option<OperationType>,
    pub get_map: OperationType,
    pub get_feature_info: Option<OperationType>,
    pub exception_formats: Vec<String>,
    /// `VendorSpecificCapabilities`, passed through uninterpreted.
    pub vendor_specific: Option<XmlElement>,
    document: CapabilitiesDocument,
}

impl WmsCapabilities {
    pub fn parse(bytes: &[u8]) -> OgcResult<Self> {
        Self::from_xml(XmlDocument::parse(bytes)?)
    }

    pub fn from_xml(document: XmlDocument) -> OgcResult<Self> {
        Self::from_document(&CapabilitiesDocument::new(document))
    }

    /// Parse from a shared document handle.
    ///
    /// Namespace bindings are added to a private clone; `shared` is not modified.
    pub fn from_document(shared: &CapabilitiesDocument) -> OgcResult<Self> {
        let root = shared.root();
        let version = match root.attribute("version") {
            Some(v) => WmsVersion::parse(v)?,
            None => return Err(OgcError::MissingVersion),
        };
        if root.local_name() != version.capabilities_root() {
            debug!(
                root = root.local_name(),
                version = %version,
                "Capabilities root element does not match the declared version"
            );
        }

        let doc = bind_namespaces(shared.clone(), version);
        let parser = Parser { doc: &doc };

        let service_node = doc
            .select_one(&format!("/*/{}:Service", ALIAS_PREFIX))?
            .ok_or_else(|| OgcError::missing("Service"))?;
        let capability = doc
            .select_one(&format!("/*/{}:Capability", ALIAS_PREFIX))?
            .ok_or_else(|| OgcError::missing("Capability"))?;

        let service = parser.service(service_node)?;
        let root_layer = parser.root_layer(capability)?;

        let request = doc
            .select_one_from(capability, "wms:Request")?
            .ok_or_else(|| OgcError::missing("Request"))?;
        let get_map = doc
            .select_one_from(request, "wms:GetMap")?
            .ok_or_else(|| OgcError::missing("GetMap"))?;
        let get_map = parser.operation(get_map)?;
        let get_feature_info = match doc.select_one_from(request, "wms:GetFeatureInfo")? {
            Some(op) => Some(parser.operation(op)?),
            None => None,
        };
        let get_capabilities = match doc.select_one_from(request, "wms:GetCapabilities")? {
            Some(op) => Some(parser.operation(op)?),
            None => None,
        };

        let exception_formats = doc.values_from(capability, "wms:Exception/wms:Format")?;
        let vendor_specific = doc
            .select_one_from(capability, "wms:VendorSpecificCapabilities")?
            .cloned();

        info!(
            version = %version,
            layers = root_layer.iter().count(),
            formats = get_map.formats.len(),
            "Parsed WMS capabilities"
        );

        Ok(Self {
            version,
            update_sequence: root.attribute("updateSequence").map(str::to_string),
            service,
            root_layer,
            get_capabilities,
            get_map,
            get_feature_info,
            exception_formats,
            vendor_specific,
            document: doc.clone(),
        })
    }

    /// The query context used for parsing, with the WMS prefixes bound.
    pub fn document(&self) -> &CapabilitiesDocument {
        &self.document
    }

    /// First layer named `name`, depth-first.
    pub fn find_layer(&self, name: &str) -> OgcResult<&Layer> {
        self.root_layer.find_layer(name)
    }

    pub fn map_formats(&self) -> &[String] {
        &self.get_map.formats
    }

    pub fn feature_info_formats(&self) -> &[String] {
        self.get_feature_info
            .as_ref()
            .map(|op| op.formats.as_slice())
            .unwrap_or(&[])
    }
}

/// Bind the default, versioned alias, xlink and xsi prefixes.
pub fn bind_namespaces(doc: CapabilitiesDocument, version: WmsVersion) -> CapabilitiesDocument {
    doc.with_namespace(DEFAULT_PREFIX, WMS_NAMESPACE)
        .with_namespace(ALIAS_PREFIX, version.namespace_alias_uri())
        .with_namespace("xlink", XLINK_NAMESPACE)
        .with_namespace("xsi", XSI_NAMESPACE)
}

struct Parser<'d> {
    doc: &'d CapabilitiesDocument,
}

impl<'d> Parser<'d> {
    fn text(&self, context: &XmlElement, path: &str) -> OgcResult<Option<String>> {
        self.doc.value_from(context, path)
    }

    fn number(&self, context: &XmlElement, path: &str) -> OgcResult<Option<u32>> {
        Ok(self
            .text(context, path)?
            .and_then(|v| v.trim().parse::<u32>().ok()))
    }

    fn service(&self, node: &XmlElement) -> OgcResult<ServiceDescription> {
        Ok(ServiceDescription {
            name: self.text(node, "wms:Name")?,
            title: self.text(node, "wms:Title")?,
            abstract_text: self.text(node, "wms:Abstract")?,
            keywords: self.doc.values_from(node, "wms:KeywordList/wms:Keyword")?,
            online_resource: self.text(node, "wms:OnlineResource/@xlink:href")?,
            contact: self.contact(node)?,
            fees: self.text(node, "wms:Fees")?,
            access_constraints: self.text(node, "wms:AccessConstraints")?,
            layer_limit: self.number(node, "wms:LayerLimit")?,
            max_width: self.number(node, "wms:MaxWidth")?,
            max_height: self.number(node, "wms:MaxHeight")?,
        })
    }

    fn contact(&self, service: &XmlElement) -> OgcResult<Option<ContactInformation>> {
        let node = match self.doc.select_one_from(service, "wms:ContactInformation")? {
            Some(node) => node,
            None => return Ok(None),
        };

        let address = match self.doc.select_one_from(node, "wms:ContactAddress")? {
            Some(a) => Some(ContactAddress {
                address_type: self.text(a, "wms:AddressType")?,
                address: self.text(a, "wms:Address")?,
                city: self.text(a, "wms:City")?,
                state_or_province: self.text(a, "wms:StateOrProvince")?,
                post_code: self.text(a, "wms:PostCode")?,
                country: self.text(a, "wms:Country")?,
            }),
            None => None,
        };

        let contact = ContactInformation {
            person: self.text(node, "wms:ContactPersonPrimary/wms:ContactPerson")?,
            organization: self.text(node, "wms:ContactPersonPrimary/wms:ContactOrganization")?,
            position: self.text(node, "wms:ContactPosition")?,
            address,
            voice_telephone: self.text(node, "wms:ContactVoiceTelephone")?,
            facsimile_telephone: self.text(node, "wms:ContactFacsimileTelephone")?,
            email: self.text(node, "wms:ContactElectronicMailAddress")?,
        };
        Ok((!contact.is_empty()).then_some(contact))
    }

    fn root_layer(&self, capability: &XmlElement) -> OgcResult<Layer> {
        let top_level = self.doc.select_from(capability, "wms:Layer")?;
        match top_level.len() {
            0 => Err(OgcError::missing("Layer")),
            1 => self.layer(top_level[0]),
            count => {
                warn!(count, "Multiple top-level layers, synthesizing a root layer");
                let children = top_level
                    .into_iter()
                    .map(|node| self.layer(node))
                    .collect::<OgcResult<Vec<_>>>()?;
                Ok(Layer::synthesized_root(children))
            }
        }
    }

    fn layer(&self, node: &XmlElement) -> OgcResult<Layer> {
        let name = self.text(node, "wms:Name")?;
        let title = self.text(node, "wms:Title")?;
        let label = name
            .clone()
            .or_else(|| title.clone())
            .unwrap_or_else(|| "<unnamed>".to_string());

        let mut crs = Vec::new();
        for element in ["wms:SRS", "wms:CRS"] {
            for value in self.doc.values_from(node, element)? {
                // Early 1.1 servers list several codes in one element.
                crs.extend(value.split_whitespace().map(str::to_string));
            }
        }

        let mut bounding_boxes = BTreeMap::new();
        for bbox in self.doc.select_from(node, "wms:BoundingBox")? {
            let (key, extent) = parse_bounding_box(bbox, &label)?;
            if bounding_boxes.insert(key.clone(), extent).is_some() {
                debug!(layer = %label, crs = %key, "Duplicate BoundingBox, keeping the last");
            }
        }

        let lat_lon_bounding_box = self.lat_lon_bounding_box(node, &label)?;

        let styles = self
            .doc
            .select_from(node, "wms:Style")?
            .into_iter()
            .map(|style| self.style(style))
            .collect::<OgcResult<Vec<_>>>()?;

        let children = self
            .doc
            .select_from(node, "wms:Layer")?
            .into_iter()
            .map(|child| self.layer(child))
            .collect::<OgcResult<Vec<_>>>()?;

        Ok(Layer {
            name,
            title,
            abstract_text: self.text(node, "wms:Abstract")?,
            queryable: node.attribute("queryable").map(str::trim) == Some("1"),
            keywords: self.doc.values_from(node, "wms:KeywordList/wms:Keyword")?,
            crs,
            bounding_boxes,
            lat_lon_bounding_box,
            styles,
            children,
        })
    }

    /// `LatLonBoundingBox` (1.0-1.1) or `EX_GeographicBoundingBox` (1.3.0).
    fn lat_lon_bounding_box(
        &self,
        node: &XmlElement,
        label: &str,
    ) -> OgcResult<Option<BoundingBox>> {
        let invalid = || OgcError::InvalidLatLonBoundingBox {
            layer: label.to_string(),
        };

        if let Some(bbox) = self.doc.select_one_from(node, "wms:LatLonBoundingBox")? {
            let ordinate = |attr: &str| {
                bbox.attribute(attr)
                    .and_then(parse_float)
                    .ok_or_else(invalid)
            };
            return Ok(Some(BoundingBox::new(
                ordinate("minx")?,
                ordinate("miny")?,
                ordinate("maxx")?,
                ordinate("maxy")?,
            )));
        }

        if let Some(bbox) = self.doc.select_one_from(node, "wms:EX_GeographicBoundingBox")? {
            let ordinate = |child: &str| -> OgcResult<f64> {
                self.text(bbox, child)?
                    .as_deref()
                    .and_then(parse_float)
                    .ok_or_else(invalid)
            };
            return Ok(Some(BoundingBox::new(
                ordinate("wms:westBoundLongitude")?,
                ordinate("wms:southBoundLatitude")?,
                ordinate("wms:eastBoundLongitude")?,
                ordinate("wms:northBoundLatitude")?,
            )));
        }

        Ok(None)
    }

    fn style(&self, node: &XmlElement) -> OgcResult<Style> {
        let legend = match self.doc.select_one_from(node, "wms:LegendURL")? {
            Some(legend) => self
                .text(legend, "wms:OnlineResource/@xlink:href")?
                .map(|url| -> OgcResult<LegendUrl> {
                    Ok(LegendUrl {
                        url,
                        format: self.text(legend, "wms:Format")?,
                        width: legend.attribute("width").and_then(|w| w.trim().parse().ok()),
                        height: legend.attribute("height").and_then(|h| h.trim().parse().ok()),
                    })
                })
                .transpose()?,
            None => None,
        };

        Ok(Style {
            name: self.text(node, "wms:Name")?,
            title: self.text(node, "wms:Title")?,
            abstract_text: self.text(node, "wms:Abstract")?,
            legend,
            style_sheet_url: self.text(node, "wms:StyleSheetURL/wms:OnlineResource/@xlink:href")?,
        })
    }

    fn operation(&self, node: &XmlElement) -> OgcResult<OperationType> {
        let formats = self.doc.values_from(node, "wms:Format")?;

        let mut bindings = Vec::new();
        for binding in self.doc.select_from(node, "wms:DCPType/wms:HTTP/*")? {
            match self.text(binding, "wms:OnlineResource/@xlink:href")? {
                Some(url) => bindings.push(OnlineResource {
                    url,
                    method: HttpMethod::from_element_name(binding.local_name()),
                }),
                None => debug!(
                    operation = node.local_name(),
                    method = binding.local_name(),
                    "Binding without OnlineResource href, skipping"
                ),
            }
        }

        Ok(OperationType { formats, bindings })
    }
}

fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

/// CRS key and extent of a `BoundingBox` element.
///
/// The key comes from the `CRS` attribute, else `SRS`.
fn parse_bounding_box(node: &XmlElement, layer: &str) -> OgcResult<(String, BoundingBox)> {
    let malformed = || OgcError::MalformedBoundingBox {
        layer: layer.to_string(),
    };

    let key = node
        .attribute("CRS")
        .or_else(|| node.attribute("SRS"))
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(malformed)?;

    let ordinate = |attr: &str| {
        node.attribute(attr)
            .and_then(parse_float)
            .ok_or_else(malformed)
    };

    Ok((
        key.to_string(),
        BoundingBox::new(
            ordinate("minx")?,
            ordinate("miny")?,
            ordinate("maxx")?,
            ordinate("maxy")?,
        ),
    ))
}

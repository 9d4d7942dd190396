//! WMS client: capabilities parsing, the layer tree and request building.
//!
//! ```ignore
//! let caps = WmsCapabilities::parse(xml.as_bytes())?;
//! let config = WmsMapConfig::new().layer("countries").crs("EPSG:4326");
//! let url = WmsRequestBuilder::new(&caps, &config)
//!     .get_map_url(&MapRequest::new(bbox, 512, 256))?;
//! ```

pub mod capabilities;
pub mod client;
pub mod getfeatureinfo;
pub mod layer;
pub mod request;
pub mod service;

pub use capabilities::{HttpMethod, OnlineResource, OperationType, WmsCapabilities};
pub use client::{FeatureInfoResponse, MapImage, WmsClient};
pub use getfeatureinfo::{pixel_to_map, FeatureInfoRequest, InfoFormat};
pub use layer::{Layer, LegendUrl, Style, SYNTHESIZED_ROOT_NAME};
pub use request::{
    build_get_map_url, capabilities_url, LayerLegend, MapRequest, WmsMapConfig, WmsRequestBuilder,
};
pub use service::{ContactAddress, ContactInformation, ServiceDescription};

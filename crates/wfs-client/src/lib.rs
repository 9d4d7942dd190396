//! WFS client: feature type metadata resolution, GetFeature requests and
//! GML decoding.
//!
//! ```ignore
//! let client = WfsClient::new(fetcher);
//! let request = FeatureTypeRequest::new(url, "topp:states").version(WfsVersion::V1_0_0);
//! let info = client.describe(&request, None, &cancel).await?;
//! for feature in client.get_features(&info, &request, Some(bbox), &cancel).await? {
//!     let feature = feature?;
//! }
//! ```

pub mod client;
pub mod dialect;
pub mod dispatch;
pub mod feature_type;
pub mod filter;
pub mod gml;
pub mod request;
pub mod resolver;

pub use client::WfsClient;
pub use dialect::{Binding, VersionDialect, WfsOperation};
pub use dispatch::{normalize_type_name, Feature, FeatureStream, GeometryDecoder, GeometryDispatch};
pub use feature_type::{
    ElementDescriptor, FeatureTypeRequest, WfsFeatureTypeInfo, DEFAULT_GEOMETRY_NAME, DEFAULT_SRID,
};
pub use filter::Filter;
pub use gml::{is_gml_geometry, GmlReader};
pub use request::{
    capabilities_url, describe_feature_type_url, get_feature_body, get_feature_url,
    GetFeatureQuery,
};
pub use resolver::{
    resolve_axis_order, resolve_capabilities, resolve_schema, resolve_srid, WfsMetadataResolver,
};

//! Common types and utilities shared across the OGC client crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod query;
pub mod version;

pub use bbox::BoundingBox;
pub use crs::{AxisOrder, AxisOrderRegistry, EpsgAxisOrderRegistry};
pub use error::{ErrorKind, OgcError, OgcResult};
pub use version::{WfsVersion, WmsVersion};

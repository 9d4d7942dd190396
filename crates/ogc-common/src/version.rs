//! Protocol versions for WMS and WFS.
//!
//! Versions are closed enums; every per-version rule is an exhaustive match,
//! so adding a version is a compile-checked table extension.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{OgcError, OgcResult};

/// Default WMS namespace URI. Identical for every version.
pub const WMS_NAMESPACE: &str = "http://www.opengis.net/wms";
pub const XLINK_NAMESPACE: &str = "http://www.w3.org/1999/xlink";
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Supported WMS protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WmsVersion {
    #[serde(rename = "1.0.0")]
    V1_0_0,
    #[serde(rename = "1.1.0")]
    V1_1_0,
    #[serde(rename = "1.1.1")]
    V1_1_1,
    #[serde(rename = "1.3.0")]
    V1_3_0,
}

impl WmsVersion {
    pub const ALL: [WmsVersion; 4] = [
        WmsVersion::V1_0_0,
        WmsVersion::V1_1_0,
        WmsVersion::V1_1_1,
        WmsVersion::V1_3_0,
    ];

    /// Parse a version string against the allow-list.
    pub fn parse(s: &str) -> OgcResult<Self> {
        match s.trim() {
            "1.0.0" => Ok(WmsVersion::V1_0_0),
            "1.1.0" => Ok(WmsVersion::V1_1_0),
            "1.1.1" => Ok(WmsVersion::V1_1_1),
            "1.3.0" => Ok(WmsVersion::V1_3_0),
            other => Err(OgcError::UnsupportedVersion(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WmsVersion::V1_0_0 => "1.0.0",
            WmsVersion::V1_1_0 => "1.1.0",
            WmsVersion::V1_1_1 => "1.1.1",
            WmsVersion::V1_3_0 => "1.3.0",
        }
    }

    /// Name of the coordinate system parameter in GetMap/GetFeatureInfo.
    pub fn crs_parameter(&self) -> &'static str {
        match self {
            WmsVersion::V1_3_0 => "CRS",
            WmsVersion::V1_0_0 | WmsVersion::V1_1_0 | WmsVersion::V1_1_1 => "SRS",
        }
    }

    /// Names of the pixel position parameters in GetFeatureInfo.
    pub fn pixel_parameters(&self) -> (&'static str, &'static str) {
        match self {
            WmsVersion::V1_3_0 => ("I", "J"),
            WmsVersion::V1_0_0 | WmsVersion::V1_1_0 | WmsVersion::V1_1_1 => ("X", "Y"),
        }
    }

    /// URI bound to the versioned namespace alias.
    ///
    /// Documents before 1.3.0 carry no namespace, so the alias binds to the
    /// empty URI and matches un-namespaced elements.
    pub fn namespace_alias_uri(&self) -> &'static str {
        match self {
            WmsVersion::V1_3_0 => WMS_NAMESPACE,
            WmsVersion::V1_0_0 | WmsVersion::V1_1_0 | WmsVersion::V1_1_1 => "",
        }
    }

    /// Local name of the capabilities root element.
    pub fn capabilities_root(&self) -> &'static str {
        match self {
            WmsVersion::V1_3_0 => "WMS_Capabilities",
            WmsVersion::V1_0_0 | WmsVersion::V1_1_0 | WmsVersion::V1_1_1 => "WMT_MS_Capabilities",
        }
    }
}

impl Default for WmsVersion {
    fn default() -> Self {
        WmsVersion::V1_3_0
    }
}

impl fmt::Display for WmsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WmsVersion {
    type Err = OgcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WmsVersion::parse(s)
    }
}

/// Supported WFS protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WfsVersion {
    #[serde(rename = "1.0.0")]
    V1_0_0,
    #[serde(rename = "1.1.0")]
    V1_1_0,
}

impl WfsVersion {
    pub fn parse(s: &str) -> OgcResult<Self> {
        match s.trim() {
            "1.0.0" => Ok(WfsVersion::V1_0_0),
            "1.1.0" => Ok(WfsVersion::V1_1_0),
            other => Err(OgcError::UnsupportedVersion(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WfsVersion::V1_0_0 => "1.0.0",
            WfsVersion::V1_1_0 => "1.1.0",
        }
    }
}

impl Default for WfsVersion {
    fn default() -> Self {
        WfsVersion::V1_1_0
    }
}

impl fmt::Display for WfsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WfsVersion {
    type Err = OgcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WfsVersion::parse(s)
    }
}

//! Common test fixtures for OGC client tests.
//!
//! XML fixtures live in `crates/test-utils/testdata/` and are embedded at
//! compile time, so tests never depend on the working directory.

/// Extents matching the fixture documents.
pub mod bbox {
    /// Lower Manhattan, matching the `tiger:poi` fixture extent
    pub const MANHATTAN: (f64, f64, f64, f64) = (-74.02, 40.70, -74.0, 40.72);
}

/// WMS capabilities documents.
pub mod wms {
    /// WMS 1.3.0 with nested layers, styles, legends and GET/POST bindings.
    pub const CAPABILITIES_130: &str = include_str!("../testdata/wms_130_capabilities.xml");

    /// WMS 1.3.0 with a single root layer `world` in EPSG:4326.
    pub const WORLD_130: &str = include_str!("../testdata/wms_130_world.xml");

    /// Un-namespaced WMS 1.1.1 with `SRS`, `LatLonBoundingBox` and vendor capabilities.
    pub const CAPABILITIES_111: &str = include_str!("../testdata/wms_111_capabilities.xml");

    /// WMS 1.1.1 served as ISO-8859-1, as MapServer does by default.
    pub const CAPABILITIES_111_LATIN1: &[u8] =
        include_bytes!("../testdata/wms_111_capabilities_latin1.xml");

    /// WMS 1.1.0 declaring two top-level layers.
    pub const MULTI_ROOT: &str = include_str!("../testdata/wms_multi_root.xml");

    /// A WMS `ServiceExceptionReport`.
    pub const EXCEPTION_REPORT: &str = include_str!("../testdata/wms_exception_report.xml");

    /// Minimal document whose version is outside the supported set.
    pub const UNSUPPORTED_VERSION: &str = r#"<WMS_Capabilities version="2.0.0" xmlns="http://www.opengis.net/wms"><Service/><Capability/></WMS_Capabilities>"#;

    /// 1.1.1 document without a `Capability` section.
    pub const MISSING_CAPABILITY: &str =
        r#"<WMT_MS_Capabilities version="1.1.1"><Service><Title>t</Title></Service></WMT_MS_Capabilities>"#;

    /// 1.1.1 document whose layer has one unparseable LatLonBoundingBox ordinate.
    pub const BAD_LATLON: &str = r#"<WMT_MS_Capabilities version="1.1.1">
  <Service><Title>bad</Title></Service>
  <Capability>
    <Request><GetMap><Format>image/png</Format></GetMap></Request>
    <Layer>
      <Name>broken</Name>
      <LatLonBoundingBox minx="-10" miny="abc" maxx="10" maxy="20"/>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;

    /// 1.1.1 document whose BoundingBox lacks `maxy`.
    pub const BAD_BBOX: &str = r#"<WMT_MS_Capabilities version="1.1.1">
  <Service><Title>bad</Title></Service>
  <Capability>
    <Request><GetMap><Format>image/png</Format></GetMap></Request>
    <Layer>
      <Name>broken</Name>
      <BoundingBox SRS="EPSG:4326" minx="-10" miny="-10" maxx="10"/>
    </Layer>
  </Capability>
</WMT_MS_Capabilities>"#;
}

/// WFS capabilities, schema and GetFeature documents.
pub mod wfs {
    /// WFS 1.0.0 capabilities (`topp:roads`, `topp:states`, `topp:unbounded`).
    pub const CAPABILITIES_100: &str = include_str!("../testdata/wfs_100_capabilities.xml");

    /// WFS 1.1.0 capabilities with OWS operations metadata (`tiger:poi`, `tiger:tiger_roads`).
    pub const CAPABILITIES_110: &str = include_str!("../testdata/wfs_110_capabilities.xml");

    /// DescribeFeatureType with a directly `gml:`-typed geometry element (`topp:states`).
    pub const DESCRIBE_TYPED: &str = include_str!("../testdata/wfs_describe_typed.xsd");

    /// DescribeFeatureType referencing `gml:multiLineStringProperty` (`tiger:tiger_roads`).
    pub const DESCRIBE_REF: &str = include_str!("../testdata/wfs_describe_ref.xsd");

    /// DescribeFeatureType with an anonymous complex type (`tiger:poi`).
    pub const DESCRIBE_ANONYMOUS: &str = include_str!("../testdata/wfs_describe_anonymous.xsd");

    /// DescribeFeatureType without any geometry element (`topp:unbounded`).
    pub const DESCRIBE_NO_GEOMETRY: &str = include_str!("../testdata/wfs_describe_no_geometry.xsd");

    /// GML2 MultiPolygon collection for `topp:states`.
    pub const FEATURES_GML2: &str = include_str!("../testdata/wfs_getfeature_gml2.xml");

    /// GML3 points for `tiger:poi` in lat/lon order.
    pub const FEATURES_GML3_POINTS: &str = include_str!("../testdata/wfs_getfeature_gml3_points.xml");

    /// GML3 MultiLineString and MultiCurve collection for `tiger:tiger_roads`.
    pub const FEATURES_GML3_LINES: &str = include_str!("../testdata/wfs_getfeature_gml3_lines.xml");

    /// An OWS `ExceptionReport`.
    pub const EXCEPTION_REPORT: &str = include_str!("../testdata/wfs_exception_report.xml");
}

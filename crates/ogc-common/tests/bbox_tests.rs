//! KVP parsing and axis-ordered output of bounding boxes.

use ogc_common::bbox::{BboxParseError, BoundingBox};
use ogc_common::AxisOrder;

#[test]
fn test_from_kvp() {
    let bbox = BoundingBox::from_kvp("-125.5,24.75,-66.25,50.125").unwrap();
    assert_eq!(bbox, BoundingBox::new(-125.5, 24.75, -66.25, 50.125));

    let mercator =
        BoundingBox::from_kvp("-20037508.34,-20037508.34,20037508.34,20037508.34").unwrap();
    assert_eq!(mercator.width(), 2.0 * 20037508.34);
}

#[test]
fn test_from_kvp_tolerates_spacing_and_exponents() {
    let bbox = BoundingBox::from_kvp(" 1e-6, 2E-6 ,1e6,  2e6 ").unwrap();
    assert_eq!(bbox.min_x, 1e-6);
    assert_eq!(bbox.min_y, 2e-6);
    assert_eq!(bbox.max_y, 2e6);
}

#[test]
fn test_from_kvp_rejects_wrong_arity() {
    for (value, found) in [("0,0,100", 3), ("0,0,100,100,200", 5)] {
        match BoundingBox::from_kvp(value) {
            Err(BboxParseError::WrongArity { found: n, .. }) => assert_eq!(n, found, "{}", value),
            other => panic!("{}: unexpected {:?}", value, other),
        }
    }
}

#[test]
fn test_from_kvp_rejects_bad_ordinates() {
    assert_eq!(
        BoundingBox::from_kvp("0,north,1,1"),
        Err(BboxParseError::InvalidOrdinate("north".to_string()))
    );
    // A CRS suffix is a WFS 1.1 extension, not an ordinate.
    assert!(matches!(
        BoundingBox::from_kvp("0,0,1,1,EPSG:4326"),
        Err(BboxParseError::InvalidOrdinate(_))
    ));
    assert!(matches!(
        BoundingBox::from_kvp(""),
        Err(BboxParseError::InvalidOrdinate(_))
    ));
    // Locale decimal commas split into too many parts.
    assert!(BoundingBox::from_kvp("0,5,0,5,1,5,1,5").is_err());
}

#[test]
fn test_error_messages_name_the_value() {
    let err = BoundingBox::from_kvp("1,2,3").unwrap_err();
    assert_eq!(
        err.to_string(),
        "BBOX '1,2,3' has 3 ordinates, expected minx,miny,maxx,maxy"
    );
}

#[test]
fn test_to_kvp_uses_shortest_floats() {
    assert_eq!(
        BoundingBox::new(-180.0, -90.0, 180.0, 90.0).to_kvp(),
        "-180,-90,180,90"
    );
    assert_eq!(
        BoundingBox::new(0.1, 0.25, 1.5, 2.0).to_kvp(),
        "0.1,0.25,1.5,2"
    );
}

#[test]
fn test_to_kvp_ordered_for_northing_first_crs() {
    let conus = BoundingBox::new(-130.0, 20.0, -60.0, 55.0);
    assert_eq!(conus.to_kvp_ordered(AxisOrder::XY), "-130,20,-60,55");
    assert_eq!(conus.to_kvp_ordered(AxisOrder::YX), "20,-130,55,-60");

    let parsed = BoundingBox::from_kvp(&conus.to_kvp_ordered(AxisOrder::YX)).unwrap();
    assert_eq!(parsed.swapped(), conus);
}

#[test]
fn test_serde_field_names() {
    let json = serde_json::to_value(BoundingBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"min_x": 1.0, "min_y": 2.0, "max_x": 3.0, "max_y": 4.0})
    );
}

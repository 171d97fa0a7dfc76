use super::*;

#[test]
fn coordinate_rejects_out_of_range_values() {
    assert_eq!(
        Coordinate::new(91.0, 0.0),
        Err(CoordinateError::Latitude(91.0))
    );
    assert_eq!(
        Coordinate::new(0.0, -180.5),
        Err(CoordinateError::Longitude(-180.5))
    );
    assert!(Coordinate::new(f64::NAN, 0.0).is_err());
    assert!(Coordinate::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn coordinate_accepts_boundary_values() {
    let corner = Coordinate::new(-90.0, 180.0).expect("coordinate");
    assert_eq!(corner.latitude, -90.0);
    assert_eq!(corner.longitude, 180.0);
}

#[test]
fn coordinate_displays_five_decimals() {
    let pin = Coordinate::new(47.6174, -122.2017).expect("coordinate");
    assert_eq!(pin.to_string(), "(47.61740, -122.20170)");
}

#[test]
fn ride_ids_are_unique_and_display_as_uuid() {
    let a = RideId::new();
    let b = RideId::default();
    assert_ne!(a, b);
    assert_eq!(a.to_string(), a.0.to_string());
}

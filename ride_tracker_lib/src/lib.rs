pub mod distance;
pub mod error;
pub mod fuel_estimate;
pub mod ride_session;
pub mod track_point;
pub mod vehicle;

/// Every figure leaving the crate is reported with two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.).round() / 100.
}

#[test]
fn test_round2() {
    assert_eq!(round2(4.97534), 4.98);
    assert_eq!(round2(1.4791), 1.48);
    assert_eq!(round2(0.), 0.);
    assert_eq!(round2(45.), 45.);
}

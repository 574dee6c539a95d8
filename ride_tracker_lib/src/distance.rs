use geo_types::Point;

pub const EARTH_RADIUS_KM: f64 = 6371.;

/// Great-circle distance in km between two positions given in degrees (x = longitude, y = latitude).
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    let d_lat = (p2.y() - p1.y()).to_radians();
    let d_lon = (p2.x() - p1.x()).to_radians();
    let lat1 = p1.y().to_radians();
    let lat2 = p2.y().to_radians();

    let a = f64::sin(d_lat / 2.).powi(2)
        + f64::cos(lat1) * f64::cos(lat2) * f64::sin(d_lon / 2.).powi(2);
    // Rounding can push `a` just above 1 for antipodal points
    let c = 2. * f64::asin(f64::sqrt(a.min(1.)));

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
fn point(lat: f64, lon: f64) -> Point {
    Point::new(lon, lat)
}

#[test]
fn test_identical_points() {
    for (lat, lon) in [(0., 0.), (28.7, 77.1), (-33.86, 151.21), (90., 180.), (-90., -180.)] {
        assert!(haversine_distance(point(lat, lon), point(lat, lon)).abs() < 1e-9);
    }
}

#[test]
fn test_symmetric() {
    let points = [point(28.7, 77.1), point(28.71, 77.11), point(56.158405, 10.206034), point(-33.86, 151.21), point(0., -179.9)];

    for p in points {
        for q in points {
            let forward = haversine_distance(p, q);
            let backward = haversine_distance(q, p);
            assert!((forward - backward).abs() < 1e-9, "{forward} != {backward}");
        }
    }
}

#[test]
fn test_known_distances() {
    // One degree of latitude along a meridian
    let one_degree = haversine_distance(point(0., 0.), point(1., 0.));
    assert!((one_degree - 111.19).abs() < 0.01);

    // Half the circumference
    let antipodal = haversine_distance(point(0., 0.), point(0., 180.));
    assert!((antipodal - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);

    // Two fixes across Delhi
    let delhi = haversine_distance(point(28.70, 77.10), point(28.71, 77.11));
    assert!((delhi - 1.479).abs() < 0.005, "{delhi}");
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{error::RideError, round2, track_point::TrackPoint, vehicle::VehicleSpec};

/// Below this share of the tank the end-of-ride report carries a refuel warning.
pub const LOW_FUEL_PERCENT: f64 = 25.;

/// Live state of one ride between its start and its end.
///
/// Distance and fuel are accumulated pairwise: the first fix only sets the baseline,
/// every later fix adds the great-circle distance from the previous one and burns
/// `distance / mileage` liters. Fuel never drops below zero, while distance keeps
/// accumulating after the tank has run dry.
#[derive(Debug, Clone)]
pub struct RideSession {
    ride_id: i64,
    vehicle: VehicleSpec,
    fuel_filled: f64,
    start_time: DateTime<Utc>,
    fuel_remaining: f64,
    distance: f64,
    track_points: Vec<TrackPoint>,
    speed_samples: Vec<f64>,
    avg_speed: f64,
}

impl RideSession {
    pub fn new(ride_id: i64, vehicle: VehicleSpec, fuel_filled: f64, start_time: DateTime<Utc>) -> Self {
        Self {
            ride_id,
            vehicle,
            fuel_filled,
            start_time,
            fuel_remaining: fuel_filled,
            distance: 0.,
            track_points: Vec::new(),
            speed_samples: Vec::new(),
            avg_speed: 0.,
        }
    }

    /// Appends a fix and its speed sample, returning the distance it added.
    /// On error nothing is modified.
    pub fn record(&mut self, track_point: TrackPoint, speed: f64) -> Result<f64, RideError> {
        if !speed.is_finite() || speed < 0. {
            return Err(RideError::invalid(format!("Speed {speed} must be a non-negative number")));
        }

        let increment = self
            .track_points
            .last()
            .map_or(0., |last| last.distance_to(&track_point));

        self.distance += increment;
        self.fuel_remaining = (self.fuel_remaining - self.vehicle.fuel_for(increment)).max(0.);

        self.track_points.push(track_point);
        self.speed_samples.push(speed);
        self.avg_speed = mean(&self.speed_samples);

        Ok(increment)
    }

    pub fn ride_id(&self) -> i64 {
        self.ride_id
    }

    pub fn vehicle(&self) -> &VehicleSpec {
        &self.vehicle
    }

    /// Fixed at creation.
    pub fn fuel_filled(&self) -> f64 {
        self.fuel_filled
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn fuel_remaining(&self) -> f64 {
        self.fuel_remaining
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn avg_speed(&self) -> f64 {
        self.avg_speed
    }

    pub fn track_points(&self) -> &[TrackPoint] {
        &self.track_points
    }

    pub fn speed_samples(&self) -> &[f64] {
        &self.speed_samples
    }

    pub fn started(&self) -> RideStarted {
        RideStarted {
            ride_id: self.ride_id,
            vehicle: self.vehicle.name.clone(),
            fuel_filled: round2(self.fuel_filled),
            tank_capacity: self.vehicle.tank_capacity,
            mileage: self.vehicle.mileage,
            start_time: self.start_time,
        }
    }

    pub fn progress(&self) -> RideProgress {
        RideProgress {
            ride_id: self.ride_id,
            distance: round2(self.distance),
            fuel_remaining: round2(self.fuel_remaining),
            avg_speed: round2(self.avg_speed),
            points: self.track_points.len(),
        }
    }

    /// Consumes the session into its terminal report.
    pub fn finish(self, end_time: DateTime<Utc>) -> RideSummary {
        let fuel_percent = self.vehicle.fuel_percent(self.fuel_remaining);
        let alert = if fuel_percent < LOW_FUEL_PERCENT {
            "Low fuel! Refuel soon."
        } else {
            "Fuel level is fine."
        };

        RideSummary {
            ride_id: self.ride_id,
            vehicle: self.vehicle.name,
            mileage: self.vehicle.mileage,
            fuel_filled: round2(self.fuel_filled),
            fuel_remaining: round2(self.fuel_remaining),
            fuel_used: round2(self.fuel_filled - self.fuel_remaining),
            fuel_percent: round2(fuel_percent),
            distance: round2(self.distance),
            avg_speed: round2(self.avg_speed),
            points: self.track_points.len(),
            alert: alert.to_string(),
            start_time: self.start_time,
            end_time,
        }
    }
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.;
    }

    samples.iter().sum::<f64>() / samples.len() as f64
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideStarted {
    pub ride_id: i64,
    pub vehicle: String,
    pub fuel_filled: f64,
    pub tank_capacity: f64,
    pub mileage: f64,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideProgress {
    pub ride_id: i64,
    pub distance: f64,
    pub fuel_remaining: f64,
    pub avg_speed: f64,
    pub points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideSummary {
    pub ride_id: i64,
    pub vehicle: String,
    pub mileage: f64,
    pub fuel_filled: f64,
    pub fuel_remaining: f64,
    pub fuel_used: f64,
    pub fuel_percent: f64,
    pub distance: f64,
    pub avg_speed: f64,
    pub points: usize,
    pub alert: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[cfg(test)]
fn splendor() -> VehicleSpec {
    VehicleSpec::new("splendor2018", "2018 Splendor", 8., 60.)
}

#[cfg(test)]
fn fix(lat: f64, lon: f64) -> TrackPoint {
    TrackPoint::from_coordinates(lat, lon, Utc::now()).unwrap()
}

#[test]
fn test_first_fix_is_baseline() {
    let mut session = RideSession::new(1, splendor(), 5., Utc::now());

    let increment = session.record(fix(28.70, 77.10), 40.).unwrap();

    assert_eq!(increment, 0.);
    assert_eq!(session.distance(), 0.);
    assert_eq!(session.fuel_remaining(), 5.);
    assert_eq!(session.avg_speed(), 40.);
    assert_eq!(session.track_points().len(), 1);
}

#[test]
fn test_delhi_ride() {
    let mut session = RideSession::new(1, splendor(), 5., Utc::now());

    session.record(fix(28.70, 77.10), 40.).unwrap();
    let increment = session.record(fix(28.71, 77.11), 50.).unwrap();

    assert!((increment - 1.479).abs() < 0.001);
    assert!((session.fuel_remaining() - (5. - increment / 60.)).abs() < 1e-12);

    let progress = session.progress();
    assert_eq!(progress.distance, 1.48);
    assert_eq!(progress.fuel_remaining, 4.98);
    assert_eq!(progress.avg_speed, 45.);
    assert_eq!(progress.points, 2);
}

#[test]
fn test_distance_is_sum_of_pairwise_increments() {
    let fixes = [(55.0, 9.0), (55.01, 9.02), (55.03, 9.01), (55.02, 8.98), (55.0, 9.0)];
    let mut session = RideSession::new(1, splendor(), 8., Utc::now());

    let mut increments = Vec::new();
    for (lat, lon) in fixes {
        increments.push(session.record(fix(lat, lon), 30.).unwrap());
    }

    let expected: f64 = fixes
        .windows(2)
        .map(|pair| fix(pair[0].0, pair[0].1).distance_to(&fix(pair[1].0, pair[1].1)))
        .sum();

    assert_eq!(increments[0], 0.);
    assert!((session.distance() - expected).abs() < 1e-9);
    assert!((session.distance() - increments.iter().sum::<f64>()).abs() < 1e-12);
}

#[test]
fn test_fuel_floors_at_zero_while_distance_grows() {
    // 0.1 L at 60 km/l lasts 6 km, a degree of latitude is ~111 km
    let mut session = RideSession::new(1, splendor(), 0.1, Utc::now());

    session.record(fix(10., 10.), 60.).unwrap();
    session.record(fix(11., 10.), 60.).unwrap();
    assert_eq!(session.fuel_remaining(), 0.);
    let distance_when_dry = session.distance();

    session.record(fix(12., 10.), 60.).unwrap();
    assert_eq!(session.fuel_remaining(), 0.);
    assert!(session.distance() > distance_when_dry);
}

#[test]
fn test_average_speed() {
    let mut session = RideSession::new(1, splendor(), 5., Utc::now());
    assert_eq!(session.avg_speed(), 0.);

    for (i, speed) in [10., 20., 35., 0.].into_iter().enumerate() {
        session.record(fix(20. + i as f64 * 0.001, 70.), speed).unwrap();
    }

    assert_eq!(session.avg_speed(), 16.25);
    assert_eq!(session.speed_samples(), &[10., 20., 35., 0.]);
}

#[test]
fn test_rejected_speed_leaves_state_unchanged() {
    let mut session = RideSession::new(1, splendor(), 5., Utc::now());
    session.record(fix(28.70, 77.10), 40.).unwrap();

    assert!(session.record(fix(28.71, 77.11), -5.).is_err());
    assert!(session.record(fix(28.71, 77.11), f64::NAN).is_err());

    assert_eq!(session.track_points().len(), 1);
    assert_eq!(session.speed_samples(), &[40.]);
    assert_eq!(session.distance(), 0.);
    assert_eq!(session.fuel_remaining(), 5.);
}

#[test]
fn test_summary() {
    let start = Utc::now();
    let mut session = RideSession::new(3, splendor(), 5., start);
    session.record(fix(28.70, 77.10), 40.).unwrap();
    session.record(fix(28.71, 77.11), 50.).unwrap();

    let summary = session.finish(start);

    assert_eq!(summary.ride_id, 3);
    assert_eq!(summary.vehicle, "2018 Splendor");
    assert_eq!(summary.fuel_filled, 5.);
    assert_eq!(summary.fuel_remaining, 4.98);
    assert_eq!(summary.fuel_used, 0.02);
    assert_eq!(summary.fuel_percent, 62.19);
    assert_eq!(summary.distance, 1.48);
    assert_eq!(summary.avg_speed, 45.);
    assert_eq!(summary.alert, "Fuel level is fine.");
}

#[test]
fn test_session_identity() {
    let start = Utc::now();
    let mut session = RideSession::new(4, splendor(), 5., start);
    session.record(fix(28.70, 77.10), 40.).unwrap();
    session.record(fix(28.71, 77.11), 50.).unwrap();

    assert_eq!(session.ride_id(), 4);
    assert_eq!(session.vehicle().name, "2018 Splendor");
    assert_eq!(session.fuel_filled(), 5.);
    assert_eq!(session.start_time(), start);
}

#[test]
fn test_summary_json_fields() {
    let start = Utc::now();
    let mut session = RideSession::new(2, splendor(), 5., start);
    session.record(fix(28.70, 77.10), 40.).unwrap();
    session.record(fix(28.71, 77.11), 50.).unwrap();

    let json = serde_json::to_value(session.finish(start)).unwrap();

    assert_eq!(json["ride_id"], 2);
    assert_eq!(json["vehicle"], "2018 Splendor");
    assert_eq!(json["fuel_filled"], 5.);
    assert_eq!(json["fuel_remaining"], 4.98);
    assert_eq!(json["fuel_used"], 0.02);
    assert_eq!(json["distance"], 1.48);
    assert_eq!(json["avg_speed"], 45.);
    assert_eq!(json["points"], 2);
    assert!(json["start_time"].is_string());
    assert!(json.get("fuelRemaining").is_none());
}

#[test]
fn test_summary_low_fuel_alert() {
    let session = RideSession::new(1, splendor(), 1., Utc::now());

    let summary = session.finish(Utc::now());

    assert_eq!(summary.fuel_percent, 12.5);
    assert_eq!(summary.alert, "Low fuel! Refuel soon.");
}

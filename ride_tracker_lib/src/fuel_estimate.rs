use serde::Serialize;

use crate::{error::RideError, round2, vehicle::VehicleSpec};

/// Currency units per liter
pub const PETROL_PRICE: f64 = 100.;
pub const DEFAULT_REQUESTED_DISTANCE: f64 = 50.;

/// Outcome of a ride with a single requested distance and no location stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuelEstimate {
    pub vehicle: String,
    pub fuel_filled_cost: f64,
    pub fuel_in_liters: f64,
    pub distance_requested: f64,
    pub distance_travelled: f64,
    pub mileage: f64,
    pub fuel_used: f64,
    pub fuel_left: f64,
    pub fuel_percent: f64,
}

/// Estimates how far the fuel bought for `fuel_cost` takes the vehicle. A request longer
/// than the fuel allows is cut short at the point the tank runs dry.
pub fn estimate_fuel(vehicle: &VehicleSpec, fuel_cost: f64, distance: Option<f64>) -> Result<FuelEstimate, RideError> {
    if !fuel_cost.is_finite() || fuel_cost < 0. {
        return Err(RideError::invalid(format!("Fuel {fuel_cost} must be a non-negative amount")));
    }

    let distance_requested = distance.unwrap_or(DEFAULT_REQUESTED_DISTANCE);
    if !distance_requested.is_finite() || distance_requested < 0. {
        return Err(RideError::invalid(format!("Distance {distance_requested} must be a non-negative number")));
    }

    let fuel_in_liters = fuel_cost / PETROL_PRICE;
    let max_distance = vehicle.range(fuel_in_liters);

    let (distance_travelled, fuel_used, fuel_left) = if distance_requested > max_distance {
        (max_distance, fuel_in_liters, 0.)
    } else {
        let fuel_used = vehicle.fuel_for(distance_requested);
        (distance_requested, fuel_used, fuel_in_liters - fuel_used)
    };

    Ok(FuelEstimate {
        vehicle: vehicle.name.clone(),
        fuel_filled_cost: fuel_cost,
        fuel_in_liters: round2(fuel_in_liters),
        distance_requested,
        distance_travelled: round2(distance_travelled),
        mileage: vehicle.mileage,
        fuel_used: round2(fuel_used),
        fuel_left: round2(fuel_left),
        fuel_percent: round2(vehicle.fuel_percent(fuel_left)),
    })
}

#[cfg(test)]
fn splendor() -> VehicleSpec {
    VehicleSpec::new("splendor2018", "2018 Splendor", 8., 60.)
}

#[test]
fn test_estimate_within_range() {
    let estimate = estimate_fuel(&splendor(), 100., Some(50.)).unwrap();

    assert_eq!(estimate.fuel_in_liters, 1.);
    assert_eq!(estimate.distance_requested, 50.);
    assert_eq!(estimate.distance_travelled, 50.);
    assert_eq!(estimate.fuel_used, 0.83);
    assert_eq!(estimate.fuel_left, 0.17);
    assert_eq!(estimate.fuel_percent, 2.08);
}

#[test]
fn test_estimate_runs_dry() {
    let estimate = estimate_fuel(&splendor(), 100., Some(100.)).unwrap();

    assert_eq!(estimate.distance_requested, 100.);
    assert_eq!(estimate.distance_travelled, 60.);
    assert_eq!(estimate.fuel_used, 1.);
    assert_eq!(estimate.fuel_left, 0.);
    assert_eq!(estimate.fuel_percent, 0.);
}

#[test]
fn test_estimate_default_distance() {
    let estimate = estimate_fuel(&splendor(), 200., None).unwrap();

    assert_eq!(estimate.distance_requested, DEFAULT_REQUESTED_DISTANCE);
    assert_eq!(estimate.distance_travelled, 50.);
}

#[test]
fn test_estimate_rejects_negative_input() {
    assert!(matches!(estimate_fuel(&splendor(), -1., None), Err(RideError::InvalidRequest(_))));
    assert!(matches!(estimate_fuel(&splendor(), 100., Some(-3.)), Err(RideError::InvalidRequest(_))));
}

use std::sync::{
    Arc,
    atomic::{AtomicI64, Ordering},
};

use chrono::Utc;
use ride_tracker_lib::{
    error::RideError,
    fuel_estimate::{FuelEstimate, estimate_fuel},
    ride_session::{RideProgress, RideSession, RideStarted, RideSummary},
    track_point::TrackPoint,
    vehicle::{VehicleCatalog, VehicleSpec},
};

use crate::store::session_store::SessionStore;

#[derive(Clone)]
pub struct RideManager {
    pub(crate) catalog: Arc<VehicleCatalog>,
    pub(crate) session_store: SessionStore,
    next_ride_id: Arc<AtomicI64>,
}

/// The public interface for starting, updating and ending rides.
impl RideManager {
    pub fn new(catalog: VehicleCatalog) -> Self {
        RideManager {
            catalog: Arc::new(catalog),
            session_store: SessionStore::new(),
            next_ride_id: Arc::new(AtomicI64::new(1)),
        }
    }

    pub fn catalog(&self) -> &VehicleCatalog {
        &self.catalog
    }

    pub fn vehicle(&self, vehicle: &str) -> Result<&VehicleSpec, RideError> {
        self.catalog.lookup(vehicle)
    }

    /// An id is only drawn once the request has been validated, so rejected starts leave no gaps.
    pub async fn start_ride(&self, vehicle: &str, fuel_filled: f64) -> Result<RideStarted, RideError> {
        if vehicle.is_empty() {
            return Err(RideError::invalid("Vehicle and fuel required"));
        }
        if !fuel_filled.is_finite() || fuel_filled < 0. {
            return Err(RideError::invalid(format!("Fuel {fuel_filled} must be a non-negative amount")));
        }

        let vehicle = self.catalog.lookup(vehicle).inspect_err(|err| tracing::warn!("Rejected ride start: {err}"))?;

        let ride_id = self.next_ride_id.fetch_add(1, Ordering::SeqCst);
        let session = RideSession::new(ride_id, vehicle.clone(), fuel_filled, Utc::now());
        let started = session.started();

        self.session_store.insert(session).await?;

        tracing::info!("Started ride {} on {} with {} L", ride_id, started.vehicle, fuel_filled);

        Ok(started)
    }

    /// An inactive ride is reported as such before any field of the fix is looked at.
    pub async fn update_location(&self, ride_id: i64, latitude: f64, longitude: f64, speed: f64) -> Result<RideProgress, RideError> {
        let progress = self
            .session_store
            .with_session(ride_id, |session| {
                let track_point = TrackPoint::from_coordinates(latitude, longitude, Utc::now())?;
                session.record(track_point, speed)?;
                Ok(session.progress())
            })
            .await
            .inspect_err(|err| tracing::warn!("Rejected location update: {err}"))?;

        tracing::debug!(
            "Ride {}: {} points, {} km, {} L left",
            ride_id,
            progress.points,
            progress.distance,
            progress.fuel_remaining
        );

        Ok(progress)
    }

    pub async fn ride_status(&self, ride_id: i64) -> Result<RideProgress, RideError> {
        self.session_store.with_session(ride_id, |session| Ok(session.progress())).await
    }

    pub async fn active_rides(&self) -> Vec<i64> {
        self.session_store.ride_ids().await
    }

    /// Ride ids start at 1, so 0 is treated as an unset id.
    pub async fn end_ride(&self, ride_id: i64) -> Result<RideSummary, RideError> {
        if ride_id == 0 {
            return Err(RideError::RideNotFound(ride_id));
        }

        let session = self
            .session_store
            .remove(ride_id)
            .await
            .inspect_err(|err| tracing::warn!("Rejected ride end: {err}"))?;
        let summary = session.finish(Utc::now());

        tracing::info!("Ended ride {}: {} km, {} L left", ride_id, summary.distance, summary.fuel_remaining);

        Ok(summary)
    }

    pub fn estimate(&self, vehicle: &str, fuel_cost: f64, distance: Option<f64>) -> Result<FuelEstimate, RideError> {
        if vehicle.is_empty() {
            return Err(RideError::invalid("Vehicle and fuel required"));
        }

        estimate_fuel(self.catalog.lookup(vehicle)?, fuel_cost, distance)
    }
}

impl Default for RideManager {
    fn default() -> Self {
        Self::new(VehicleCatalog::builtin())
    }
}

#[tokio::test]
async fn test_delhi_ride() {
    let manager = RideManager::default();

    let started = manager.start_ride("2018 Splendor", 5.).await.unwrap();
    assert_eq!(started.ride_id, 1);
    assert_eq!(started.vehicle, "2018 Splendor");
    assert_eq!(started.fuel_filled, 5.);

    let progress = manager.update_location(1, 28.70, 77.10, 40.).await.unwrap();
    assert_eq!(progress.distance, 0.);
    assert_eq!(progress.fuel_remaining, 5.);
    assert_eq!(progress.avg_speed, 40.);

    let progress = manager.update_location(1, 28.71, 77.11, 50.).await.unwrap();
    assert_eq!(progress.distance, 1.48);
    assert_eq!(progress.fuel_remaining, 4.98);
    assert_eq!(progress.avg_speed, 45.);

    let summary = manager.end_ride(1).await.unwrap();
    assert_eq!(summary.distance, 1.48);
    assert_eq!(summary.fuel_remaining, 4.98);
    assert_eq!(summary.avg_speed, 45.);
    assert_eq!(summary.fuel_filled, 5.);
    assert_eq!(summary.points, 2);

    assert_eq!(manager.end_ride(1).await.unwrap_err(), RideError::RideNotFound(1));
    assert_eq!(manager.update_location(1, 28.72, 77.12, 50.).await.unwrap_err(), RideError::RideNotFound(1));
}

#[tokio::test]
async fn test_unknown_vehicle_allocates_nothing() {
    let manager = RideManager::default();

    let err = manager.start_ride("unknown-bike", 5.).await.unwrap_err();
    assert_eq!(err, RideError::VehicleNotFound("unknown-bike".into()));
    assert!(manager.active_rides().await.is_empty());

    // The failed start consumed no id
    let started = manager.start_ride("activa2020", 2.).await.unwrap();
    assert_eq!(started.ride_id, 1);
}

#[tokio::test]
async fn test_invalid_start() {
    let manager = RideManager::default();

    assert!(matches!(manager.start_ride("", 5.).await, Err(RideError::InvalidRequest(_))));
    assert!(matches!(manager.start_ride("activa2020", -1.).await, Err(RideError::InvalidRequest(_))));
    assert!(matches!(manager.start_ride("activa2020", f64::NAN).await, Err(RideError::InvalidRequest(_))));
    assert!(manager.active_rides().await.is_empty());
}

#[tokio::test]
async fn test_ids_strictly_increase() {
    let manager = RideManager::default();

    let first = manager.start_ride("activa2020", 2.).await.unwrap().ride_id;
    let second = manager.start_ride("splendor2018", 3.).await.unwrap().ride_id;
    manager.end_ride(second).await.unwrap();
    let third = manager.start_ride("splendor2018", 3.).await.unwrap().ride_id;

    assert!(first < second && second < third);
    assert_eq!(manager.active_rides().await, vec![first, third]);
}

#[tokio::test]
async fn test_end_unset_ride() {
    let manager = RideManager::default();
    manager.start_ride("activa2020", 2.).await.unwrap();

    assert_eq!(manager.end_ride(0).await.unwrap_err(), RideError::RideNotFound(0));
    assert_eq!(manager.active_rides().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_update_leaves_ride_unchanged() {
    let manager = RideManager::default();
    let ride_id = manager.start_ride("2018 Splendor", 5.).await.unwrap().ride_id;
    manager.update_location(ride_id, 28.70, 77.10, 40.).await.unwrap();
    let before = manager.ride_status(ride_id).await.unwrap();

    assert!(matches!(manager.update_location(ride_id, 91., 77.10, 40.).await, Err(RideError::InvalidRequest(_))));
    assert!(matches!(manager.update_location(ride_id, 28.71, 77.11, -2.).await, Err(RideError::InvalidRequest(_))));

    assert_eq!(manager.ride_status(ride_id).await.unwrap(), before);
}

#[tokio::test]
async fn test_unknown_ride_wins_over_bad_fix() {
    let manager = RideManager::default();

    assert_eq!(manager.update_location(99, 95., 77., 10.).await.unwrap_err(), RideError::RideNotFound(99));
    assert_eq!(manager.update_location(99, 28., 200., 10.).await.unwrap_err(), RideError::RideNotFound(99));
    assert_eq!(manager.update_location(99, 28., 77., -1.).await.unwrap_err(), RideError::RideNotFound(99));
}

#[tokio::test]
async fn test_independent_managers() {
    let first = RideManager::default();
    let second = RideManager::default();

    first.start_ride("activa2020", 2.).await.unwrap();

    assert_eq!(second.start_ride("activa2020", 2.).await.unwrap().ride_id, 1);
    assert_eq!(first.active_rides().await, vec![1]);
    assert_eq!(second.active_rides().await, vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_and_updates() {
    let manager = RideManager::default();

    let mut handles = Vec::new();
    for _ in 0..32 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move { manager.start_ride("activa2020", 4.).await.unwrap().ride_id }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 32);

    let ride_id = ids[0];
    let mut handles = Vec::new();
    for i in 0..50 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager.update_location(ride_id, 12. + i as f64 * 0.001, 77., 30.).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let status = manager.ride_status(ride_id).await.unwrap();
    assert_eq!(status.points, 50);
    assert_eq!(status.avg_speed, 30.);
}

#[test]
fn test_estimate() {
    let manager = RideManager::default();

    let estimate = manager.estimate("splendor2018", 100., Some(50.)).unwrap();
    assert_eq!(estimate.distance_travelled, 50.);
    assert_eq!(estimate.fuel_left, 0.17);

    assert_eq!(manager.estimate("unknown-bike", 100., None).unwrap_err(), RideError::VehicleNotFound("unknown-bike".into()));
    assert!(matches!(manager.estimate("", 100., None), Err(RideError::InvalidRequest(_))));
}

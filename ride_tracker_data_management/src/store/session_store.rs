use std::{collections::HashMap, sync::Arc};

use ride_tracker_lib::{error::RideError, ride_session::RideSession};
use tokio::sync::Mutex;

/**
 * SessionStore holds the sessions of all active rides.
 * Every access goes through one lock, so operations on a ride never interleave.
 */
#[derive(Clone, Default)]
pub struct SessionStore {
    session_map: Arc<Mutex<HashMap<i64, RideSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: RideSession) -> Result<(), RideError> {
        let mut session_map = self.session_map.lock().await;

        if session_map.contains_key(&session.ride_id()) {
            return Err(RideError::invalid(format!("Ride {} is already active", session.ride_id())));
        }

        session_map.insert(session.ride_id(), session);

        Ok(())
    }

    /// Runs `f` on the session while holding the lock.
    pub async fn with_session<T>(&self, ride_id: i64, f: impl FnOnce(&mut RideSession) -> Result<T, RideError>) -> Result<T, RideError> {
        let mut session_map = self.session_map.lock().await;
        let session = session_map.get_mut(&ride_id).ok_or(RideError::RideNotFound(ride_id))?;
        f(session)
    }

    pub async fn remove(&self, ride_id: i64) -> Result<RideSession, RideError> {
        let mut session_map = self.session_map.lock().await;
        session_map.remove(&ride_id).ok_or(RideError::RideNotFound(ride_id))
    }

    pub async fn ride_ids(&self) -> Vec<i64> {
        let session_map = self.session_map.lock().await;
        let mut ids: Vec<i64> = session_map.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub async fn len(&self) -> usize {
        self.session_map.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
fn session(ride_id: i64) -> RideSession {
    use ride_tracker_lib::vehicle::VehicleSpec;

    RideSession::new(ride_id, VehicleSpec::new("activa2020", "2020 Activa", 5.3, 45.), 2., chrono::Utc::now())
}

#[tokio::test]
async fn test_insert_and_remove() {
    let store = SessionStore::new();
    assert!(store.is_empty().await);

    store.insert(session(2)).await.unwrap();
    store.insert(session(1)).await.unwrap();
    assert_eq!(store.ride_ids().await, vec![1, 2]);

    let removed = store.remove(2).await.unwrap();
    assert_eq!(removed.ride_id(), 2);
    assert_eq!(store.ride_ids().await, vec![1]);

    assert_eq!(store.remove(2).await.unwrap_err(), RideError::RideNotFound(2));
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    let store = SessionStore::new();

    store.insert(session(1)).await.unwrap();
    assert!(store.insert(session(1)).await.is_err());
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_with_session_unknown_ride() {
    let store = SessionStore::new();

    let result = store.with_session(7, |session| Ok(session.ride_id())).await;

    assert_eq!(result, Err(RideError::RideNotFound(7)));
}

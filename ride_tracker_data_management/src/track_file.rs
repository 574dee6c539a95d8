use std::path::Path;

use ride_tracker_lib::{error::RideError, ride_session::RideSummary};

use crate::RideManager;

/// One `latitude,longitude,speed` line of a recorded track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackLine {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
}

/// Parses a recorded track. Blank lines and lines starting with `#` are skipped.
pub fn parse_track(content: &str) -> Result<Vec<TrackLine>, RideError> {
    content
        .lines()
        .enumerate()
        .map(|(number, line)| (number + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(number, line)| -> Result<TrackLine, RideError> {
            let fields = line
                .split(',')
                .map(|field| field.trim().parse::<f64>())
                .collect::<Result<Vec<f64>, _>>()
                .map_err(|err| RideError::invalid(format!("Line {number}: {err}")))?;

            let &[latitude, longitude, speed] = fields.as_slice() else {
                return Err(RideError::invalid(format!("Line {number}: expected 3 fields, got {}", fields.len())));
            };

            Ok(TrackLine { latitude, longitude, speed })
        })
        .collect()
}

impl RideManager {
    /// Starts a ride, feeds it every line of the track and ends it.
    pub async fn replay_track(&self, vehicle: &str, fuel_filled: f64, track: &[TrackLine]) -> Result<RideSummary, RideError> {
        let ride_id = self.start_ride(vehicle, fuel_filled).await?.ride_id;

        for line in track {
            if let Err(err) = self.update_location(ride_id, line.latitude, line.longitude, line.speed).await {
                // Do not leave the ride dangling
                self.end_ride(ride_id).await?;
                return Err(err);
            }
        }

        self.end_ride(ride_id).await
    }

    pub async fn replay_track_file(&self, vehicle: &str, fuel_filled: f64, path: &Path) -> Result<RideSummary, RideError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|err| RideError::invalid(format!("Failed to read track file {path:?}: {err}")))?;
        let track = parse_track(&content)?;

        tracing::info!("Replaying {} points from {:?}", track.len(), path);

        self.replay_track(vehicle, fuel_filled, &track).await
    }
}

#[test]
fn test_parse_track() {
    let track = parse_track("# lat,lon,speed\n28.70, 77.10, 40\n\n28.71,77.11,50\n").unwrap();

    assert_eq!(
        track,
        vec![
            TrackLine { latitude: 28.70, longitude: 77.10, speed: 40. },
            TrackLine { latitude: 28.71, longitude: 77.11, speed: 50. },
        ]
    );
}

#[test]
fn test_parse_track_errors() {
    assert!(parse_track("28.70,77.10").is_err());
    assert!(parse_track("28.70,77.10,40,1").is_err());
    assert!(parse_track("28.70,east,40").is_err());
    assert_eq!(parse_track("").unwrap(), Vec::new());
}

#[tokio::test]
async fn test_replay_track() {
    let manager = RideManager::default();
    let track = parse_track("28.70,77.10,40\n28.71,77.11,50").unwrap();

    let summary = manager.replay_track("2018 Splendor", 5., &track).await.unwrap();

    assert_eq!(summary.distance, 1.48);
    assert_eq!(summary.fuel_remaining, 4.98);
    assert_eq!(summary.avg_speed, 45.);
    assert!(manager.active_rides().await.is_empty());
}

#[tokio::test]
async fn test_replay_bad_point_closes_ride() {
    let manager = RideManager::default();
    let track = parse_track("28.70,77.10,40\n128.71,77.11,50").unwrap();

    assert!(manager.replay_track("2018 Splendor", 5., &track).await.is_err());
    assert!(manager.active_rides().await.is_empty());
}

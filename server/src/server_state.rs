use ride_tracker_data_management::RideManager;

pub struct ServerState {
    // Shared by every handler; the manager serializes access to the rides itself.
    pub ride_manager: RideManager,
}

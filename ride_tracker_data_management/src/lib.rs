pub mod store;
pub mod track_file;
mod ride_manager;

pub use ride_manager::*;
pub use ride_tracker_lib::error::RideError;

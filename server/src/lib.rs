pub mod config;
pub mod error;
pub mod ride_endpoint;
pub mod server_state;

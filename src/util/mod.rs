pub mod auth;
pub mod connection;
pub mod misc;
pub mod variant;
pub mod watchdog;

// Public API for the terminal client and integration tests

pub mod config;
pub mod local;
pub mod online;
pub mod question;
pub mod round;
pub mod scoring;
pub mod store;
pub mod timer;
pub mod types;

//! Core EventZen library (config, logging, location detection, identity).

pub mod config;
pub mod geocode;
pub mod geolocation;
pub mod identity;
pub mod location;
pub mod logging;
pub mod shared;

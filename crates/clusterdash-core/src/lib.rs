//! # ClusterDash Core Library
//!
//! Telemetry core for a serial-fed vehicle instrument cluster.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Decoding of the controller's line protocol (telemetry and commands)
//! - RPM smoothing and signal staleness handling
//! - Odometer, trip and average economy accounting
//! - Crash-safe persistence of odometer, fuel and theme state
//! - Button hold gestures for trip reset and theme changes
//! - A demo sweep for running without a controller
//!
//! ## Example
//!
//! ```rust,ignore
//! use clusterdash_core::prelude::*;
//!
//! let config = DashboardConfig::load("clusterdash.json")?;
//! let shutdown = install_shutdown_handler()?;
//!
//! run(&config, shutdown, |core| {
//!     println!("{:.0} MPH  {:.0} RPM", core.speed(), core.rpm());
//! });
//! ```

pub mod brightness;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod demo;
pub mod gestures;
pub mod odometer;
pub mod protocol;
pub mod runtime;
pub mod signal;
pub mod store;
pub mod unit_conversion;
pub mod vehicle;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::brightness::BrightnessController;
    pub use crate::config::{ConfigError, DashboardConfig};
    pub use crate::connection::ConnectionState;
    pub use crate::dashboard::DashboardCore;
    pub use crate::gestures::{ButtonGestures, GestureEvent};
    pub use crate::odometer::{DistanceAccumulator, InstantEconomy};
    pub use crate::protocol::{
        ByteChannel, Command, DecodedLine, LineDecoder, MemoryChannel, OutboundMessage,
        ProtocolError, SerialChannel, TelemetryFrame,
    };
    pub use crate::runtime::{install_shutdown_handler, run, MonotonicClock};
    pub use crate::signal::{Rpm, SignalConditioner};
    pub use crate::store::{PersistentRecord, PersistentStore, StoreError};
    pub use crate::unit_conversion::UnitSystem;
    pub use crate::vehicle::VehicleState;
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

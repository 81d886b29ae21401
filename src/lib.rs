//! Button box that mirrors and drives project timers on a time-tracking service.

/// configuration file
pub mod config;

/// SyncError and ConfigError
pub mod error;

/// turns raw pin levels into press/release edges
pub mod debounce;

/// GPIO inputs
pub mod buttons;

/// GPIO outputs and rendering
pub mod leds;

/// is the network usable
pub mod link;

/// blocking HTTP GET over TcpStream
pub mod http;

/// start/stop/running against the service
pub mod remote;

/// optimistic presses vs. authoritative snapshots
pub mod reconciler;

/// the main loop
pub mod controller;

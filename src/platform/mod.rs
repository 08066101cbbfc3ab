// relayctl - platform/mod.rs
//
// Platform abstraction layer: directories, config.toml, atomic file writes.
// Dependencies: util, core::filter (URL check only).
// Must NOT depend on: app.

pub mod config;
pub mod fs;

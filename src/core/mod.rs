// relayctl - core/mod.rs
//
// Core data model and validation.
// Dependencies: util only.
// Must NOT depend on: platform, app, or any network crate.

pub mod check;
pub mod filter;
pub mod model;

// relayctl - lib.rs
//
// Library entry point, exposing every layer for integration testing and
// programmatic use.
//
// The command-line surface (`cli`) lives next to `main.rs` and is not part
// of the library.

pub mod app;
pub mod core;
pub mod platform;
pub mod util;

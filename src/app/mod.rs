// relayctl - app/mod.rs
//
// Application layer: profile persistence, the relay service client, live
// tailing and login orchestration.
// Dependencies: core, platform, util.
// Must NOT depend on: the binary's output formatting.

pub mod api_client;
pub mod endpoint_check;
pub mod profile_store;
pub mod session;
pub mod tail;

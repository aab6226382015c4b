//! Integration test utilities for the bot client
//!
//! Provides an in-process mock of the REST API and the WebSocket gateway
//! for end-to-end tests of the client.

pub mod helpers;

pub use helpers::*;

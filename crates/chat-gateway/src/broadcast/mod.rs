//! Event broadcasting
//!
//! Fans gateway events out to subscriber callbacks.

mod dispatcher;

pub use dispatcher::{EventDispatcher, Listener, ListenerId, WILDCARD};

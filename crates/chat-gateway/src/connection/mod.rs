//! Connection management
//!
//! The active socket, the session state that outlives it, and the
//! transport that opens sockets.

mod connection;
mod session;
mod transport;

pub use connection::Connection;
pub use session::{ResumeTarget, SessionState};
pub use transport::{SocketCommand, SocketEvent, Transport, WebSocketTransport, ABNORMAL_CLOSURE};

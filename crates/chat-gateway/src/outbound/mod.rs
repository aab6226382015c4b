//! Outbound flow control
//!
//! The rate limiter gating sends on an open socket and the queue holding
//! whitelisted frames while none is open.

mod queue;
mod rate_limiter;

pub use queue::{OutboundQueue, DEFAULT_QUEUE_CAPACITY, DEFAULT_TTL};
pub use rate_limiter::{RateLimiter, DEFAULT_CAPACITY, DEFAULT_WINDOW};

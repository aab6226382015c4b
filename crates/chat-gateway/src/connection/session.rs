//! Session state
//!
//! What survives a dropped socket: the last sequence number, the session id
//! and resume URL from READY, and the session-start quota.

use crate::events::ReadyEvent;
use chat_rest::SessionStartLimit;
use std::time::Duration;

/// Everything needed to send a Resume
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeTarget {
    pub url: String,
    pub session_id: String,
    pub sequence: u64,
}

/// Resumable session bookkeeping
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    sequence: Option<u64>,
    session_id: Option<String>,
    resume_gateway_url: Option<String>,
    start_limit: Option<SessionStartLimit>,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn resume_gateway_url(&self) -> Option<&str> {
        self.resume_gateway_url.as_deref()
    }

    /// Record the `s` of a dispatch frame; frames without one leave it as is
    pub fn record_sequence(&mut self, sequence: Option<u64>) {
        if let Some(s) = sequence {
            self.sequence = Some(s);
        }
    }

    /// Capture the session fields of READY
    pub fn capture_ready(&mut self, ready: &ReadyEvent) {
        self.session_id = Some(ready.session_id.clone());
        self.resume_gateway_url = Some(ready.resume_gateway_url.clone());
    }

    /// The `{url, session_id, sequence}` triple, if all three are known
    pub fn resume_target(&self) -> Option<ResumeTarget> {
        Some(ResumeTarget {
            url: self.resume_gateway_url.clone()?,
            session_id: self.session_id.clone()?,
            sequence: self.sequence?,
        })
    }

    /// Forget the session; the next handshake will Identify
    pub fn invalidate(&mut self) {
        self.sequence = None;
        self.session_id = None;
        self.resume_gateway_url = None;
    }

    pub fn start_limit(&self) -> Option<SessionStartLimit> {
        self.start_limit
    }

    pub fn set_start_limit(&mut self, limit: SessionStartLimit) {
        self.start_limit = Some(limit);
    }

    /// How long to wait before a new session may start, if the quota is spent
    pub fn start_limit_wait(&self) -> Option<Duration> {
        self.start_limit
            .filter(|limit| limit.remaining == 0)
            .map(|limit| Duration::from_millis(limit.reset_after))
    }

    /// Count one Identify against the quota
    pub fn consume_start(&mut self) {
        if let Some(limit) = self.start_limit.as_mut() {
            limit.remaining = limit.remaining.saturating_sub(1);
        }
    }

    /// The quota window has reset
    ///
    /// Only an exhausted quota is refilled; once another deferral has
    /// refilled it, later identifies in the new window stay counted.
    /// Returns whether anything changed.
    pub fn replenish_start_limit(&mut self) -> bool {
        match self.start_limit.as_mut() {
            Some(limit) if limit.remaining == 0 => {
                limit.remaining = limit.total;
                true
            }
            _ => false,
        }
    }
}

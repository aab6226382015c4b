//! Reconnection policy
//!
//! Decides what follows a closed socket: give up, resume immediately, or
//! reconnect fresh after an exponential backoff.

use crate::config::GatewayConfig;
use crate::error::TerminalError;
use crate::events::GatewayEvent;
use crate::protocol::CloseClassification;
use crate::supervisor::handler::connect;
use crate::supervisor::state::{GatewayShared, GatewayState, Phase, TaskContext};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use super::HeartbeatHandler;

/// Backoff parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl ReconnectPolicy {
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            base: config.backoff_base,
            cap: config.backoff_cap,
            max_attempts: config.max_reconnect_attempts,
        }
    }

    /// `min(2^attempt * base + jitter, cap)` with `jitter` uniform in `[0, base)`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let jitter = if base_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..base_ms)
        };
        self.backoff_with_jitter(attempt, Duration::from_millis(jitter))
    }

    /// Backoff for `attempt` with an explicit jitter
    pub fn backoff_with_jitter(&self, attempt: u32, jitter: Duration) -> Duration {
        let base_ms = self.base.as_millis() as u64;
        let delay = 2u64
            .saturating_pow(attempt)
            .saturating_mul(base_ms)
            .saturating_add(jitter.as_millis() as u64);
        Duration::from_millis(delay).min(self.cap)
    }

    pub fn exhausted(&self, attempts: u32) -> bool {
        attempts >= self.max_attempts
    }
}

/// Acts on socket closes
pub struct ReconnectHandler;

impl ReconnectHandler {
    /// Consult the close table once and act on it
    pub(crate) fn on_close(
        shared: &Arc<GatewayShared>,
        state: &mut GatewayState,
        close: CloseClassification,
        reason: &str,
    ) {
        if close.fatal {
            Self::terminate(
                shared,
                state,
                TerminalError::FatalClose {
                    code: close.code,
                    name: close.name,
                    reason: reason.to_string(),
                },
            );
            return;
        }

        let policy = ReconnectPolicy::from_config(&shared.config);
        if policy.exhausted(state.attempts) {
            Self::terminate(
                shared,
                state,
                TerminalError::ReconnectExhausted {
                    attempts: state.attempts,
                },
            );
            return;
        }

        if close.reconnect {
            if let Some(target) = state.session.resume_target() {
                state.attempts += 1;
                tracing::info!(
                    code = close.code,
                    attempt = state.attempts,
                    session_id = %target.session_id,
                    "Resuming after close"
                );
                connect(shared, state, &target.url);
                return;
            }
        }

        Self::schedule_fresh(shared, state);
    }

    /// Forget the session and connect to the bootstrap endpoint after a backoff
    pub(crate) fn schedule_fresh(shared: &Arc<GatewayShared>, state: &mut GatewayState) {
        state.session.invalidate();
        if let Some(task) = state.reconnect_task.take() {
            task.cancel();
        }

        let ctx = TaskContext::new(shared, Some(state.generation));

        if let Some(wait) = state.session.start_limit_wait() {
            tracing::warn!(
                delay_ms = wait.as_millis() as u64,
                "Session start limit reached, deferring reconnect"
            );
            state.reconnect_task = Some(shared.scheduler.schedule(wait, async move {
                ctx.with_state(|shared, state| {
                    state.reconnect_task = None;
                    state.session.replenish_start_limit();
                    Self::schedule_fresh(shared, state);
                });
            }));
            return;
        }

        let Some(url) = state.gateway_url.clone() else {
            tracing::warn!("No gateway URL to reconnect to");
            return;
        };

        let delay = ReconnectPolicy::from_config(&shared.config).backoff(state.attempts);
        state.attempts += 1;
        tracing::info!(
            attempt = state.attempts,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting"
        );

        state.reconnect_task = Some(shared.scheduler.schedule(delay, async move {
            ctx.with_state(|shared, state| connect(shared, state, &url));
        }));
    }

    /// Stop for good and tell subscribers why
    pub(crate) fn terminate(shared: &Arc<GatewayShared>, state: &mut GatewayState, error: TerminalError) {
        tracing::error!(error = %error, "Gateway terminated");

        state.phase = Phase::Closed;
        state.closed = true;
        HeartbeatHandler::stop(state);
        if let Some(connection) = state.connection.take() {
            connection.close(1000, "");
        }
        state.backlog.clear();
        state.queue.clear();

        shared.publish(GatewayEvent::Terminated(error));
        shared.scheduler.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(30_000),
            max_attempts: 10,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = policy();
        assert_eq!(policy.backoff_with_jitter(0, Duration::ZERO), Duration::from_millis(1000));
        assert_eq!(policy.backoff_with_jitter(1, Duration::ZERO), Duration::from_millis(2000));
        assert_eq!(
            policy.backoff_with_jitter(3, Duration::from_millis(250)),
            Duration::from_millis(8250)
        );
    }

    #[test]
    fn test_backoff_capped() {
        let policy = policy();
        assert_eq!(policy.backoff_with_jitter(5, Duration::ZERO), Duration::from_millis(30_000));
        assert_eq!(policy.backoff_with_jitter(200, Duration::ZERO), Duration::from_millis(30_000));
    }

    #[test]
    fn test_backoff_jitter_range() {
        let policy = policy();
        for _ in 0..100 {
            let delay = policy.backoff(1);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay < Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_zero_base() {
        let policy = ReconnectPolicy {
            base: Duration::ZERO,
            ..policy()
        };
        assert_eq!(policy.backoff(4), Duration::ZERO);
    }

    #[test]
    fn test_exhausted() {
        let policy = policy();
        assert!(!policy.exhausted(9));
        assert!(policy.exhausted(10));
    }
}

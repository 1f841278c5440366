//! Per-request context threaded through store operations.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AuthcoreError, AuthcoreResult};

/// Client metadata and deadline of the call being served.
///
/// Dropping an operation's future cancels it; the deadline bounds the
/// time spent in storage calls and makes operations on an
/// already-expired context fail fast.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fail with [`AuthcoreError::DeadlineExceeded`] if the deadline has
    /// already passed.
    pub fn ensure_active(&self) -> AuthcoreResult<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(AuthcoreError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Run a storage future under this context's deadline.
    pub async fn run<T, F>(&self, fut: F) -> AuthcoreResult<T>
    where
        F: Future<Output = AuthcoreResult<T>>,
    {
        self.ensure_active()?;
        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, fut)
                .await
                .map_err(|_| AuthcoreError::DeadlineExceeded)?,
            None => fut.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_without_deadline_passes_through() {
        let ctx = RequestContext::new();
        let value = ctx.run(async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn expired_context_fails_fast() {
        let ctx = RequestContext::new().with_deadline(Instant::now() - Duration::from_secs(1));
        assert!(matches!(
            ctx.ensure_active(),
            Err(AuthcoreError::DeadlineExceeded)
        ));
        let result = ctx.run(async { Ok(()) }).await;
        assert!(matches!(result, Err(AuthcoreError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_hits_deadline() {
        let ctx = RequestContext::new().with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(AuthcoreError::DeadlineExceeded)));
    }
}

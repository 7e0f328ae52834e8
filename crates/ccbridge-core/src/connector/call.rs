//! Cancellation and deadline handling for connector calls.
//!
//! Every connector call the engine issues goes through [`CallGuard::run`],
//! which races the call against the caller's cancellation token and the
//! configured per-call timeout.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::{ConnectorError, ConnectorResult};
use crate::error::Error;

/// Why a guarded connector call did not produce a value.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    /// The connector returned an error.
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// The caller cancelled the operation while the call was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// The call exceeded the per-call deadline.
    #[error("connector call timed out after {0:?}")]
    TimedOut(Duration),
}

impl CallError {
    /// Whether the call was abandoned because of cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CallError::Cancelled)
    }
}

impl From<CallError> for Error {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Connector(e) => Error::Connector(e),
            CallError::Cancelled => Error::Cancelled,
            CallError::TimedOut(_) => Error::Connector(ConnectorError::connectivity(err.to_string())),
        }
    }
}

/// Cancellation token plus optional per-call deadline.
#[derive(Debug, Clone)]
pub struct CallGuard {
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

impl CallGuard {
    /// Create a guard.
    pub fn new(cancel: CancellationToken, timeout: Option<Duration>) -> Self {
        Self { cancel, timeout }
    }

    /// A guard that is never cancelled and has no deadline.
    pub fn unbounded() -> Self {
        Self::new(CancellationToken::new(), None)
    }

    /// Whether the caller has cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The underlying token.
    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run one connector call under the guard.
    pub async fn run<T, F>(&self, call: F) -> Result<T, CallError>
    where
        F: Future<Output = ConnectorResult<T>>,
    {
        if self.cancel.is_cancelled() {
            return Err(CallError::Cancelled);
        }

        let bounded = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result.map_err(CallError::from),
                    Err(_) => Err(CallError::TimedOut(limit)),
                },
                None => call.await.map_err(CallError::from),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CallError::Cancelled),
            result = bounded => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passes_through_value() {
        let guard = CallGuard::unbounded();
        let value = guard.run(async { Ok::<_, ConnectorError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_passes_through_connector_error() {
        let guard = CallGuard::unbounded();
        let err = guard
            .run(async { Err::<(), _>(ConnectorError::connectivity("down")) })
            .await
            .unwrap_err();
        assert!(matches!(err, CallError::Connector(_)));
        assert!(!err.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let token = CancellationToken::new();
        token.cancel();
        let guard = CallGuard::new(token, None);

        let err = guard.run(async { Ok::<_, ConnectorError>(1) }).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_during_call() {
        let token = CancellationToken::new();
        let guard = CallGuard::new(token.clone(), None);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let err = guard
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ConnectorError>(())
            })
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_timeout() {
        let guard = CallGuard::new(CancellationToken::new(), Some(Duration::from_millis(10)));
        let err = guard
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ConnectorError>(())
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CallError::TimedOut(_)));
        let engine_err: Error = err.into();
        assert!(engine_err.to_string().contains("timed out"));
    }
}

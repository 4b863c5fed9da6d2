use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio_util::sync::CancellationToken;

use crate::response::graphql_error::codes;

/// The cancellation signal of one execution.
///
/// Wraps the caller's token and remembers whether the execution deadline is
/// what fired it, so incomplete regions can be reported accurately.
#[derive(Debug, Clone, Default)]
pub struct ExecutionCancellation {
    token: CancellationToken,
    deadline_reached: Arc<AtomicBool>,
}

impl ExecutionCancellation {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            deadline_reached: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancel_for_deadline(&self) {
        self.deadline_reached.store(true, Ordering::SeqCst);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    #[inline]
    pub fn bail_if_cancelled(&self) -> Result<(), CancellationError> {
        if self.token.is_cancelled() {
            return Err(self.reason());
        }

        Ok(())
    }

    /// Resolves once the execution is cancelled.
    pub async fn cancelled(&self) -> CancellationError {
        self.token.cancelled().await;
        self.reason()
    }

    fn reason(&self) -> CancellationError {
        if self.deadline_reached.load(Ordering::SeqCst) {
            CancellationError::TimedOut
        } else {
            CancellationError::Cancelled
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CancellationError {
    #[error("Execution was cancelled")]
    Cancelled,
    #[error("Execution timed out")]
    TimedOut,
}

impl CancellationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            CancellationError::Cancelled => codes::EXECUTION_CANCELLED,
            CancellationError::TimedOut => codes::EXECUTION_TIMEOUT,
        }
    }
}

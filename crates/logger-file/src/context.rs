//! Runtime collaborators injected into a provider

use crate::clock::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How long `dispose` waits for the queue to drain by default.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_millis(1500);

/// Clock, shutdown signal and completion timeout of a provider.
///
/// Cancelling the shutdown token stops the provider from accepting records
/// and lets the processor drain what is already queued.
#[derive(Debug, Clone)]
pub struct FileLoggerContext {
    clock: Arc<dyn Clock>,
    shutdown_token: CancellationToken,
    completion_timeout: Option<Duration>,
}

impl Default for FileLoggerContext {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            shutdown_token: CancellationToken::new(),
            completion_timeout: Some(DEFAULT_COMPLETION_TIMEOUT),
        }
    }
}

impl FileLoggerContext {
    /// System clock, a fresh token and the default timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method for injecting a clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builder-style method for attaching an external shutdown signal
    #[must_use]
    pub fn with_shutdown_token(mut self, token: CancellationToken) -> Self {
        self.shutdown_token = token;
        self
    }

    /// Builder-style method for the completion timeout; `None` waits forever
    #[must_use]
    pub fn with_completion_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.completion_timeout = timeout;
        self
    }

    /// The injected clock
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// The external shutdown signal
    pub const fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    /// The completion timeout
    pub const fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout
    }
}

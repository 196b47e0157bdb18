//! Generation Retry Loop
//!
//! Wraps one generate-then-parse cycle with bounded retries. Only parse
//! failures are retried: the model is simply asked again with the
//! identical request, since a new sample may come back well-formed.
//! Provider and transport errors are terminal on the first occurrence,
//! and retrying a timeout would just stall the batch for minutes.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::provider::{GenerationRequest, LlmProvider};
use crate::types::{GenerationOutcome, Result};

/// Retry bounds for one content unit.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub pause: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, pause: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            pause,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.retry_pause_ms),
        )
    }
}

/// Drives the generate/parse cycle against one provider.
pub struct RetryController<'a> {
    provider: &'a dyn LlmProvider,
    policy: RetryPolicy,
}

impl<'a> RetryController<'a> {
    pub fn new(provider: &'a dyn LlmProvider, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Submit the request, parse the output, retry on parse failure up to
    /// the attempt cap. The request is re-sent verbatim each time.
    ///
    /// Never returns an error: exhaustion and fatal provider failures both
    /// collapse into [`GenerationOutcome::GivingUp`] so the caller can
    /// materialize a placeholder and move on.
    pub async fn run<T, F>(&self, request: &GenerationRequest, parse: F) -> GenerationOutcome<T>
    where
        F: Fn(&str) -> Result<T>,
    {
        for attempt in 1..=self.policy.max_attempts {
            let raw = match self.provider.generate(request).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(provider = self.provider.name(), attempt, error = %e, "Generation failed");
                    return GenerationOutcome::GivingUp {
                        attempts_made: attempt,
                        message: e.to_string(),
                    };
                }
            };

            match parse(&raw) {
                Ok(parsed) => {
                    debug!(attempt, "Parsed model output");
                    return GenerationOutcome::Success(parsed);
                }
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    warn!(attempt, error = %e, "Unparseable model output, retrying");
                    tokio::time::sleep(self.policy.pause).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Unparseable model output, giving up");
                    return GenerationOutcome::GivingUp {
                        attempts_made: attempt,
                        message: e.to_string(),
                    };
                }
            }
        }

        // max_attempts >= 1, so the loop always returns
        unreachable!("retry loop exited without an outcome")
    }
}

// =============================================================================
// Tests
// =============================================================================

// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Retry utilities with exponential backoff for upstream requests.
///
/// Only errors reported as transient by [`Error::is_transient`] are retried;
/// everything else is returned on the first failure.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Error;

/// Configuration for retry behavior with exponential backoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize,)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig
{
    /// Maximum number of attempts including the first one (default: 3).
    pub max_attempts:     u32,
    /// Initial delay between retries in milliseconds (default: 250).
    pub initial_delay_ms: u64,
    /// Multiplier for exponential backoff (default: 2.0).
    pub backoff_factor:   f64,
}

impl Default for RetryConfig
{
    fn default() -> Self
    {
        Self {
            max_attempts: 3, initial_delay_ms: 250, backoff_factor: 2.0,
        }
    }
}

/// Executes an async operation, retrying transient failures with exponential
/// backoff.
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays)
/// * `operation_name` - Name of the operation for logging
/// * `f` - Async function to retry
///
/// # Errors
///
/// Returns the first non-transient error, or the last transient error once
/// all attempts are exhausted.
pub async fn retry_with_backoff<F, Fut, T,>(
    config: &RetryConfig,
    operation_name: &str,
    mut f: F,
) -> Result<T, Error,>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, Error,>,>,
{
    let mut attempt = 1;
    let mut delay_ms = config.initial_delay_ms;

    loop {
        match f().await {
            Ok(result,) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result,);
            }
            Err(error,) if !error.is_transient() => return Err(error,),
            Err(error,) => {
                if attempt >= config.max_attempts {
                    warn!(
                        "{} failed after {} attempts: {}",
                        operation_name, config.max_attempts, error
                    );
                    return Err(error,);
                }

                warn!(
                    "{} failed on attempt {}/{}: {}. Retrying in {}ms...",
                    operation_name, attempt, config.max_attempts, error, delay_ms
                );

                sleep(Duration::from_millis(delay_ms,),).await;
                delay_ms = (delay_ms as f64 * config.backoff_factor) as u64;
                attempt += 1;
            }
        }
    }
}

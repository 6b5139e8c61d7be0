//! Episode session: reset sequencing and failure budgeting.
//!
//! The session owns one backend handle for its lifetime and issues all
//! operations sequentially; no internal parallelism, since most engines
//! serialize world mutations anyway. Structured reset failures are
//! counted against the configured budget before the session gives up;
//! backend faults are fatal immediately and the caller retries at a
//! higher level with a fresh handle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::warn;
use thiserror::Error;

use taskgen_types::prelude::PositionOrientation;

use crate::configuration::ConfigStore;
use crate::simulation::{BackendError, SimulatorBackend};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("episode reset failed {attempts} consecutive times, giving up")]
    ResetLimit { attempts: u32 },
    #[error("desired episode budget exhausted")]
    EpisodeBudgetExhausted,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// One backend handle driven through repeated episode resets.
pub struct EpisodeSession {
    backend: Arc<dyn SimulatorBackend>,
    config: Arc<ConfigStore>,
    episodes_started: u64,
    consecutive_failures: u32,
}

impl EpisodeSession {
    pub fn new(backend: Box<dyn SimulatorBackend>, config: Arc<ConfigStore>) -> Self {
        Self {
            backend: Arc::from(backend),
            config,
            episodes_started: 0,
            consecutive_failures: 0,
        }
    }

    pub fn backend(&self) -> &dyn SimulatorBackend {
        self.backend.as_ref()
    }

    pub fn episodes_started(&self) -> u64 {
        self.episodes_started
    }

    /// Per-episode wall-clock budget; `None` when the configured timeout is
    /// the infinite sentinel.
    pub fn episode_timeout(&self) -> Option<Duration> {
        let timeout = self.config.get().robot.timeout;
        timeout.is_finite().then(|| Duration::from_secs_f64(timeout))
    }

    /// Runs one episode reset: the before-hook, the caller-supplied world
    /// setup, then the after-hook. The setup returns `Ok(true)` when the
    /// world was populated, `Ok(false)` for a retryable structured
    /// failure. Structured failures are retried until
    /// `max_reset_fail_times` consecutive failures, then the session gives
    /// up. Returns [`SessionError::EpisodeBudgetExhausted`] once
    /// `desired_episodes` have been started.
    pub async fn reset<F, Fut>(&mut self, mut setup: F) -> Result<(), SessionError>
    where
        F: FnMut(Arc<dyn SimulatorBackend>) -> Fut,
        Fut: Future<Output = Result<bool, BackendError>>,
    {
        let general = self.config.get().general;
        if (self.episodes_started as f64) >= general.desired_episodes {
            return Err(SessionError::EpisodeBudgetExhausted);
        }

        loop {
            self.backend.before_episode_reset().await?;
            let outcome = setup(Arc::clone(&self.backend)).await;
            self.backend.after_episode_reset().await?;

            match outcome {
                Ok(true) => {
                    self.consecutive_failures = 0;
                    self.episodes_started += 1;
                    return Ok(());
                }
                Ok(false) => {
                    self.consecutive_failures += 1;
                    warn!(
                        "[EpisodeSession] reset attempt failed ({}/{})",
                        self.consecutive_failures, general.max_reset_fail_times
                    );
                    if self.consecutive_failures >= general.max_reset_fail_times {
                        return Err(SessionError::ResetLimit {
                            attempts: self.consecutive_failures,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn publish_goal(&self, goal: PositionOrientation) -> Result<(), SessionError> {
        self.backend.publish_goal(goal).await.map_err(Into::into)
    }
}

//! Proactive session refresh on a fixed period.
//!
//! DESIGN
//! ======
//! One background task per handle. The first refresh fires one full period
//! after start, then every period. Failures are logged and dropped: an
//! expired session will surface as a 401 on the next real request, where the
//! interceptor handles it authoritatively.
//!
//! This timer and the interceptor may refresh at the same moment. Both hit
//! the same idempotent endpoint, so no lock is taken.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::client::ApiClient;
use crate::error::ClientError;

/// Anything that can renew the current session.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<(), ClientError>;
}

#[async_trait]
impl Refresh for ApiClient {
    async fn refresh(&self) -> Result<(), ClientError> {
        self.refresh_session().await
    }
}

pub struct PeriodicRefresher;

impl PeriodicRefresher {
    /// Start the timer. Dropping or stopping the returned handle clears it.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    #[must_use = "dropping the handle stops the refresher immediately"]
    pub fn spawn(target: Arc<dyn Refresh>, period: Duration) -> RefresherHandle {
        assert!(!period.is_zero(), "refresh period must be non-zero");
        info!(period_secs = period.as_secs(), "session refresher started");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match target.refresh().await {
                    Ok(()) => debug!("proactive session refresh succeeded"),
                    Err(e) => warn!(error = %e, "proactive session refresh failed; deferring to next request"),
                }
            }
        });

        RefresherHandle { task: Some(task) }
    }
}

/// Disposer for a running refresher.
#[derive(Debug)]
pub struct RefresherHandle {
    task: Option<JoinHandle<()>>,
}

impl RefresherHandle {
    /// Clear the timer. No refresh is issued after this returns, although one
    /// already in flight may still complete on the server.
    pub fn stop(mut self) {
        self.clear();
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    fn clear(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("session refresher stopped");
        }
    }
}

impl Drop for RefresherHandle {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
#[path = "refresher_test.rs"]
mod tests;

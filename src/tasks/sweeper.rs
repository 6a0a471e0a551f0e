//! TTL Sweeper
//!
//! Background task that periodically removes expired cache entries without
//! waiting for them to be read.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

// == Expiry Source ==
/// Something the sweeper can scan for expired keys and expire them from.
pub trait ExpirySource: Send + Sync + 'static {
    /// Keys whose entries were expired when the scan ran.
    fn expired_keys(&self) -> Vec<String>;

    /// Removes one expired key. `Ok(false)` if it was already gone or has
    /// been rewritten since the scan.
    fn expire(&self, key: &str) -> Result<bool>;
}

impl ExpirySource for CacheStore {
    fn expired_keys(&self) -> Vec<String> {
        let now = current_timestamp_ms();
        self.dump_all()
            .into_iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key)
            .collect()
    }

    fn expire(&self, key: &str) -> Result<bool> {
        Ok(self.expire_if_stale(key))
    }
}

// == Sweep Report ==
/// Outcome of one sweep cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub failed: usize,
}

/// Runs one sweep cycle. A failure on one key is logged and the sweep moves
/// on to the next key.
pub fn sweep_once<S>(source: &S) -> SweepReport
where
    S: ExpirySource + ?Sized,
{
    let mut report = SweepReport::default();

    for key in source.expired_keys() {
        match source.expire(&key) {
            Ok(true) => report.expired += 1,
            Ok(false) => {}
            Err(e) => {
                report.failed += 1;
                warn!(key = %key, error = %e, "TTL sweep: failed to expire key");
            }
        }
    }

    report
}

// == TTL Sweeper ==
/// Owned handle to the periodic sweep task.
///
/// `start` must be called from within a Tokio runtime. Dropping the sweeper
/// stops it.
#[derive(Debug)]
pub struct TtlSweeper<S: ExpirySource = CacheStore> {
    source: Arc<S>,
    interval: Duration,
    running: Option<RunningSweep>,
}

#[derive(Debug)]
struct RunningSweep {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl<S: ExpirySource> TtlSweeper<S> {
    /// Creates a stopped sweeper.
    ///
    /// # Errors
    /// `InvalidArgument` if `interval` is zero.
    pub fn new(source: Arc<S>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(CacheError::InvalidArgument(
                "sweep interval must be positive".to_string(),
            ));
        }

        Ok(Self {
            source,
            interval,
            running: None,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    // == Start ==
    /// Spawns the sweep loop. The first sweep runs one interval from now.
    pub fn start(&mut self) {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let source = Arc::clone(&self.source);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            info!(interval_ms = interval.as_millis() as u64, "Starting TTL sweeper");

            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        let report = sweep_once(source.as_ref());
                        if report.expired > 0 || report.failed > 0 {
                            info!(
                                expired = report.expired,
                                failed = report.failed,
                                "TTL sweep: removed expired entries"
                            );
                        } else {
                            debug!("TTL sweep: no expired entries found");
                        }
                    }
                }
            }

            info!("TTL sweeper stopped");
        });

        self.running = Some(RunningSweep { stop_tx, handle });
    }

    // == Stop ==
    /// Cancels future sweeps without waiting for an in-flight one to finish.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            let _ = running.stop_tx.send(true);
        }
    }
}

impl<S: ExpirySource> Drop for TtlSweeper<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

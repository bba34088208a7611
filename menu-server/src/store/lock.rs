//! Bounded, cancellable lock acquisition
//!
//! Waits on a `parking_lot::Mutex` or `RwLock` in short slices so a cancellation token
//! is observed while blocked. Gives up once the total timeout expires.

use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use shared::AppError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Longest single wait between cancellation checks
pub const WAIT_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("lock wait timed out")]
    Timeout,
    #[error("request cancelled while waiting for lock")]
    Cancelled,
}

impl LockError {
    /// Convert into an API error naming the contended resource
    pub fn into_app_error(self, resource: impl Into<String>) -> AppError {
        match self {
            LockError::Timeout => AppError::lock_timeout(resource),
            LockError::Cancelled => AppError::cancelled(),
        }
    }
}

/// Acquire `mutex` within `timeout`, aborting early if `cancel` fires
pub fn acquire<'a, T>(
    mutex: &'a Mutex<T>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<MutexGuard<'a, T>, LockError> {
    wait_for(timeout, cancel, |slice| mutex.try_lock_for(slice))
}

/// Shared side of `lock`, same bounds as [`acquire`]
pub fn acquire_read<'a, T>(
    lock: &'a RwLock<T>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<RwLockReadGuard<'a, T>, LockError> {
    wait_for(timeout, cancel, |slice| lock.try_read_for(slice))
}

/// Exclusive side of `lock`, same bounds as [`acquire`]
pub fn acquire_write<'a, T>(
    lock: &'a RwLock<T>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<RwLockWriteGuard<'a, T>, LockError> {
    wait_for(timeout, cancel, |slice| lock.try_write_for(slice))
}

fn wait_for<G, F>(
    timeout: Duration,
    cancel: &CancellationToken,
    mut try_for: F,
) -> Result<G, LockError>
where
    F: FnMut(Duration) -> Option<G>,
{
    let deadline = Instant::now() + timeout;
    loop {
        if cancel.is_cancelled() {
            return Err(LockError::Cancelled);
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if let Some(guard) = try_for(remaining.min(WAIT_SLICE)) {
            return Ok(guard);
        }
        if Instant::now() >= deadline {
            return Err(LockError::Timeout);
        }
    }
}

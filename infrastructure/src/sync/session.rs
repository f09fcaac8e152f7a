use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

/// Session-wide lock that must be held while anything user-visible changes.
///
/// Shared by the request-handling path and every background poller of a session.
#[derive(Debug, Clone, Default)]
pub struct UpdateLock(Arc<Mutex<()>>);

impl UpdateLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn is_held(&self) -> bool {
        self.0.try_lock().is_err()
    }
}

/// Per-instance state paired with the session [`UpdateLock`].
///
/// The state guard and the update lock are never held at the same time:
/// [`SessionCell::publish`] consumes the state guard and drops it before
/// acquiring the update lock. Any path that needs both goes through it.
#[derive(Debug)]
pub struct SessionCell<S> {
    state: Mutex<S>,
    update_lock: UpdateLock,
}

impl<S> SessionCell<S> {
    pub fn new(state: S, update_lock: UpdateLock) -> Self {
        Self {
            state: Mutex::new(state),
            update_lock,
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock().await
    }

    /// Release `guard`, then run `f` under the update lock.
    pub async fn publish<R>(&self, guard: MutexGuard<'_, S>, f: impl FnOnce() -> R) -> R {
        drop(guard);
        self.publish_with(f).await
    }

    /// Run `f` under the update lock. Must not be called while holding a guard of this cell.
    pub async fn publish_with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _update = self.update_lock.acquire().await;
        f()
    }
}

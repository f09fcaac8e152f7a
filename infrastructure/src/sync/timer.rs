use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Run `f` every `interval`, starting immediately.
///
/// A notification on `wake` runs `f` right away and restarts the period.
/// `cancel` is only observed between runs, an in-flight `f` always completes.
/// Returns `None` when cancelled.
pub async fn new<T, F, Fut>(
    interval: Duration,
    wake: &Notify,
    cancel: &CancellationToken,
    mut f: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ControlFlow<T>>,
{
    let mut interval = tokio::time::interval(interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break None,
            _ = wake.notified() => interval.reset(),
            _ = interval.tick() => {}
        }

        if let ControlFlow::Break(ret) = f().await {
            break Some(ret);
        }
    }
}

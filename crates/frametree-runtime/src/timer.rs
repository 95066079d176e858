//! Cancellable tick-based deadline timer.
//!
//! Every wait in the protocol is bounded by one of these. The timer runs as
//! a spawned task that accumulates elapsed time in fixed-size ticks and
//! checks for cancellation between ticks, so `cancel` takes effect within
//! one tick instead of waiting out a single far-future wake-up. Firing is
//! at most once; cancelling after the fire (or twice) is a no-op.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Handle to an armed timer. Dropping the handle does not cancel the timer.
#[derive(Clone, Debug)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    /// Cancel the timer. Idempotent; safe after the timer already fired.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether `cancel` has been called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Arm a timer that runs `on_fire` once `deadline` has elapsed.
///
/// `tick` bounds how stale a cancellation check can be; a zero tick
/// degrades to a single sleep until the deadline.
pub fn arm<F>(deadline: Duration, tick: Duration, on_fire: F) -> TimerHandle
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let task_token = token.clone();
    let _ = tokio::spawn(async move {
        let mut elapsed = Duration::ZERO;
        while elapsed < deadline {
            let step = if tick.is_zero() {
                deadline - elapsed
            } else {
                tick.min(deadline - elapsed)
            };
            tokio::select! {
                () = task_token.cancelled() => return,
                () = tokio::time::sleep(step) => elapsed += step,
            }
        }
        if !task_token.is_cancelled() {
            on_fire.await;
        }
    });
    TimerHandle { token }
}

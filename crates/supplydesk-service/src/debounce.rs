//! Single-slot cancellable timer shared by the search controllers.

use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet period between the last keystroke and the commit.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(800);

struct Timer {
    token: u64,
    handle: JoinHandle<()>,
}

/// At most one pending timer. Arming aborts the previous one.
///
/// Lives inside the owner's session lock; the spawned task calls
/// [`Debounce::claim`] under that lock before acting, so a timer that
/// woke up just as it was replaced does nothing.
#[derive(Default)]
pub(crate) struct Debounce {
    seq: u64,
    pending: Option<Timer>,
}

impl Debounce {
    /// Start a new timer that runs `fire(token)` after [`SEARCH_DEBOUNCE`].
    /// Must be called from within a tokio runtime.
    pub(crate) fn arm<F, Fut>(&mut self, fire: F)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.seq = self.seq.wrapping_add(1);
        let token = self.seq;
        let expired = fire(token);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(SEARCH_DEBOUNCE).await;
            expired.await;
        });
        self.pending = Some(Timer { token, handle });
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(timer) = self.pending.take() {
            timer.handle.abort();
        }
    }

    /// Take ownership of an expiry. `false` when `token` is not the
    /// armed timer any more.
    pub(crate) fn claim(&mut self, token: u64) -> bool {
        match &self.pending {
            Some(timer) if timer.token == token => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|timer| !timer.handle.is_finished())
    }
}

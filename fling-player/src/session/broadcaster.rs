//! Status listener registry and fan-out

use fling_common::events::MediaStatus;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Observer of session status changes
///
/// Called synchronously from whichever thread triggered the broadcast, with no
/// session lock held. A listener may call back into the session.
pub trait StatusListener: Send + Sync {
    fn on_status_change(&self, status: &MediaStatus, position_ms: i64) -> anyhow::Result<()>;
}

impl<F> StatusListener for F
where
    F: Fn(&MediaStatus, i64) -> anyhow::Result<()> + Send + Sync,
{
    fn on_status_change(&self, status: &MediaStatus, position_ms: i64) -> anyhow::Result<()> {
        self(status, position_ms)
    }
}

/// Handle returned when a listener is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(Uuid);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn StatusListener>)>>,
}

impl ListenerRegistry {
    pub(crate) fn add(&self, listener: Arc<dyn StatusListener>) -> ListenerId {
        let id = ListenerId(Uuid::new_v4());
        self.listeners.lock().push((id, listener));
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Deliver one snapshot to every listener registered right now
    ///
    /// Failing or panicking listeners are logged and skipped. Returns how many
    /// listeners accepted the snapshot.
    pub(crate) fn deliver(&self, status: &MediaStatus, position_ms: i64) -> usize {
        let snapshot: Vec<_> = self
            .listeners
            .lock()
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect();

        let mut delivered = 0;
        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.on_status_change(status, position_ms)
            }));
            match outcome {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(e)) => warn!("Status listener {} failed: {:#}", id, e),
                Err(_) => warn!("Status listener {} panicked", id),
            }
        }
        delivered
    }
}

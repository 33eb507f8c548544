//! Readiness gates the command worker blocks on
//!
//! A gate is `Pending` until some other thread opens it (`Ready`) or reports
//! that readiness will never come (`Failed`). Closing a gate wakes every waiter
//! for shutdown and keeps it closed.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// Result of waiting on a gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    Ready,
    Failed,
    Closed,
    TimedOut,
}

#[derive(Debug)]
struct GateInner {
    readiness: Readiness,
    closed: bool,
}

#[derive(Debug)]
pub(crate) struct ReadinessGate {
    inner: Mutex<GateInner>,
    condvar: Condvar,
}

impl ReadinessGate {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(GateInner {
                readiness: Readiness::Pending,
                closed: false,
            }),
            condvar: Condvar::new(),
        }
    }

    /// Back to pending; waiters keep waiting
    pub(crate) fn reset(&self) {
        self.inner.lock().readiness = Readiness::Pending;
    }

    pub(crate) fn open(&self) {
        self.settle(Readiness::Ready);
    }

    pub(crate) fn fail(&self) {
        self.settle(Readiness::Failed);
    }

    pub(crate) fn close(&self) {
        self.inner.lock().closed = true;
        self.condvar.notify_all();
    }

    #[cfg(test)]
    pub(crate) fn is_ready(&self) -> bool {
        self.inner.lock().readiness == Readiness::Ready
    }

    fn settle(&self, readiness: Readiness) {
        self.inner.lock().readiness = readiness;
        self.condvar.notify_all();
    }

    /// Block until the gate settles, closes, or `timeout` elapses
    ///
    /// `None` waits indefinitely, as does a timeout too large to express as a
    /// deadline. Spurious wakeups are absorbed.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut inner = self.inner.lock();

        loop {
            if inner.closed {
                return WaitOutcome::Closed;
            }
            match inner.readiness {
                Readiness::Ready => return WaitOutcome::Ready,
                Readiness::Failed => return WaitOutcome::Failed,
                Readiness::Pending => {}
            }

            match deadline {
                None => self.condvar.wait(&mut inner),
                Some(deadline) => {
                    if self.condvar.wait_until(&mut inner, deadline).timed_out()
                        && !inner.closed
                        && inner.readiness == Readiness::Pending
                    {
                        return WaitOutcome::TimedOut;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_open_before_wait_returns_immediately() {
        let gate = ReadinessGate::new();
        gate.open();
        assert_eq!(gate.wait(None), WaitOutcome::Ready);
        // Level triggered: stays open
        assert_eq!(gate.wait(None), WaitOutcome::Ready);
    }

    #[test]
    fn test_wait_wakes_on_open_from_other_thread() {
        let gate = Arc::new(ReadinessGate::new());
        let opener = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            opener.open();
        });
        assert_eq!(gate.wait(Some(Duration::from_secs(5))), WaitOutcome::Ready);
        handle.join().unwrap();
    }

    #[test]
    fn test_failed_gate_does_not_block() {
        let gate = ReadinessGate::new();
        gate.fail();
        assert_eq!(gate.wait(None), WaitOutcome::Failed);
        gate.reset();
        assert_eq!(
            gate.wait(Some(Duration::from_millis(10))),
            WaitOutcome::TimedOut
        );
    }

    #[test]
    fn test_close_wakes_waiters() {
        let gate = Arc::new(ReadinessGate::new());
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait(None))
        };
        thread::sleep(Duration::from_millis(20));
        gate.close();
        assert_eq!(waiter.join().unwrap(), WaitOutcome::Closed);

        // Close wins over readiness
        gate.open();
        assert_eq!(gate.wait(None), WaitOutcome::Closed);
    }

    #[test]
    fn test_unbounded_timeout_waits_for_open() {
        let gate = Arc::new(ReadinessGate::new());
        let opener = Arc::clone(&gate);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            opener.open();
        });
        assert_eq!(gate.wait(Some(Duration::MAX)), WaitOutcome::Ready);
        handle.join().unwrap();
    }

    #[test]
    fn test_reset_clears_readiness() {
        let gate = ReadinessGate::new();
        gate.open();
        assert!(gate.is_ready());
        gate.reset();
        assert!(!gate.is_ready());
    }
}

//! Position update timer
//!
//! A single timer thread holding at most one pending deadline. Scheduling
//! replaces the pending deadline, so there is never more than one tick in
//! flight.

use crate::error::Result;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

#[derive(Debug, Default)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Default)]
struct TimerShared {
    state: Mutex<TimerState>,
    condvar: Condvar,
}

pub(crate) struct PositionTicker {
    shared: Arc<TimerShared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl PositionTicker {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(TimerShared::default()),
            thread: Mutex::new(None),
        }
    }

    /// Spawn the timer thread; `on_tick` runs on it with no lock held
    pub(crate) fn start<F>(&self, on_tick: F) -> Result<()>
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("fling-position-ticker".to_string())
            .spawn(move || Self::timer_loop(shared, on_tick))?;
        *self.thread.lock() = Some(handle);
        Ok(())
    }

    /// Fire once after `interval`, replacing any pending tick
    ///
    /// A zero interval only cancels, and so does one too large to express as
    /// a deadline.
    pub(crate) fn schedule(&self, interval: Duration) {
        let mut state = self.shared.state.lock();
        state.deadline = if interval.is_zero() {
            None
        } else {
            Instant::now().checked_add(interval)
        };
        self.shared.condvar.notify_one();
    }

    pub(crate) fn disarm(&self) {
        let mut state = self.shared.state.lock();
        if state.deadline.take().is_some() {
            debug!("Position ticker disarmed");
            self.shared.condvar.notify_one();
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }

    /// Cancel pending ticks and stop the timer thread
    pub(crate) fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.deadline = None;
        }
        self.shared.condvar.notify_all();

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("Position ticker thread panicked");
            }
        }
    }

    fn timer_loop<F: Fn()>(shared: Arc<TimerShared>, on_tick: F) {
        let mut state = shared.state.lock();
        loop {
            if state.shutdown {
                break;
            }
            match state.deadline {
                None => shared.condvar.wait(&mut state),
                Some(deadline) if Instant::now() >= deadline => {
                    state.deadline = None;
                    MutexGuard::unlocked(&mut state, &on_tick);
                }
                Some(deadline) => {
                    shared.condvar.wait_until(&mut state, deadline);
                }
            }
        }
    }
}

impl Drop for PositionTicker {
    fn drop(&mut self) {
        self.shared.state.lock().shutdown = true;
        self.shared.condvar.notify_all();
    }
}

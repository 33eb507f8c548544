//! Serial command queue
//!
//! FIFO of [`Command`]s drained by a single worker thread. Commands run one at a
//! time in submission order; a command that errors or panics is logged and the
//! worker moves on to the next one.

use super::command::Command;
use crate::error::Result;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

/// Shared state between the queue handle and its worker
struct SharedQueueState {
    queue: Mutex<VecDeque<Command>>,
    condvar: Condvar,
    stop_flag: AtomicBool,
}

pub(crate) struct CommandQueue {
    state: Arc<SharedQueueState>,
    thread: Option<JoinHandle<()>>,
}

impl CommandQueue {
    /// Spawn the worker thread
    ///
    /// `executor` runs every command on the worker thread.
    pub(crate) fn start<F>(executor: F) -> Result<Self>
    where
        F: FnMut(Command) + Send + 'static,
    {
        let state = Arc::new(SharedQueueState {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            stop_flag: AtomicBool::new(false),
        });

        let state_clone = Arc::clone(&state);
        let handle = thread::Builder::new()
            .name("fling-command-worker".to_string())
            .spawn(move || Self::worker_loop(state_clone, executor))?;

        info!("Command worker started");

        Ok(Self {
            state,
            thread: Some(handle),
        })
    }

    /// Append a command
    ///
    /// Returns false once shutdown has begun.
    pub(crate) fn enqueue(&self, command: Command) -> bool {
        if self.state.stop_flag.load(Ordering::Acquire) {
            debug!("Dropping {} (worker shutting down)", command.name());
            return false;
        }
        debug!("Enqueue {}", command.name());
        self.state.queue.lock().push_back(command);
        self.state.condvar.notify_one();
        true
    }

    /// Drop every command not yet started, returning how many were dropped
    pub(crate) fn flush(&self) -> usize {
        let mut queue = self.state.queue.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    pub(crate) fn len(&self) -> usize {
        self.state.queue.lock().len()
    }

    /// Stop the worker after its current command and wait for it to exit
    pub(crate) fn shutdown(mut self) {
        self.signal_stop();
        if let Some(handle) = self.thread.take() {
            if handle.thread().id() == thread::current().id() {
                // Shutdown requested from a command; the loop exits on its own
                return;
            }
            if handle.join().is_err() {
                error!("Command worker panicked during shutdown");
            }
        }
        info!("Command worker stopped");
    }

    fn signal_stop(&self) {
        self.state.stop_flag.store(true, Ordering::Release);
        self.state.condvar.notify_all();
    }

    fn worker_loop<F>(state: Arc<SharedQueueState>, mut executor: F)
    where
        F: FnMut(Command),
    {
        loop {
            let command = {
                let mut queue = state.queue.lock();

                while queue.is_empty() && !state.stop_flag.load(Ordering::Acquire) {
                    state.condvar.wait(&mut queue);
                }

                if state.stop_flag.load(Ordering::Acquire) {
                    debug!("Command worker received shutdown signal");
                    break;
                }

                queue.pop_front()
            };

            if let Some(command) = command {
                let name = command.name();
                debug!("Executing {}", name);
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| executor(command)));
                if outcome.is_err() {
                    error!("{} panicked; continuing with next command", name);
                }
            }
        }
    }
}

impl Drop for CommandQueue {
    fn drop(&mut self) {
        // Never join here: the last session reference may be dropped on the
        // worker thread itself.
        self.signal_stop();
    }
}

//! Retransmission timer
//!
//! A cancellable, restartable periodic action running on its own thread.
//! Arming sets a deadline; when it passes, the worker runs the fire callback
//! and re-arms for another period. The callback runs while the timer's state
//! lock is held, so [`RetransmitTimer::cancel`] waits for an in-flight firing
//! and no firing takes effect after `cancel` returns.
//!
//! Callers that share other locks with the callback must not hold them while
//! calling into the timer.

use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default retransmission period
pub const DEFAULT_RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Default)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
    fires: u64,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<TimerState>,
    wakeup: Condvar,
}

/// Periodic retransmission timer backed by a worker thread
pub struct RetransmitTimer {
    shared: Arc<Shared>,
    period: Duration,
    worker: Option<JoinHandle<()>>,
}

impl RetransmitTimer {
    /// Spawn a disarmed timer that calls `on_fire` every `period` while armed
    pub fn spawn<F>(name: &str, period: Duration, on_fire: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);

        let worker = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(&worker_shared, period, on_fire))?;

        Ok(RetransmitTimer {
            shared,
            period,
            worker: Some(worker),
        })
    }

    /// Arm the timer to fire one period from now, replacing any pending deadline
    pub fn start(&self) {
        let mut state = self.shared.state.lock();
        state.deadline = Some(Instant::now() + self.period);
        self.shared.wakeup.notify_one();
    }

    /// Disarm the timer
    ///
    /// Safe to call when already disarmed or never started.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        if state.deadline.take().is_some() {
            self.shared.wakeup.notify_one();
        }
    }

    /// Whether a deadline is pending
    pub fn is_armed(&self) -> bool {
        self.shared.state.lock().deadline.is_some()
    }

    /// Number of times the callback has run
    pub fn fire_count(&self) -> u64 {
        self.shared.state.lock().fires
    }

    /// Firing period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Disarm, stop the worker and wait for it to exit
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.deadline = None;
            state.shutdown = true;
            self.shared.wakeup.notify_one();
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("retransmit timer worker panicked");
            }
        }
    }
}

impl Drop for RetransmitTimer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run<F: FnMut()>(shared: &Shared, period: Duration, mut on_fire: F) {
    let mut state = shared.state.lock();

    while !state.shutdown {
        match state.deadline {
            None => shared.wakeup.wait(&mut state),
            Some(deadline) if Instant::now() >= deadline => {
                state.fires += 1;
                tracing::trace!(fires = state.fires, "retransmit timer fired");
                on_fire();
                state.deadline = Some(Instant::now() + period);
            }
            Some(deadline) => {
                shared.wakeup.wait_until(&mut state, deadline);
            }
        }
    }
}

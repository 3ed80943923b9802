//! Countdown tick scheduling
//!
//! The lock countdown is pull-based: `LockController::tick()` does the math,
//! and something has to call it once per second while a countdown is
//! displayed. `Ticker` is that something for hosts without their own timer —
//! a background thread sending one message per interval over an mpsc
//! channel, which the host pumps into the controller from its event loop.
//!
//! Stopping is synchronous: `stop()` (and `Drop`) flags the thread and joins
//! it, so no tick can arrive after teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::debug;

/// Granularity of the stop-flag poll inside the tick thread
const STOP_POLL: Duration = Duration::from_millis(25);

/// Message emitted once per tick interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickMessage;

/// Periodic tick thread with synchronous teardown
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Start ticking at the given interval.
    ///
    /// The thread exits on `stop()`, on drop, or when the receiving end of
    /// the channel is gone.
    pub fn start(interval: Duration, tx: Sender<TickMessage>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || {
            debug!("Ticker thread started ({:?} interval)", interval);
            'ticking: loop {
                let mut slept = Duration::ZERO;
                while slept < interval {
                    if stop_flag.load(Ordering::SeqCst) {
                        break 'ticking;
                    }
                    let step = STOP_POLL.min(interval - slept);
                    thread::sleep(step);
                    slept += step;
                }
                if stop_flag.load(Ordering::SeqCst) || tx.send(TickMessage).is_err() {
                    break;
                }
            }
            debug!("Ticker thread stopped");
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop the tick thread and wait for it to exit
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Longest single sleep, so `stop()` is noticed within a minute.
const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Next time `at` (UTC) strictly after `now`.
pub fn next_run_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

struct Worker {
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Worker {
    fn is_alive(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.thread.is_finished()
    }
}

/// Background thread running one job every day at a fixed time.
///
/// Each `start` gets its own stop flag, so a worker still sleeping after
/// `stop()` exits on wake-up even if a new one was started meanwhile.
#[derive(Default)]
pub struct SchedulerHandle {
    worker: Mutex<Option<Worker>>,
}

impl SchedulerHandle {
    pub fn new() -> SchedulerHandle {
        SchedulerHandle::default()
    }

    /// Starts the daily job. Returns `false` without doing anything if the
    /// scheduler is already running.
    pub fn start<F>(&self, at: NaiveTime, job: F) -> bool
    where
        F: Fn() + Send + 'static,
    {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.as_ref().map_or(false, Worker::is_alive) {
            info!("Scheduler already running; skipping re-init.");
            return false;
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = thread::spawn(move || {
            let mut next = next_run_after(Utc::now(), at);
            while flag.load(Ordering::SeqCst) {
                let now = Utc::now();
                if now >= next {
                    if panic::catch_unwind(AssertUnwindSafe(&job)).is_err() {
                        error!("Scheduled job panicked; will retry at next run.");
                    }
                    next = next_run_after(Utc::now(), at);
                    continue;
                }
                let wait = (next - now).to_std().unwrap_or_default();
                thread::sleep(wait.min(POLL_INTERVAL));
            }
        });

        *worker = Some(Worker { running, thread });
        info!("Daily Slack auto-report scheduled for {} UTC", at.format("%H:%M"));
        true
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(false, Worker::is_alive)
    }

    /// Asks the worker to exit. It finishes its current sleep first.
    pub fn stop(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(worker) = worker.take() {
            worker.running.store(false, Ordering::SeqCst);
        }
    }
}

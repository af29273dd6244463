//! Step gates for observing and pacing the crawl loops
//!
//! Each crawl loop announces a label such as `#3 wiki.example.org` to
//! its step gate before performing the unit of work the label names.
//! The gate either returns immediately or suspends the loop until an
//! operator releases it. This is the only coordination point between
//! the crawl engine and the outside world, which keeps the loops
//! deterministic enough to drive one unit at a time in tests.

use async_trait::async_trait;
use std::sync::Mutex;
use tokio::sync::{watch, Semaphore};

/// Gate consulted before every unit of crawl work
#[async_trait]
pub trait StepControl: Send + Sync {
    /// Announces one unit of work and waits until it is released
    async fn step(&self, label: &str);
}

/// Gate that never suspends
///
/// The default for unattended crawls. Labels are still traced so the
/// loop progression stays visible in logs.
#[derive(Debug, Default)]
pub struct FreeRun;

#[async_trait]
impl StepControl for FreeRun {
    async fn step(&self, label: &str) {
        tracing::trace!("step {}", label);
    }
}

/// Operator-controlled gate with pause, resume, and single-stepping
///
/// While paused, every `step` call suspends until either `resume`
/// releases all waiters or a `step_once` permit releases exactly one.
/// Labels are recorded in arrival order whether or not the caller was
/// suspended.
pub struct StepController {
    paused: watch::Sender<bool>,
    single: Semaphore,
    labels: Mutex<Vec<String>>,
}

impl StepController {
    /// Creates a controller; `paused` sets the initial gate state
    pub fn new(paused: bool) -> Self {
        let (tx, _) = watch::channel(paused);
        Self {
            paused: tx,
            single: Semaphore::new(0),
            labels: Mutex::new(Vec::new()),
        }
    }

    /// Suspends all future steps
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// Releases every suspended step and lets future steps run freely
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// True while the gate is holding steps back
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Releases exactly one suspended step (or the next one to arrive)
    pub fn step_once(&self) {
        self.single.add_permits(1);
    }

    /// Every label announced so far, in arrival order
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepControl for StepController {
    async fn step(&self, label: &str) {
        self.labels.lock().unwrap().push(label.to_string());

        let mut gate = self.paused.subscribe();
        loop {
            if !*gate.borrow_and_update() {
                return;
            }
            tokio::select! {
                permit = self.single.acquire() => {
                    if let Ok(permit) = permit {
                        permit.forget();
                    }
                    return;
                }
                changed = gate.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }
}

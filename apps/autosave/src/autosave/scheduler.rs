//! Debounced Persistence Scheduler.
//!
//! Each section key gets at most one worker task. The worker sleeps until the
//! key's pending deadline, re-checks it (a newer candidate pushes it back),
//! then commits the latest candidate. Because one worker owns a key, commits
//! for the same key are strictly ordered; different keys run independently
//! and only meet at the document store's write lock.
//!
//! State per key:
//! `idle -> pending -> (pending, deadline refreshed)* -> committing -> idle`

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::autosave::status::{SavePhase, SaveSummary, SectionStatus};
use crate::autosave::AutosaveSwitch;
use crate::document::{ChangeDetector, DocumentStore};
use crate::models::resume::SectionKey;
use crate::notify::Notifier;

/// What `schedule` did with a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleOutcome {
    /// A commit is armed (or its deadline was pushed back).
    Scheduled,
    /// Equal to what is already persisted; nothing to do.
    Unchanged,
    /// Equal to what is persisted while an edit was pending; the pending
    /// edit was dropped.
    Reverted,
    /// Autosave is switched off.
    Disabled,
    /// Empty object candidate; the editor has nothing to save yet.
    Empty,
}

struct Pending {
    candidate: Value,
    deadline: Instant,
}

#[derive(Default)]
struct KeySlot {
    pending: Option<Pending>,
    /// Candidate currently being written, if any.
    in_flight: Option<Value>,
    worker_active: bool,
    wake: Arc<Notify>,
    status: SectionStatus,
}

#[derive(Default)]
struct SchedulerState {
    detector: ChangeDetector,
    slots: HashMap<SectionKey, KeySlot>,
    active_workers: usize,
}

enum Step {
    Wait { deadline: Instant, wake: Arc<Notify> },
    Commit(Value),
    Done,
}

struct Inner {
    store: DocumentStore,
    notifier: Notifier,
    switch: AutosaveSwitch,
    delay: Duration,
    state: Mutex<SchedulerState>,
    idle: Notify,
}

#[derive(Clone)]
pub struct AutosaveScheduler {
    inner: Arc<Inner>,
}

impl AutosaveScheduler {
    pub fn new(
        store: DocumentStore,
        notifier: Notifier,
        switch: AutosaveSwitch,
        delay: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                notifier,
                switch,
                delay,
                state: Mutex::new(SchedulerState::default()),
                idle: Notify::new(),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Submits a candidate for `key`. Must be called inside a tokio runtime.
    pub fn schedule(&self, key: SectionKey, candidate: Value) -> ScheduleOutcome {
        if !self.inner.switch.is_enabled() {
            return ScheduleOutcome::Disabled;
        }
        if candidate.as_object().is_some_and(|m| m.is_empty()) {
            return ScheduleOutcome::Empty;
        }

        let mut guard = self.inner.lock();
        let SchedulerState {
            detector,
            slots,
            active_workers,
        } = &mut *guard;
        let slot = slots.entry(key).or_default();

        let matches_persisted = !detector.has_changed(key, &candidate);
        let matches_in_flight = slot
            .in_flight
            .as_ref()
            .map_or(true, |v| v == &candidate);
        if matches_persisted && matches_in_flight {
            if slot.pending.take().is_some() {
                if slot.status.phase == SavePhase::Pending {
                    slot.status.phase = SavePhase::Idle;
                }
                slot.wake.notify_one();
                debug!("Section '{key}' reverted to its saved value; pending save dropped");
                return ScheduleOutcome::Reverted;
            }
            return ScheduleOutcome::Unchanged;
        }

        slot.pending = Some(Pending {
            candidate,
            deadline: Instant::now() + self.inner.delay,
        });
        if slot.status.phase == SavePhase::Idle {
            slot.status.phase = SavePhase::Pending;
        }

        if !slot.worker_active {
            slot.worker_active = true;
            *active_workers += 1;
            tokio::spawn(run_worker(self.inner.clone(), key));
        }

        debug!("Armed save for section '{key}'");
        ScheduleOutcome::Scheduled
    }

    /// The newest not-yet-durable candidate for `key`, if any.
    pub fn working_value(&self, key: SectionKey) -> Option<Value> {
        let state = self.inner.lock();
        let slot = state.slots.get(&key)?;
        slot.pending
            .as_ref()
            .map(|p| p.candidate.clone())
            .or_else(|| slot.in_flight.clone())
    }

    pub fn status(&self, key: SectionKey) -> SectionStatus {
        self.inner
            .lock()
            .slots
            .get(&key)
            .map(|slot| slot.status.clone())
            .unwrap_or_default()
    }

    /// Header view: saving flag, per-key state and the document's `lastSaved`.
    pub async fn summary(&self) -> SaveSummary {
        let last_saved = self.inner.store.read().await.last_saved;
        let state = self.inner.lock();
        let sections: std::collections::BTreeMap<_, _> = state
            .slots
            .iter()
            .map(|(key, slot)| (*key, slot.status.clone()))
            .collect();
        SaveSummary {
            autosave_enabled: self.inner.switch.is_enabled(),
            is_saving: sections
                .values()
                .any(|s| s.phase == SavePhase::Committing),
            last_saved,
            sections,
        }
    }

    /// Fires every armed timer now and waits until all workers are idle.
    pub async fn flush(&self) {
        let idle = self.inner.idle.notified();
        tokio::pin!(idle);
        idle.as_mut().enable();

        {
            let mut state = self.inner.lock();
            let now = Instant::now();
            for slot in state.slots.values_mut() {
                if let Some(pending) = slot.pending.as_mut() {
                    pending.deadline = now;
                    slot.wake.notify_one();
                }
            }
            if state.active_workers == 0 {
                return;
            }
        }

        idle.await;
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_step(&self, key: SectionKey) -> Step {
        let mut guard = self.lock();
        let SchedulerState {
            slots,
            active_workers,
            ..
        } = &mut *guard;
        let slot = slots.entry(key).or_default();

        match slot.pending.take() {
            None => {
                slot.worker_active = false;
                slot.status.phase = SavePhase::Idle;
                *active_workers -= 1;
                if *active_workers == 0 {
                    self.idle.notify_waiters();
                }
                Step::Done
            }
            Some(pending) if pending.deadline > Instant::now() => {
                let deadline = pending.deadline;
                slot.pending = Some(pending);
                slot.status.phase = SavePhase::Pending;
                Step::Wait {
                    deadline,
                    wake: slot.wake.clone(),
                }
            }
            Some(pending) => {
                slot.status.phase = SavePhase::Committing;
                slot.in_flight = Some(pending.candidate.clone());
                Step::Commit(pending.candidate)
            }
        }
    }

    async fn commit(&self, key: SectionKey, candidate: Value) {
        let result = self.store.write_section(key, candidate.clone()).await;

        let committed = {
            let mut guard = self.lock();
            let SchedulerState {
                detector, slots, ..
            } = &mut *guard;
            let slot = slots.entry(key).or_default();
            slot.in_flight = None;

            match result {
                Ok(saved_at) => {
                    detector.accept(key, candidate);
                    slot.status.record_success(saved_at);
                    debug!("Saved section '{key}' at {saved_at}");
                    true
                }
                Err(e) => {
                    // The detector keeps its old value so an identical retry
                    // is still treated as a change.
                    warn!("Could not save section '{key}': {e}");
                    slot.status.record_failure(format!("Could not save changes: {e}"));
                    false
                }
            }
        };

        if committed {
            self.notifier.publish();
        }
    }
}

async fn run_worker(inner: Arc<Inner>, key: SectionKey) {
    loop {
        match inner.next_step(key) {
            Step::Done => break,
            Step::Wait { deadline, wake } => {
                tokio::select! {
                    _ = tokio::time::sleep_until(deadline) => {}
                    _ = wake.notified() => {}
                }
            }
            Step::Commit(candidate) => inner.commit(key, candidate).await,
        }
    }
}

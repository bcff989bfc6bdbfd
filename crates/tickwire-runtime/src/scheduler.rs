//! Cooperative tick scheduler.
//!
//! The host advances time explicitly with [`TickScheduler::tick`]. Two kinds
//! of work can be scheduled:
//! - timeouts: a callback that runs once, `n` ticks from now;
//! - jobs: a state machine stepped once per tick until it reports `Done`.
//!
//! Callbacks and job steps run with the scheduler lock released, so they may
//! schedule or clear other work (including themselves).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use crate::sync::lock;

/// Handle to a scheduled timeout or job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

/// Outcome of one job step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStep {
    /// Step again next tick.
    Yield,
    /// Finished; drop the job.
    Done,
}

/// Multi-tick work.
pub trait Job: Send {
    fn step(&mut self) -> JobStep;
}

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Inner {
    tick: u64,
    next_id: u64,
    timeouts: BTreeMap<(u64, RunId), Callback>,
    due: HashMap<RunId, u64>,
    jobs: Vec<(RunId, Box<dyn Job>)>,
    // jobs taken out of `jobs` for the current step pass
    stepping: HashSet<RunId>,
    cancelled: HashSet<RunId>,
}

impl Inner {
    fn alloc(&mut self) -> RunId {
        let id = RunId(self.next_id);
        self.next_id += 1;
        id
    }
}

/// Host-driven scheduler shared by every endpoint of one host.
#[derive(Default)]
pub struct TickScheduler {
    inner: Mutex<Inner>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed `tick()` calls.
    pub fn current_tick(&self) -> u64 {
        lock(&self.inner).tick
    }

    /// Run `f` on the `ticks`-th tick from now (`0` is treated as `1`).
    pub fn run_timeout<F>(&self, ticks: u32, f: F) -> RunId
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = lock(&self.inner);
        let id = inner.alloc();
        let due = inner.tick + u64::from(ticks.max(1));
        inner.timeouts.insert((due, id), Box::new(f));
        inner.due.insert(id, due);
        id
    }

    /// Step `job` once per tick, starting with the next tick.
    pub fn run_job(&self, job: Box<dyn Job>) -> RunId {
        let mut inner = lock(&self.inner);
        let id = inner.alloc();
        inner.jobs.push((id, job));
        id
    }

    /// Cancel a pending timeout or job. Returns whether anything was pending.
    pub fn clear_run(&self, id: RunId) -> bool {
        let (found, dropped_cb, dropped_job) = {
            let mut inner = lock(&self.inner);
            if let Some(due) = inner.due.remove(&id) {
                (true, inner.timeouts.remove(&(due, id)), None)
            } else if let Some(pos) = inner.jobs.iter().position(|(jid, _)| *jid == id) {
                (true, None, Some(inner.jobs.remove(pos).1))
            } else if inner.stepping.contains(&id) {
                (inner.cancelled.insert(id), None, None)
            } else {
                (false, None, None)
            }
        };
        // dropped outside the lock: a job's drop may call back into us
        drop(dropped_cb);
        drop(dropped_job);
        found
    }

    /// Number of pending timeouts plus live jobs.
    pub fn pending(&self) -> usize {
        let inner = lock(&self.inner);
        inner.timeouts.len() + inner.jobs.len() + inner.stepping.len() - inner.cancelled.len()
    }

    /// Advance one tick: run due timeouts, then step every job once.
    pub fn tick(&self) {
        let now = {
            let mut inner = lock(&self.inner);
            inner.tick += 1;
            inner.tick
        };

        // One at a time so a callback can still clear a later timeout due
        // this same tick.
        loop {
            let next = {
                let mut inner = lock(&self.inner);
                let key = inner
                    .timeouts
                    .keys()
                    .next()
                    .copied()
                    .filter(|(due, _)| *due <= now);
                key.and_then(|(due, id)| {
                    inner.due.remove(&id);
                    inner.timeouts.remove(&(due, id))
                })
            };
            match next {
                Some(cb) => cb(),
                None => break,
            }
        }

        let jobs = {
            let mut inner = lock(&self.inner);
            let jobs = std::mem::take(&mut inner.jobs);
            inner.stepping = jobs.iter().map(|(id, _)| *id).collect();
            jobs
        };

        let mut kept = Vec::with_capacity(jobs.len());
        let mut finished = Vec::new();
        for (id, mut job) in jobs {
            let cancelled = lock(&self.inner).cancelled.contains(&id);
            if !cancelled && job.step() == JobStep::Yield {
                kept.push((id, job));
            } else {
                finished.push((id, job));
            }
        }

        {
            let mut inner = lock(&self.inner);
            let (cancelled, mut survivors): (Vec<_>, Vec<_>) = kept
                .into_iter()
                .partition(|(id, _)| inner.cancelled.contains(id));
            finished.extend(cancelled);
            // jobs scheduled while stepping go after the survivors
            survivors.append(&mut inner.jobs);
            inner.jobs = survivors;
            inner.cancelled.clear();
            inner.stepping.clear();
        }
        // a finished job's drop may call back into the scheduler
        drop(finished);
    }
}

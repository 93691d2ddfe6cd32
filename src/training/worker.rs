use crate::abstraction::Model;
use crate::mccfr::profile::Delta;
use crate::mccfr::profile::Profile;
use crate::mccfr::profile::Snapshot;
use crate::mccfr::traversal::Traversal;
use crate::Utility;
use crate::N;
use crossbeam::channel::Receiver;
use crossbeam::channel::RecvTimeoutError;
use crossbeam::channel::Sender;
use std::sync::Arc;
use std::time::Duration;

/// how long a worker blocks on its task queue before
/// re-checking for shutdown, long enough to avoid thrashing
const TASK_TIMEOUT: Duration = Duration::from_secs(1);

pub enum Task {
    Batch {
        cycle: usize,
        start: usize,
        count: usize,
        epsilon: f64,
    },
    Sync(Box<Snapshot>),
    Stop,
}

/// the cycle tag lets the coordinator drop a straggler's
/// report that arrives after its batch was discarded and its
/// iteration range reassigned
pub struct Report {
    pub worker: usize,
    pub cycle: usize,
    pub start: usize,
    pub count: usize,
    pub delta: Delta,
    pub infosets: usize,
    pub utility: Utility,
    pub prunes: usize,
}

/// one training worker: a private copy of the regret store,
/// a task queue in, a report queue out. no memory is shared
/// with the coordinator or other workers; correctness of the
/// merge rests on regret updates being additive.
pub struct Worker {
    id: usize,
    profile: Profile,
    model: Arc<Model>,
    seed: u64,
    linear: bool,
    prune: Option<(f64, f64)>,
    tasks: Receiver<Task>,
    reports: Sender<Report>,
}

impl Worker {
    pub fn spawn(
        id: usize,
        model: Arc<Model>,
        seed: u64,
        linear: bool,
        prune: Option<(f64, f64)>,
        tasks: Receiver<Task>,
        reports: Sender<Report>,
    ) -> std::thread::JoinHandle<()> {
        std::thread::Builder::new()
            .name(format!("worker-{}", id))
            .spawn(move || {
                Self {
                    id,
                    profile: Profile::default(),
                    model,
                    seed,
                    linear,
                    prune,
                    tasks,
                    reports,
                }
                .run()
            })
            .expect("spawn worker thread")
    }

    fn run(mut self) {
        log::debug!("worker {} up", self.id);
        loop {
            match self.tasks.recv_timeout(TASK_TIMEOUT) {
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) | Ok(Task::Stop) => break,
                Ok(Task::Sync(snapshot)) => self.profile.restore(*snapshot),
                Ok(Task::Batch {
                    cycle,
                    start,
                    count,
                    epsilon,
                }) => {
                    let report = self.batch(cycle, start, count, epsilon);
                    if self.reports.send(report).is_err() {
                        break;
                    }
                }
            }
        }
        log::debug!("worker {} down", self.id);
    }

    /// execute one assigned batch: snapshot, run the
    /// iterations locally, ship only the non-zero changes.
    /// a failed iteration is logged and skipped; one lost
    /// episode does not compromise convergence.
    fn batch(&mut self, cycle: usize, start: usize, count: usize, epsilon: f64) -> Report {
        let snapshot = self.profile.snapshot();
        let mut utility = 0.0;
        let mut prunes = 0;
        for i in 0..count {
            let t = start + i;
            let traverser = t % N;
            match Traversal::new(
                &mut self.profile,
                &self.model,
                traverser,
                t,
                epsilon,
                self.linear,
                self.prune,
                self.seed,
            )
            .run()
            {
                Ok(episode) => {
                    utility += episode.utility;
                    prunes += episode.prunes;
                }
                Err(error) => log::error!("worker {} iteration {}: {}", self.id, t, error),
            }
        }
        Report {
            worker: self.id,
            cycle,
            start,
            count,
            delta: self.profile.delta_since(&snapshot),
            infosets: self.profile.infosets(),
            utility,
            prunes,
        }
    }
}

use super::config::Horizon;
use super::config::TrainConfig;
use super::progress::Progress;
use super::progress::Status;
use super::schedule::partition;
use super::worker::Report;
use super::worker::Task;
use super::worker::Worker;
use crate::abstraction::Model;
use crate::error::Error;
use crate::mccfr::epsilon::Epsilon;
use crate::mccfr::profile::Profile;
use crate::save;
use crate::save::DiscountState;
use crate::save::Meta;
use crossbeam::channel::bounded;
use crossbeam::channel::unbounded;
use crossbeam::channel::Receiver;
use crossbeam::channel::RecvTimeoutError;
use crossbeam::channel::Sender;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

/// how long a full merge cycle may run before missing
/// workers are declared failed and their batches discarded
const CYCLE_DEADLINE: Duration = Duration::from_secs(120);

/// minimum wait on the delta queue. the floor avoids a
/// busy-wait that overloads the kernel scheduler; apple
/// silicon hosts need a coarser tick.
const fn wait_floor() -> Duration {
    if cfg!(all(target_os = "macos", target_arch = "aarch64")) {
        Duration::from_millis(100)
    } else {
        Duration::from_millis(10)
    }
}

pub enum Outcome {
    Finished,
    Interrupted,
    ChunkComplete,
}

struct Lane {
    id: usize,
    tasks: Sender<Task>,
    handle: Option<std::thread::JoinHandle<()>>,
}

/// drives parallel training: assigns batches, merges worker
/// deltas (sum, never average), applies discount ticks,
/// writes checkpoints, and supervises worker health. owns
/// the authoritative regret store.
pub struct Coordinator {
    config: TrainConfig,
    model: Arc<Model>,
    profile: Profile,
    epsilon: Epsilon,
    t: usize,
    ticks: usize,
    lanes: Vec<Lane>,
    reports: Receiver<Report>,
    reports_in: Sender<Report>,
    started: Instant,
    chunk_started: Instant,
    chunk_base: usize,
    last_snapshot: Instant,
    window: VecDeque<(f64, f64)>,
    strikes: usize,
    cycles: usize,
    progress: Progress,
}

impl Coordinator {
    /// build a coordinator, resuming from the configured
    /// checkpoint directory when one is given. resume
    /// restores the store, the epsilon index, the discount
    /// tick count, and continues from t_global + 1.
    pub fn new(config: TrainConfig, model: Arc<Model>, instance: usize) -> Result<Self, Error> {
        config.validate()?;
        let digest = model.digest();
        let mut epsilon = config.epsilon();
        let mut profile = Profile::default();
        let mut t = 0;
        let mut ticks = 0;
        if let Some(ref from) = config.resume_from {
            match save::resume(from, &digest)? {
                None => {
                    return Err(Error::Configuration(format!(
                        "resume_from {} holds no loadable checkpoint",
                        from.display()
                    )))
                }
                Some((restored, meta)) => {
                    log::info!("resuming from iteration {}", meta.iteration);
                    profile = restored;
                    t = meta.iteration;
                    ticks = meta.discount_state.ticks;
                    epsilon.set_index(meta.epsilon_schedule_index);
                }
            }
        }
        let end = match config.horizon() {
            Horizon::Iterations(n) => n,
            Horizon::WallClock(_) => t,
        };
        let (reports_in, reports) = unbounded();
        Ok(Self {
            progress: Progress::new(instance, t, end),
            config,
            model,
            profile,
            epsilon,
            t,
            ticks,
            lanes: Vec::new(),
            reports,
            reports_in,
            started: Instant::now(),
            chunk_started: Instant::now(),
            chunk_base: t,
            last_snapshot: Instant::now(),
            window: VecDeque::new(),
            strikes: 0,
            cycles: 0,
        })
    }

    pub fn iteration(&self) -> usize {
        self.t
    }

    /// the training loop: merge cycles until the horizon, a
    /// chunk boundary, or an interrupt. always exits through
    /// a final checkpoint and a worker drain.
    pub fn run(&mut self) -> Result<Outcome, Error> {
        self.spawn_lanes();
        self.sync_workers();
        self.progress.update(self.t, Status::Running);
        let _ = self.progress.write(&self.config.workspace);
        let outcome = loop {
            if crate::interrupted() {
                break Outcome::Interrupted;
            }
            if self.done() {
                break Outcome::Finished;
            }
            if self.chunk_done() {
                break Outcome::ChunkComplete;
            }
            self.cycle()?;
        };
        self.shutdown(&outcome)?;
        Ok(outcome)
    }

    fn spawn_lanes(&mut self) {
        assert!(self.lanes.is_empty());
        for id in 0..self.config.workers() {
            self.lanes.push(self.spawn_lane(id));
        }
        log::info!("{} workers up", self.lanes.len());
    }

    fn spawn_lane(&self, id: usize) -> Lane {
        let (tasks, feed) = bounded(2);
        let handle = Worker::spawn(
            id,
            self.model.clone(),
            self.config.run_seed,
            self.config.use_linear_weighting,
            self.config.prune(),
            feed,
            self.reports_in.clone(),
        );
        Lane {
            id,
            tasks,
            handle: Some(handle),
        }
    }

    /// ship the authoritative store to every worker
    fn sync_workers(&mut self) {
        let snapshot = self.profile.snapshot();
        for lane in self.lanes.iter() {
            let _ = lane.tasks.send(Task::Sync(Box::new(snapshot.clone())));
        }
    }

    /// one merge cycle: assign a batch, gather deltas, merge,
    /// advance t_global, run the periodic jobs
    fn cycle(&mut self) -> Result<(), Error> {
        let batch = self.batch();
        let parts = partition(batch, self.lanes.len());
        let epsilon = self.epsilon.current();
        let before = Instant::now();
        self.cycles += 1;
        let cycle = self.cycles;
        let mut start = self.t + 1;
        let mut dispatched = 0;
        for (lane, &count) in self.lanes.iter().zip(parts.iter()) {
            if count == 0 {
                continue;
            }
            let _ = lane.tasks.send(Task::Batch {
                cycle,
                start,
                count,
                epsilon,
            });
            start += count;
            dispatched += 1;
        }
        let mut reports = self.gather(dispatched)?;
        // merged in worker order: addition commutes, but a
        // deterministic order keeps resumed runs bit-identical
        reports.sort_by_key(|report| report.worker);
        let infosets_before = self.profile.infosets();
        let merged = reports.iter().map(|r| r.count).sum::<usize>();
        let prunes = reports.iter().map(|r| r.prunes).sum::<usize>();
        for report in reports.iter() {
            self.profile.absorb(&report.delta);
        }
        log::trace!("cycle {} merged {} iterations, {} prunes", cycle, merged, prunes);
        let old = self.t;
        let new = self.t + merged;
        let discount_crossings =
            new / self.config.discount_interval - old / self.config.discount_interval;
        let checkpoint_due = new / self.config.checkpoint_interval
            > old / self.config.checkpoint_interval;
        let elapsed = before.elapsed().as_secs_f64();
        self.t = new;
        self.discount_ticks(discount_crossings);
        self.observe(merged, elapsed, infosets_before);
        if checkpoint_due
            || self.last_snapshot.elapsed().as_secs() >= self.config.snapshot_interval_seconds
        {
            self.checkpoint()?;
        }
        self.sync_workers();
        self.progress.update(self.t, Status::Running);
        let _ = self.progress.write(&self.config.workspace);
        Ok(())
    }

    /// iterations to hand out this cycle, truncated at an
    /// iteration horizon so we never overshoot it
    fn batch(&self) -> usize {
        match self.config.horizon() {
            Horizon::Iterations(n) => self.config.batch_size.min(n.saturating_sub(self.t)),
            Horizon::WallClock(_) => self.config.batch_size,
        }
    }

    /// collect one report per dispatched batch, discarding
    /// workers that die or blow the cycle deadline. a lost
    /// worker's batch is never merged; the lane is respawned
    /// when any worker remains, and the run fails after a
    /// final checkpoint when none do.
    fn gather(&mut self, expected: usize) -> Result<Vec<Report>, Error> {
        let deadline = Instant::now() + CYCLE_DEADLINE;
        let mut reports = Vec::new();
        while reports.len() < expected {
            match self.reports.recv_timeout(wait_floor()) {
                Ok(report) if report.cycle == self.cycles => reports.push(report),
                Ok(report) => {
                    log::warn!(
                        "dropping stale cycle-{} report from worker {}",
                        report.cycle,
                        report.worker
                    );
                }
                Err(RecvTimeoutError::Disconnected) => {
                    unreachable!("coordinator holds a sender")
                }
                Err(RecvTimeoutError::Timeout) => {
                    if Instant::now() >= deadline {
                        self.respawn_dead(expected - reports.len())?;
                        break;
                    }
                }
            }
        }
        self.strikes = match reports.len() {
            0 => self.strikes + 1,
            _ => 0,
        };
        if self.strikes >= 3 {
            self.checkpoint()?;
            return Err(Error::WorkerFailure(
                "no worker produced a batch in three consecutive cycles".into(),
            ));
        }
        Ok(reports)
    }

    fn respawn_dead(&mut self, missing: usize) -> Result<(), Error> {
        log::error!(
            "{} worker(s) failed to report in time, discarding their batches",
            missing
        );
        let dead = self
            .lanes
            .iter()
            .enumerate()
            .filter(|(_, lane)| {
                lane.handle
                    .as_ref()
                    .map(|handle| handle.is_finished())
                    .unwrap_or(true)
            })
            .map(|(i, _)| i)
            .collect::<Vec<usize>>();
        for index in dead {
            let id = self.lanes[index].id;
            log::warn!("respawning worker {}", id);
            let lane = self.spawn_lane(id);
            self.lanes[index] = lane;
        }
        Ok(())
    }

    /// apply any discount-interval boundaries this merge
    /// crossed. each tick is O(1) on the store; the dcfr
    /// negative-regret reset (when configured) is the only
    /// full sweep.
    fn discount_ticks(&mut self, crossings: usize) {
        for _ in 0..crossings {
            self.ticks += 1;
            if let Some((alpha, beta)) = self.config.discount.factors(self.ticks) {
                self.profile.discount(alpha, beta);
                if self.config.discount.resets_negative() {
                    self.profile.reset_negative_regrets();
                }
                log::debug!("discount tick {} ({:.6}, {:.6})", self.ticks, alpha, beta);
            }
        }
    }

    /// feed the adaptive epsilon controller a windowed view
    /// of throughput and infoset growth
    fn observe(&mut self, merged: usize, elapsed: f64, infosets_before: usize) {
        let ips = merged as f64 / elapsed.max(1e-9);
        let growth = match infosets_before {
            0 => 1.0,
            n => (self.profile.infosets() - n) as f64 / n as f64,
        };
        let window = self
            .epsilon
            .adaptive()
            .map(|adaptive| adaptive.window)
            .unwrap_or(1)
            .max(1);
        self.window.push_back((ips, growth));
        while self.window.len() > window {
            self.window.pop_front();
        }
        let observed = match self.window.len() {
            0 => None,
            n => Some((
                self.window.iter().map(|(i, _)| i).sum::<f64>() / n as f64,
                self.window.iter().map(|(_, g)| g).sum::<f64>() / n as f64,
            )),
        };
        self.epsilon.advance(self.t, observed);
        log::debug!(
            "t={} ips={:.0} infosets={} epsilon={:.2}",
            self.t,
            ips,
            self.profile.infosets(),
            self.epsilon.current()
        );
    }

    fn checkpoint(&mut self) -> Result<(), Error> {
        let (gamma_r, gamma_s) = self.profile.gammas();
        let meta = Meta {
            format_version: crate::FORMAT_VERSION,
            iteration: self.t,
            rng_state: self.config.run_seed,
            epsilon: self.epsilon.current(),
            epsilon_schedule_index: self.epsilon.index(),
            discount_state: DiscountState {
                gamma_r,
                gamma_s,
                ticks: self.ticks,
            },
            bucket_hash: self.model.digest(),
            timestamp: std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time moves slow")
                .as_secs(),
        };
        save::save(&self.config.workspace, &mut self.profile, &meta)?;
        self.last_snapshot = Instant::now();
        Ok(())
    }

    fn done(&self) -> bool {
        match self.config.horizon() {
            Horizon::Iterations(n) => self.t >= n,
            Horizon::WallClock(budget) => self.started.elapsed() >= budget,
        }
    }

    fn chunk_done(&self) -> bool {
        if !self.config.enable_chunked_training {
            return false;
        }
        if let Some(iterations) = self.config.chunk_iterations {
            return self.t.saturating_sub(self.chunk_base) >= iterations;
        }
        if let Some(minutes) = self.config.chunk_minutes {
            return self.chunk_started.elapsed().as_secs() >= minutes * 60;
        }
        false
    }

    /// stop workers, drain stragglers, write the final
    /// checkpoint, publish the terminal progress record
    fn shutdown(&mut self, outcome: &Outcome) -> Result<(), Error> {
        for lane in self.lanes.iter() {
            let _ = lane.tasks.send(Task::Stop);
        }
        for lane in self.lanes.iter_mut() {
            if let Some(handle) = lane.handle.take() {
                let _ = handle.join();
            }
        }
        while let Ok(report) = self.reports.try_recv() {
            // in-flight batches at shutdown are discarded,
            // never partially merged
            drop(report);
        }
        self.lanes.clear();
        self.checkpoint()?;
        let status = match outcome {
            Outcome::Finished => Status::Completed,
            Outcome::Interrupted => Status::Interrupted,
            Outcome::ChunkComplete => Status::Running,
        };
        self.progress.update(self.t, status);
        let _ = self.progress.write(&self.config.workspace);
        log::info!("coordinator down at t={} ({})", self.t, self.profile);
        Ok(())
    }
}

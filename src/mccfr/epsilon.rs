use serde::Deserialize;
use serde::Serialize;

/// exploration schedule for the traverser's action sampling.
/// piecewise-constant over iteration breakpoints, with an
/// optional adaptive controller that moves the next
/// breakpoint earlier when training runs hot (throughput
/// above target while the infoset count still grows) and
/// later, by at most 30%, when it does not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epsilon {
    schedule: Vec<(usize, f64)>,
    index: usize,
    adaptive: Option<Adaptive>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Adaptive {
    pub target_ips: f64,
    pub min_growth: f64,
    pub window: usize,
}

const EARLY: f64 = 0.7;
const FORCED: f64 = 1.3;

impl Epsilon {
    pub fn constant(epsilon: f64) -> Self {
        Self {
            schedule: vec![(0, epsilon)],
            index: 0,
            adaptive: None,
        }
    }

    pub fn scheduled(schedule: Vec<(usize, f64)>, adaptive: Option<Adaptive>) -> Self {
        assert!(!schedule.is_empty());
        assert!(schedule.windows(2).all(|w| w[0].0 < w[1].0));
        Self {
            schedule,
            index: 0,
            adaptive,
        }
    }

    /// the default descent used when no schedule is given
    pub fn standard(total: usize) -> Self {
        let steps = [0.60, 0.50, 0.40, 0.30, 0.20, 0.12, 0.08];
        let total = total.max(steps.len());
        let schedule = steps
            .iter()
            .enumerate()
            .map(|(i, &e)| (total * i / steps.len(), e))
            .collect();
        Self::scheduled(schedule, None)
    }

    pub fn current(&self) -> f64 {
        self.schedule[self.index].1
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn set_index(&mut self, index: usize) {
        assert!(index < self.schedule.len());
        self.index = index;
    }
    pub fn adaptive(&self) -> Option<Adaptive> {
        self.adaptive
    }

    /// move the schedule forward given the global iteration
    /// count and, in adaptive mode, the recent throughput
    /// (iterations per second) and infoset growth rate
    /// averaged over the controller's window of merges.
    pub fn advance(&mut self, t: usize, observed: Option<(f64, f64)>) {
        loop {
            let Some(&(nominal, _)) = self.schedule.get(self.index + 1) else {
                return;
            };
            let crossed = match (self.adaptive, observed) {
                (Some(adaptive), Some((ips, growth))) => {
                    let early = (nominal as f64 * EARLY) as usize;
                    let forced = (nominal as f64 * FORCED) as usize;
                    if ips >= adaptive.target_ips && growth >= adaptive.min_growth {
                        t >= early
                    } else {
                        t >= forced
                    }
                }
                _ => t >= nominal,
            };
            if crossed {
                self.index += 1;
            } else {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule() -> Vec<(usize, f64)> {
        vec![(0, 0.6), (1000, 0.4), (2000, 0.2)]
    }

    #[test]
    fn piecewise_constant() {
        let mut epsilon = Epsilon::scheduled(schedule(), None);
        epsilon.advance(500, None);
        assert!(epsilon.current() == 0.6);
        epsilon.advance(1500, None);
        assert!(epsilon.current() == 0.4);
        epsilon.advance(5000, None);
        assert!(epsilon.current() == 0.2);
    }

    #[test]
    fn adaptive_advances_early_when_hot() {
        let adaptive = Adaptive {
            target_ips: 100.0,
            min_growth: 0.1,
            window: 4,
        };
        let mut epsilon = Epsilon::scheduled(schedule(), Some(adaptive));
        epsilon.advance(700, Some((200.0, 0.5)));
        assert!(epsilon.current() == 0.4, "hot run advances at 70%");
    }

    #[test]
    fn adaptive_delays_at_most_thirty_percent() {
        let adaptive = Adaptive {
            target_ips: 100.0,
            min_growth: 0.1,
            window: 4,
        };
        let mut epsilon = Epsilon::scheduled(schedule(), Some(adaptive));
        epsilon.advance(1200, Some((10.0, 0.0)));
        assert!(epsilon.current() == 0.6, "cold run holds past nominal");
        epsilon.advance(1300, Some((10.0, 0.0)));
        assert!(epsilon.current() == 0.4, "forced at 130% of nominal");
    }

    #[test]
    fn index_survives_checkpoint() {
        let mut epsilon = Epsilon::scheduled(schedule(), None);
        epsilon.advance(1500, None);
        let index = epsilon.index();
        let mut restored = Epsilon::scheduled(schedule(), None);
        restored.set_index(index);
        assert!(restored.current() == epsilon.current());
    }
}

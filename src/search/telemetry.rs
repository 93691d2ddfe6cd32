use crate::mccfr::profile::Policy;

/// per-call resolver diagnostics, logged after every decision
/// and aggregated offline into the failsafe fallback rate
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub millis: u64,
    pub iterations: usize,
    pub fallback: bool,
    pub kl_to_blueprint: f64,
    pub variance: f64,
    pub distribution: Policy,
}

impl Telemetry {
    pub fn emit(&self) {
        log::debug!("{}", self);
    }
}

impl std::fmt::Display for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "resolve {}ms {} iters{} kl={:.4} var={:.6} [{}]",
            self.millis,
            self.iterations,
            if self.fallback { " FALLBACK" } else { "" },
            self.kl_to_blueprint,
            self.variance,
            self.distribution
                .iter()
                .map(|(edge, p)| format!("{}:{:.3}", edge, p))
                .collect::<Vec<String>>()
                .join(" ")
        )
    }
}

/// session-level aggregation over many decisions; feeds the
/// failsafe fallback rate and decision-time percentiles
#[derive(Debug, Default)]
pub struct Aggregate {
    calls: usize,
    fallbacks: usize,
    millis: Vec<u64>,
}

impl Aggregate {
    pub fn record(&mut self, telemetry: &Telemetry) {
        self.calls += 1;
        self.fallbacks += telemetry.fallback as usize;
        self.millis.push(telemetry.millis);
    }
    pub fn calls(&self) -> usize {
        self.calls
    }
    pub fn failsafe_fallback_rate(&self) -> f64 {
        match self.calls {
            0 => 0.0,
            n => self.fallbacks as f64 / n as f64,
        }
    }
    /// decision time at the given percentile, e.g. 95
    pub fn percentile_millis(&self, percentile: usize) -> u64 {
        assert!(percentile <= 100);
        let mut sorted = self.millis.clone();
        sorted.sort_unstable();
        match sorted.len() {
            0 => 0,
            n => sorted[((n - 1) * percentile) / 100],
        }
    }
}

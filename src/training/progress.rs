use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Starting,
    Running,
    Completed,
    Failed,
    Interrupted,
}

/// one instance's externally visible progress, written
/// atomically as JSON so monitors never read a torn record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub instance_id: usize,
    pub start_iter: usize,
    pub end_iter: usize,
    pub current_iter: usize,
    pub status: Status,
    pub progress_pct: f64,
    pub last_update: u64,
}

impl Progress {
    pub fn new(instance_id: usize, start_iter: usize, end_iter: usize) -> Self {
        Self {
            instance_id,
            start_iter,
            end_iter,
            current_iter: start_iter,
            status: Status::Starting,
            progress_pct: 0.0,
            last_update: now(),
        }
    }

    pub fn update(&mut self, current_iter: usize, status: Status) {
        self.current_iter = current_iter;
        self.status = status;
        self.progress_pct = match self.end_iter.saturating_sub(self.start_iter) {
            0 => 0.0,
            span => {
                100.0 * current_iter.saturating_sub(self.start_iter) as f64 / span as f64
            }
        };
        self.last_update = now();
    }

    pub fn write(&self, dir: &std::path::Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("progress-{}.json", self.instance_id));
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(self).expect("serializes"))?;
        std::fs::rename(tmp, path)
    }
}

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_tracks_span() {
        let mut progress = Progress::new(0, 1000, 2000);
        progress.update(1500, Status::Running);
        assert!((progress.progress_pct - 50.0).abs() < 1e-9);
        progress.update(2000, Status::Completed);
        assert!((progress.progress_pct - 100.0).abs() < 1e-9);
    }

    #[test]
    fn atomic_write_round_trips() {
        let dir = std::env::temp_dir().join("riverbot-progress-test");
        let progress = Progress::new(3, 0, 100);
        progress.write(&dir).unwrap();
        let text = std::fs::read_to_string(dir.join("progress-3.json")).unwrap();
        let loaded: Progress = serde_json::from_str(&text).unwrap();
        assert!(loaded.instance_id == 3);
        assert!(loaded.status == Status::Starting);
    }
}

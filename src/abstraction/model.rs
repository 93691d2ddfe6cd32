use super::config::BucketConfig;
use super::observation::Observation;
use crate::cards::street::Street;
use crate::error::Error;
use byteorder::ReadBytesExt;
use byteorder::WriteBytesExt;
use byteorder::BE;
use std::io::Read;
use std::io::Write;

const MAGIC: &[u8] = b"RVBTBKT\0";

/// feature extraction dominates assignment cost, so repeat
/// lookups are cached. bounded to keep long runs from
/// trading their regret-store memory for cache entries.
const CACHE_LIMIT: usize = 1 << 22;

/// the hand abstraction: per-street k-means centroids over
/// the feature space. read-only after load, safe to share
/// across threads. assignment is nearest-centroid, so every
/// observation gets some bucket even when the fit is poor.
pub struct Model {
    config: BucketConfig,
    centroids: [Vec<Vec<f64>>; 4],
    cache: dashmap::DashMap<Observation, u16>,
}

impl Model {
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// content digest identifying this abstraction: config
    /// fields plus every centroid coordinate. checkpoints
    /// record it and refuse to resume across a mismatch.
    pub fn digest(&self) -> String {
        use sha2::Digest;
        let mut hasher = sha2::Sha256::new();
        hasher.update(self.config.feature_version.to_be_bytes());
        hasher.update(self.config.seed.to_be_bytes());
        for street in Street::all() {
            hasher.update((self.config.ks(*street) as u64).to_be_bytes());
            for centroid in self.centroids[*street as usize].iter() {
                for x in centroid.iter() {
                    hasher.update(x.to_be_bytes());
                }
            }
        }
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// deterministic bucket assignment in [0, k_street)
    pub fn bucket(&self, observation: &Observation) -> u16 {
        if let Some(bucket) = self.cache.get(observation) {
            return *bucket;
        }
        let street = observation.street();
        let features = observation.features(&self.config);
        let bucket = self.centroids[street as usize]
            .iter()
            .enumerate()
            .map(|(i, centroid)| (i, Self::distance(&features, centroid)))
            .min_by(|(_, a), (_, b)| a.partial_cmp(b).expect("distances are not NaN"))
            .map(|(i, _)| i as u16)
            .expect("at least one centroid per street");
        if self.cache.len() < CACHE_LIMIT {
            self.cache.insert(*observation, bucket);
        }
        bucket
    }

    fn distance(x: &[f64], y: &[f64]) -> f64 {
        x.iter()
            .zip(y.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
    }

    /// synthesize deterministic centroids from the config seed.
    /// stands in for the offline k-means artifact in tests and
    /// cold starts; identical configs yield identical digests.
    pub fn seeded(config: BucketConfig) -> Self {
        use rand::Rng;
        let centroids = (*Street::all()).map(|street| {
            let ref mut rng = crate::rng(config.seed, ("centroids", street));
            (0..config.ks(street))
                .map(|_| {
                    (0..BucketConfig::dims(street))
                        .map(|_| rng.random_range(0.0..1.0))
                        .collect::<Vec<f64>>()
                })
                .collect::<Vec<Vec<f64>>>()
        });
        Self {
            config,
            centroids,
            cache: dashmap::DashMap::new(),
        }
    }

    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        let tmp = path.with_extension("tmp");
        let ref mut file = std::fs::File::create(&tmp)?;
        file.write_all(MAGIC)?;
        file.write_u32::<BE>(self.config.feature_version)?;
        file.write_u64::<BE>(self.config.seed)?;
        for street in Street::all() {
            file.write_u64::<BE>(self.config.ks(*street) as u64)?;
            for centroid in self.centroids[*street as usize].iter() {
                for x in centroid.iter() {
                    file.write_f64::<BE>(*x)?;
                }
            }
        }
        file.flush()?;
        std::fs::rename(tmp, path)
    }

    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        let attempt = || -> std::io::Result<Self> {
            let ref mut file = std::io::BufReader::new(std::fs::File::open(path)?);
            let mut magic = [0u8; 8];
            file.read_exact(&mut magic)?;
            if &magic[..] != MAGIC {
                return Err(std::io::Error::other("bad magic"));
            }
            let feature_version = file.read_u32::<BE>()?;
            let seed = file.read_u64::<BE>()?;
            let mut ks = [0usize; 4];
            let mut centroids: [Vec<Vec<f64>>; 4] = [vec![], vec![], vec![], vec![]];
            for street in Street::all() {
                let k = file.read_u64::<BE>()? as usize;
                ks[*street as usize] = k;
                centroids[*street as usize] = (0..k)
                    .map(|_| {
                        (0..BucketConfig::dims(*street))
                            .map(|_| file.read_f64::<BE>())
                            .collect::<std::io::Result<Vec<f64>>>()
                    })
                    .collect::<std::io::Result<Vec<Vec<f64>>>>()?;
            }
            Ok(Self {
                config: BucketConfig {
                    k_pref: ks[0],
                    k_flop: ks[1],
                    k_turn: ks[2],
                    k_rive: ks[3],
                    seed,
                    feature_version,
                },
                centroids,
                cache: dashmap::DashMap::new(),
            })
        };
        attempt().map_err(|e| Error::Configuration(format!("bucket model unreadable: {}", e)))
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} {}", self.config, &self.digest()[..12])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::board::Board;
    use crate::cards::hole::Hole;
    use crate::Arbitrary;

    #[test]
    fn assignment_in_range() {
        let model = Model::seeded(BucketConfig::default());
        for _ in 0..32 {
            let observation = Observation {
                hole: Hole::random(),
                board: Board::empty(),
                pot: 4,
                stack: 100,
                position: false,
            };
            assert!((model.bucket(&observation) as usize) < model.config().k_pref);
        }
    }

    #[test]
    fn assignment_is_deterministic() {
        let a = Model::seeded(BucketConfig::default());
        let b = Model::seeded(BucketConfig::default());
        let observation = Observation {
            hole: Hole::random(),
            board: Board::empty(),
            pot: 4,
            stack: 100,
            position: true,
        };
        assert!(a.bucket(&observation) == b.bucket(&observation));
    }

    #[test]
    fn digest_tracks_config() {
        let a = Model::seeded(BucketConfig::default());
        let b = Model::seeded(BucketConfig {
            seed: 0xBAD,
            ..BucketConfig::default()
        });
        assert!(a.digest() == Model::seeded(BucketConfig::default()).digest());
        assert!(a.digest() != b.digest());
    }

    #[test]
    fn artifact_round_trip() {
        let dir = std::env::temp_dir().join("riverbot-model-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("buckets.bin");
        let model = Model::seeded(BucketConfig::default());
        model.save(&path).unwrap();
        let loaded = Model::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(model.digest() == loaded.digest());
    }
}

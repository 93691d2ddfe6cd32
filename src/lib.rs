pub mod abstraction;
pub mod analysis;
pub mod cards;
pub mod error;
pub mod gameplay;
pub mod mccfr;
pub mod players;
pub mod save;
pub mod search;
pub mod training;

/// dimensional analysis types
pub type Chips = i32;
pub type Utility = f64;
pub type Probability = f64;

/// game tree parameters
pub const N: usize = 2;
pub const STACK: Chips = 200;
pub const B_BLIND: Chips = 2;
pub const S_BLIND: Chips = 1;
pub const MAX_RAISE_REPEATS: usize = 3;
pub const MAX_HISTORY: usize = 44;

/// regret store parameters
pub const PRUNE_THRESHOLD: Utility = -3e8;
pub const PRUNE_PROBABILITY: Probability = 0.95;
pub const POLICY_MIN: Probability = Probability::MIN_POSITIVE;
pub const GAMMA_DRIFT: f64 = 10.0;

/// resolver parameters
pub const WARM_START_SCALE: Utility = 1e-2;
pub const OPPONENT_SAMPLES: usize = 24;
pub const LEAF_ROLLOUTS: usize = 4;

/// checkpoint format
pub const FORMAT_VERSION: u32 = 2;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// cooperative shutdown flag. the coordinator polls this
/// between merge cycles so it can drain workers and write
/// a final checkpoint before exiting.
static STOP: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(false);

pub fn interrupt() {
    STOP.store(true, std::sync::atomic::Ordering::SeqCst);
}
pub fn interrupted() -> bool {
    STOP.load(std::sync::atomic::Ordering::SeqCst)
}

/// initialize logging and flip the stop flag on ctrl-c
pub fn init() {
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.expect("watch for ctrl-c");
        println!();
        log::warn!("interrupt received, draining");
        interrupt();
    });
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}

/// derive a deterministic rng from a run seed and any hashable salt.
/// hashing yields reproducible sampling across resume boundaries,
/// since the stream depends only on (seed, salt), never on call order.
pub fn rng<H: std::hash::Hash>(seed: u64, salt: H) -> rand::rngs::SmallRng {
    use rand::SeedableRng;
    use std::hash::Hasher;
    let ref mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::hash::Hash::hash(&seed, hasher);
    std::hash::Hash::hash(&salt, hasher);
    rand::rngs::SmallRng::seed_from_u64(hasher.finish())
}

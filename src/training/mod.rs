pub mod chunk;
pub mod config;
pub mod coordinator;
pub mod instance;
pub mod progress;
pub mod schedule;
pub mod worker;

pub use config::Horizon;
pub use config::TrainConfig;
pub use coordinator::Coordinator;
pub use coordinator::Outcome;
pub use schedule::partition;

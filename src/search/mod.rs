pub mod config;
pub mod leaf;
pub mod solver;
pub mod spot;
pub mod telemetry;

pub use config::LeafPolicy;
pub use config::SearchConfig;
pub use solver::Resolution;
pub use solver::Resolver;
pub use spot::Spot;
pub use telemetry::Aggregate;
pub use telemetry::Telemetry;

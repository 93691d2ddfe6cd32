pub mod config;
pub mod equity;
pub mod menu;
pub mod model;
pub mod observation;

pub use config::BucketConfig;
pub use menu::menu;
pub use model::Model;
pub use observation::Observation;

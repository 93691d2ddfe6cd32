use super::config::TrainConfig;
use super::coordinator::Coordinator;
use super::coordinator::Outcome;
use crate::abstraction::Model;
use crate::error::Error;
use std::sync::Arc;

/// the outer supervisor for chunked (and plain) training.
/// each chunk builds a fresh coordinator, runs it to the
/// chunk boundary, and drops every piece of per-chunk state
/// before relaunching from the checkpoint it just wrote.
/// long runs on memory-constrained hosts thus release their
/// working set at every chunk boundary.
pub fn supervise(config: TrainConfig, model: Arc<Model>, instance: usize) -> Result<(), Error> {
    config.validate()?;
    let mut config = config;
    loop {
        let outcome = {
            let mut coordinator = Coordinator::new(config.clone(), model.clone(), instance)?;
            coordinator.run()?
        }; // coordinator, workers, and the chunk's store drop here
        match outcome {
            Outcome::Finished => {
                log::info!("instance {} finished", instance);
                return Ok(());
            }
            Outcome::Interrupted => {
                log::info!("instance {} interrupted", instance);
                return Ok(());
            }
            Outcome::ChunkComplete => {
                log::info!("instance {} chunk complete, relaunching", instance);
                config.resume_from = Some(config.workspace.clone());
                continue;
            }
        }
    }
}

use super::chunk::supervise;
use super::config::TrainConfig;
use super::schedule::partition;
use crate::abstraction::Model;
use crate::error::Error;
use std::sync::Arc;

/// run the configured number of independent training
/// instances. each owns a full coordinator lineage in its
/// own workspace subdirectory; only the read-only abstraction
/// is shared. iteration horizons are partitioned up front;
/// wall-clock horizons are granted whole to every instance.
pub fn run(config: TrainConfig, model: Arc<Model>) -> Result<(), Error> {
    config.validate()?;
    if config.num_instances == 1 {
        return supervise(config, model, 0);
    }
    let shares = match config.num_iterations {
        Some(total) => partition(total, config.num_instances),
        None => vec![0; config.num_instances],
    };
    let handles = shares
        .into_iter()
        .enumerate()
        .map(|(instance, share)| {
            let mut config = config.clone();
            config.workspace = config.workspace.join(format!("instance-{}", instance));
            if config.num_iterations.is_some() {
                config.num_iterations = Some(share);
            }
            let model = model.clone();
            std::thread::Builder::new()
                .name(format!("instance-{}", instance))
                .spawn(move || supervise(config, model, instance))
                .expect("spawn instance")
        })
        .collect::<Vec<_>>();
    let mut first_error = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(error)) => first_error = first_error.or(Some(error)),
            Err(_) => {
                first_error =
                    first_error.or(Some(Error::WorkerFailure("instance panicked".into())))
            }
        }
    }
    match first_error {
        None => Ok(()),
        Some(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abstraction::BucketConfig;
    use crate::save;

    #[test]
    fn instances_keep_disjoint_lineages() {
        let workspace = std::env::temp_dir()
            .join("riverbot-instance-tests")
            .join("disjoint");
        let _ = std::fs::remove_dir_all(&workspace);
        let model = Arc::new(Model::seeded(BucketConfig {
            k_pref: 4,
            k_flop: 4,
            k_turn: 4,
            k_rive: 4,
            ..BucketConfig::default()
        }));
        let config = TrainConfig {
            num_iterations: Some(32),
            num_workers: 1,
            num_instances: 2,
            batch_size: 8,
            checkpoint_interval: 16,
            discount_interval: 32,
            workspace: workspace.clone(),
            ..TrainConfig::default()
        };
        run(config, model).unwrap();
        assert!(save::latest(&workspace.join("instance-0")).is_some());
        assert!(save::latest(&workspace.join("instance-1")).is_some());
    }
}

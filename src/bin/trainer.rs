//! Blueprint trainer.
//!
//! Builds or loads the bucket abstraction, then drives the
//! training coordinator (chunked or plain, one instance or
//! several) until the configured horizon. Configuration is
//! constructed here; external loaders can deserialize a
//! TrainConfig and call the same entry point.

use riverbot::abstraction::BucketConfig;
use riverbot::abstraction::Model;
use riverbot::training::instance;
use riverbot::training::TrainConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    riverbot::init();
    let model = match std::env::var("BUCKET_MODEL") {
        Ok(path) => match Model::load(std::path::Path::new(&path)) {
            Ok(model) => model,
            Err(error) => {
                log::error!("{}", error);
                std::process::exit(error.code());
            }
        },
        Err(_) => Model::seeded(BucketConfig::default()),
    };
    log::info!("abstraction {}", model);
    let config = TrainConfig::default();
    if let Err(error) = config.validate() {
        log::error!("{}", error);
        std::process::exit(error.code());
    }
    match tokio::task::spawn_blocking(move || instance::run(config, Arc::new(model))).await {
        Ok(Ok(())) => log::info!("training complete"),
        Ok(Err(error)) => {
            log::error!("{}", error);
            std::process::exit(error.code());
        }
        Err(join) => {
            log::error!("trainer panicked: {}", join);
            std::process::exit(1);
        }
    }
}

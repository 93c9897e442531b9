use std::io;

use thiserror::Error;

use crate::engine_error::EngineError;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("failed to build SQHeaven image: {0}")]
    BuildFailed(String),

    #[error("failed to start SQHeaven container: {0}")]
    StartFailed(String),

    #[error("PostgreSQL did not become ready after {attempts} attempts")]
    ReadinessTimeout { attempts: u32 },

    #[error("failed to stop SQHeaven container: {0}")]
    StopFailed(String),

    #[error("failed to enter compose directory")]
    Workdir(#[source] io::Error),
}

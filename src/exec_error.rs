use std::io;

use thiserror::Error;

use crate::engine_error::EngineError;
use crate::invalid_command_error::InvalidCommandError;

/// Failures that prevent a command from being run at all. A command that runs
/// and exits non-zero is not an `ExecError`; its error text is returned as
/// ordinary output instead.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("SQHeaven container is not running")]
    ContainerNotRunning,

    #[error(transparent)]
    InvalidCommand(#[from] InvalidCommandError),

    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
}

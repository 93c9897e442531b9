use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine's info query failed. This does not tell an engine that is
    /// not installed apart from a daemon that is down.
    #[error("container engine is not running or unavailable")]
    Unreachable,

    #[error("failed to launch `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("no compose program configured")]
    NoCompose,

    /// The container listing itself failed, as opposed to finding nothing.
    #[error("failed to list containers: {stderr}")]
    ListFailed { stderr: String },
}

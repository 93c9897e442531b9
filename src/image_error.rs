use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImageError {
    #[error("SQHeaven container is not running")]
    ContainerNotRunning,

    #[error("unexpected SQHeaven image detected: {0}")]
    UntrustedImage(String),
}

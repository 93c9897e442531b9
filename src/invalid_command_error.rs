use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum InvalidCommandError {
    #[error("empty command")]
    Empty,
}

use thiserror::Error;

use crate::engine_error::EngineError;
use crate::image_error::ImageError;

#[derive(Error, Debug)]
pub enum StatusError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Image(#[from] ImageError),
}

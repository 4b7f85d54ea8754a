use crate::document::{DocumentError, EditError};
use crate::overlay::{DetectError, StampError};
use crate::raster::RasterError;
use crate::session::SessionError;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Detect(#[from] DetectError),
    #[error(transparent)]
    Stamp(#[from] StampError),
}

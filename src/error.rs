//! Puzzle error types

#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    /// Rejected before any piece is created
    #[error("invalid puzzle configuration: {0}")]
    InvalidConfiguration(String),
    /// Pixel data was needed before the image finished loading
    #[error("puzzle image is not loaded yet")]
    AssetNotReady,
    /// Decode or encode failure in the native harness
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PuzzleResult<T> = Result<T, PuzzleError>;

impl PuzzleError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        PuzzleError::InvalidConfiguration(msg.into())
    }
}

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RetouchError {
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid aspect ratio: {0}")]
    InvalidAspectRatio(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No crop selection to edit")]
    NoSelection,

    #[error("Expansion rectangle is unchanged")]
    NothingToExpand,

    #[error("Invalid upscale factor: {0}")]
    InvalidUpscaleFactor(u32),

    #[error("Another operation is already pending: {0}")]
    OperationPending(String),
}

pub type Result<T> = std::result::Result<T, RetouchError>;

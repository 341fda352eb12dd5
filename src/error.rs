//! Error types of the batching core.

use crate::context::BufferId;
use thiserror::Error;

/// Failure reported by a [`GraphicsDevice`](crate::context::GraphicsDevice).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device could not allocate a new buffer object.
    #[error("Out of device memory")]
    OutOfMemory,
    /// The buffer id does not name a live buffer on this device.
    #[error("Invalid buffer {0:?}")]
    InvalidBuffer(BufferId),
    /// The device refused the data of an upload.
    #[error("Upload rejected: {0}")]
    UploadRejected(String),
}

/// Error type of the batching core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An argument was outside of its valid domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// A device resource could not be acquired.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
    /// The device rejected an upload; the buffer keeps its previous contents.
    #[error("Failed to upload {bytes} bytes: {reason}")]
    UploadFailed {
        /// Size of the rejected payload.
        bytes: usize,
        /// Device-provided reason.
        reason: String,
    },
    /// The buffer handle was already released.
    #[error("Buffer used after release")]
    Released,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

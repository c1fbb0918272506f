#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Partitioning of uploaded frames into tasks.
pub mod batching;

/// Upload settings.
pub mod config;

/// KITTI labels to cuboid annotations.
pub mod cuboid;

/// Error types for the upload pipeline.
pub mod error;

/// Bound on the number of concurrent remote operations and early abort.
pub mod limiter;

/// The three phase scene upload.
pub mod scene_uploader;

/// Task creation strategies and job polling.
pub mod task_creation;

pub use config::{SceneUploaderConfig, SceneUploaderInput, UploadKind};
pub use error::UploadError;
pub use limiter::{AbortFlag, ConcurrencyLimit};
pub use scene_uploader::{SceneUploader, UploadSummary};
pub use task_creation::{TaskCreation, TaskCreationStrategy};

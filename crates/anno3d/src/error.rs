use std::time::Duration;

use anno3d_annofab::AnnofabError;
use anno3d_kitti::KittiError;

/// Error types for the upload pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Reading or decoding local scene files failed.
    #[error(transparent)]
    Kitti(#[from] KittiError),

    /// A remote call failed.
    #[error(transparent)]
    Annofab(#[from] AnnofabError),

    /// Error handling local temporary files.
    #[error("Temporary file error. {0}")]
    Io(#[from] std::io::Error),

    /// The task generation job ended in the failed state.
    #[error("Job {job_id} failed: {detail}")]
    JobFailed {
        /// The job id.
        job_id: String,
        /// The remote failure detail, as JSON.
        detail: String,
    },

    /// The job could no longer be found while waiting for it.
    #[error("Job {0} could not be found while waiting for it")]
    JobNotFound(String),

    /// The job was still in progress when the poll timeout expired.
    #[error("Job {job_id} still in progress after {elapsed:?}")]
    JobTimeout {
        /// The job id.
        job_id: String,
        /// Time spent waiting.
        elapsed: Duration,
    },

    /// The project has no label definitions to map object types to.
    #[error("Project {0} has no labels in its annotation specs")]
    MissingLabelSpecs(String),

    /// The upload settings are inconsistent.
    #[error("Invalid upload settings: {0}")]
    InvalidInput(String),

    /// The unit of work was skipped because another one failed first.
    #[error("Skipped after an earlier failure")]
    Aborted,

    /// A blocking worker panicked or was cancelled.
    #[error("Worker failed. {0}")]
    Join(#[from] tokio::task::JoinError),
}

use std::path::PathBuf;

/// Error types for the Annofab module.
#[derive(Debug, thiserror::Error)]
pub enum AnnofabError {
    /// The request could not be sent or its response could not be read.
    #[error("HTTP request failed. {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an unsuccessful status code.
    #[error("{method} {url} returned {status}: {body}")]
    Status {
        /// The HTTP method of the request.
        method: String,
        /// The requested URL.
        url: String,
        /// The response status code.
        status: u16,
        /// The response body, as returned by the server.
        body: String,
    },

    /// The endpoint or an upload URL is not a valid base URL.
    #[error("Invalid URL {0}")]
    InvalidEndpoint(String),

    /// Error reading a file to upload.
    #[error("Failed to read {0}. {1}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Error encoding or decoding JSON.
    #[error("Invalid JSON. {0}")]
    Json(#[from] serde_json::Error),

    /// The record already exists and overwriting was not requested.
    #[error("{kind} {id} already exists, pass force to overwrite it")]
    AlreadyExists {
        /// What kind of record, e.g. `input data`.
        kind: &'static str,
        /// The id of the record.
        id: String,
    },
}

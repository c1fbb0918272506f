#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Blocking HTTP client for the Annofab web API.
pub mod client;

/// Content type guessing for uploaded files.
pub mod content_type;

/// Error types for the Annofab module.
pub mod error;

/// Request and response bodies of the Annofab web API.
pub mod model;

/// The remote operations the upload pipeline relies on.
pub mod service;

/// Input data and supplementary data uploader.
pub mod uploader;

pub use client::{AnnofabClient, Credential, DEFAULT_ENDPOINT};
pub use error::AnnofabError;
pub use service::AnnotationService;
pub use uploader::Uploader;

#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// KITTI calibration file reader.
pub mod calib;

/// Error types for the KITTI module.
pub mod error;

/// Per-frame file path bundles and loaders.
pub mod file_paths;

/// Camera horizontal field of view resolution.
pub mod fov;

/// KITTI object label reader.
pub mod label;

/// Supplementary metadata artifacts uploaded next to each frame.
pub mod meta;

/// Scene manifest (`scene.meta`) decoding.
pub mod scene;

/// Coordinate transforms from the camera frame into the lidar frame.
pub mod transforms;

pub use calib::{read_calibration, Calibration};
pub use error::KittiError;
pub use file_paths::{FilePaths, FilePathsLoader, FrameKey, FrameKind, ImagePaths, LabelPaths};
pub use fov::CameraHorizontalFovKind;
pub use label::{read_labels, read_labels_or_empty, KittiLabel};
pub use meta::{SupplementaryData, SupplementaryKind, SupplementaryOptions};
pub use scene::{load_scene, SceneManifest};
pub use transforms::transform_labels_into_lidar;

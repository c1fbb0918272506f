use std::path::{Path, PathBuf};

use crate::{
    error::KittiError,
    scene::{defaults, CameraViewSettings},
};

/// Data split of a raw KITTI object dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// The `training` split.
    Training,
    /// The `testing` split.
    Testing,
}

impl FrameKind {
    /// Directory name of the split.
    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Training => "training",
            FrameKind::Testing => "testing",
        }
    }
}

impl std::str::FromStr for FrameKind {
    type Err = KittiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "training" => Ok(FrameKind::Training),
            "testing" => Ok(FrameKind::Testing),
            _ => Err(KittiError::ConfigurationError(format!(
                "unknown frame kind {s}, expected training or testing"
            ))),
        }
    }
}

/// Identifies a frame, optionally inside a dataset split.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameKey {
    /// The split the frame belongs to, if any.
    pub kind: Option<FrameKind>,
    /// The frame id, e.g. `000042`.
    pub id: String,
}

/// Files of one camera image of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePaths {
    /// The image file.
    pub image: PathBuf,
    /// The calibration of the camera, if any.
    pub calib: Option<PathBuf>,
    /// Explicit camera placement, if any.
    pub camera_settings: Option<CameraViewSettings>,
}

/// Files of one ground truth label series of a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPaths {
    /// The KITTI label file.
    pub label: PathBuf,
    /// The image the labels were made on.
    pub image: PathBuf,
    /// The calibration the labels are expressed in.
    pub calib: PathBuf,
}

/// All files belonging to one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePaths {
    /// The frame key.
    pub key: FrameKey,
    /// The point cloud file.
    pub pcd: PathBuf,
    /// Camera images, in series order.
    pub images: Vec<ImagePaths>,
    /// Ground truth labels, in series order.
    pub labels: Vec<LabelPaths>,
}

/// Loads frames from a raw KITTI object dataset.
///
/// Point clouds, images and calibrations may live under different roots, each
/// laid out as `[split/]velodyne`, `[split/]image_2` and `[split/]calib`.
#[derive(Debug, Clone)]
pub struct FilePathsLoader {
    pcd_root: PathBuf,
    image_root: PathBuf,
    calib_root: PathBuf,
}

impl FilePathsLoader {
    /// Create a loader for the given roots.
    pub fn new(
        pcd_root: impl Into<PathBuf>,
        image_root: impl Into<PathBuf>,
        calib_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pcd_root: pcd_root.into(),
            image_root: image_root.into(),
            calib_root: calib_root.into(),
        }
    }

    /// List the frames of a split, sorted by frame id.
    ///
    /// Each frame gets one image with its calibration and no labels.
    pub fn load(&self, kind: Option<FrameKind>) -> Result<Vec<FilePaths>, KittiError> {
        let split_dir = |root: &Path, name: &str| match kind {
            Some(kind) => root.join(kind.as_str()).join(name),
            None => root.join(name),
        };
        let pcd_dir = split_dir(&self.pcd_root, defaults::VELODYNE_DIR);
        let image_dir = split_dir(&self.image_root, defaults::IMAGE_DIR);
        let calib_dir = split_dir(&self.calib_root, defaults::CALIB_DIR);

        let entries = walkdir::WalkDir::new(&pcd_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| KittiError::Io(pcd_dir.clone(), e.into()))?;

        let mut frame_ids = entries
            .iter()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy();
                name.strip_suffix(".bin").map(str::to_string)
            })
            .collect::<Vec<_>>();
        frame_ids.sort();

        log::debug!("found {} frames in {}", frame_ids.len(), pcd_dir.display());

        Ok(frame_ids
            .into_iter()
            .map(|frame_id| FilePaths {
                pcd: pcd_dir.join(format!("{frame_id}.bin")),
                images: vec![ImagePaths {
                    image: image_dir.join(format!("{frame_id}.{}", defaults::IMAGE_EXTENSION)),
                    calib: Some(calib_dir.join(format!("{frame_id}.txt"))),
                    camera_settings: None,
                }],
                labels: Vec::new(),
                key: FrameKey { kind, id: frame_id },
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_kind_from_str() -> Result<(), KittiError> {
        assert_eq!("training".parse::<FrameKind>()?, FrameKind::Training);
        assert_eq!("testing".parse::<FrameKind>()?, FrameKind::Testing);
        assert!("validation".parse::<FrameKind>().is_err());
        Ok(())
    }

    #[test]
    fn test_load_split() -> Result<(), Box<dyn std::error::Error>> {
        let root = tempfile::tempdir()?;
        let velodyne = root.path().join("training").join("velodyne");
        std::fs::create_dir_all(&velodyne)?;
        for id in ["000010", "000002", "000007"] {
            std::fs::write(velodyne.join(format!("{id}.bin")), [0u8; 16])?;
        }
        std::fs::write(velodyne.join("README"), b"")?;

        let images = tempfile::tempdir()?;
        let loader = FilePathsLoader::new(root.path(), images.path(), root.path());
        let frames = loader.load(Some(FrameKind::Training))?;

        let ids = frames.iter().map(|f| f.key.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["000002", "000007", "000010"]);

        let frame = &frames[0];
        assert_eq!(frame.key.kind, Some(FrameKind::Training));
        assert_eq!(frame.pcd, velodyne.join("000002.bin"));
        assert_eq!(frame.images.len(), 1);
        assert_eq!(
            frame.images[0].image,
            images.path().join("training/image_2/000002.png")
        );
        assert_eq!(
            frame.images[0].calib.as_deref(),
            Some(root.path().join("training/calib/000002.txt").as_path())
        );
        assert!(frame.labels.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_pcd_dir() {
        let loader = FilePathsLoader::new("/nonexistent", "/nonexistent", "/nonexistent");
        assert!(matches!(loader.load(None), Err(KittiError::Io(..))));
    }
}

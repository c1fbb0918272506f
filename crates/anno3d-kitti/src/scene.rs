use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    error::KittiError,
    file_paths::{FilePaths, FrameKey, ImagePaths, LabelPaths},
};

/// File name of the scene manifest inside a scene directory.
pub const SCENE_META_FILE: &str = "scene.meta";

/// Directory names assumed when a scene directory has no manifest.
pub mod defaults {
    /// Point cloud directory.
    pub const VELODYNE_DIR: &str = "velodyne";
    /// Camera image directory.
    pub const IMAGE_DIR: &str = "image_2";
    /// Calibration directory.
    pub const CALIB_DIR: &str = "calib";
    /// Ground truth label directory.
    pub const LABEL_DIR: &str = "label_2";
    /// Camera image file extension.
    pub const IMAGE_EXTENSION: &str = "png";
}

/// A 3D position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    /// x coordinate
    pub x: f64,
    /// y coordinate
    pub y: f64,
    /// z coordinate
    pub z: f64,
}

/// Explicit camera placement, overriding what is derived from the calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraViewSettings {
    /// Horizontal field of view in radians.
    pub fov: f64,
    /// Camera heading in radians, 0 being the lidar x axis.
    #[serde(default)]
    pub direction: Option<f64>,
    /// Camera position in the lidar frame.
    #[serde(default)]
    pub position: Option<Xyz>,
}

/// The point cloud series of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelodyneSeries {
    /// Directory holding `{id}.bin` point clouds.
    pub velodyne_dir: String,
}

/// A camera image series of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSeries {
    /// Directory holding `{id}.{file_extension}` images.
    pub image_dir: String,
    /// Directory holding `{id}.txt` calibrations, if any.
    #[serde(default)]
    pub calib_dir: Option<String>,
    /// Image file extension.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// Explicit camera placement.
    #[serde(default)]
    pub camera_view_setting: Option<CameraViewSettings>,
}

/// A ground truth label series of a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSeries {
    /// Directory holding `{id}.txt` KITTI labels.
    pub label_dir: String,
    /// Directory holding the images the labels refer to.
    pub image_dir: String,
    /// Directory holding the calibrations the labels are expressed in.
    pub calib_dir: String,
    /// Image file extension.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
}

fn default_file_extension() -> String {
    defaults::IMAGE_EXTENSION.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Series {
    #[serde(rename = "kitti_velodyne")]
    Velodyne(VelodyneSeries),
    #[serde(rename = "kitti_image")]
    Image(ImageSeries),
    #[serde(rename = "kitti_label")]
    Label(LabelSeries),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct JsonScene {
    id_list: Vec<String>,
    serieses: Vec<Series>,
}

/// A decoded scene manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneManifest {
    /// Frame ids, in upload order.
    pub id_list: Vec<String>,
    /// The point cloud series.
    pub velodyne: VelodyneSeries,
    /// Camera image series.
    pub images: Vec<ImageSeries>,
    /// Ground truth label series.
    pub labels: Vec<LabelSeries>,
}

impl SceneManifest {
    /// Decode a manifest from its JSON text.
    ///
    /// Series of unknown type are ignored. Fails with [`KittiError::ConfigurationError`]
    /// unless there is exactly one `kitti_velodyne` series.
    pub fn decode(json: &str) -> Result<Self, KittiError> {
        let scene: JsonScene = serde_json::from_str(json)?;

        let mut velodynes = Vec::new();
        let mut images = Vec::new();
        let mut labels = Vec::new();
        for series in scene.serieses {
            match series {
                Series::Velodyne(s) => velodynes.push(s),
                Series::Image(s) => images.push(s),
                Series::Label(s) => labels.push(s),
                Series::Unknown => log::debug!("ignoring series of unknown type"),
            }
        }

        let velodyne = match velodynes.len() {
            0 => {
                return Err(KittiError::ConfigurationError(
                    "scene has no kitti_velodyne series".to_string(),
                ))
            }
            1 => velodynes.remove(0),
            n => {
                return Err(KittiError::ConfigurationError(format!(
                    "scene has {} kitti_velodyne series, expected exactly one",
                    n
                )))
            }
        };

        Ok(SceneManifest {
            id_list: scene.id_list,
            velodyne,
            images,
            labels,
        })
    }

    /// Read and decode a manifest file.
    pub fn decode_path(path: impl AsRef<Path>) -> Result<Self, KittiError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(KittiError::io(path))?;
        Self::decode(&json)
    }

    /// Build the manifest of a KITTI directory without `scene.meta`.
    ///
    /// The frame ids are the sorted stems of the images found in `image_2`.
    pub fn default_scene(scene_dir: impl AsRef<Path>) -> Result<Self, KittiError> {
        let image_dir = scene_dir.as_ref().join(defaults::IMAGE_DIR);

        let entries = walkdir::WalkDir::new(&image_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| KittiError::Io(image_dir.clone(), e.into()))?;

        let mut id_list = entries
            .iter()
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry
                        .path()
                        .extension()
                        .map(|ext| ext == defaults::IMAGE_EXTENSION)
                        .unwrap_or(false)
            })
            .filter_map(|entry| {
                entry
                    .path()
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().to_string())
            })
            .collect::<Vec<_>>();
        id_list.sort();

        Ok(SceneManifest {
            id_list,
            velodyne: VelodyneSeries {
                velodyne_dir: defaults::VELODYNE_DIR.to_string(),
            },
            images: vec![ImageSeries {
                image_dir: defaults::IMAGE_DIR.to_string(),
                calib_dir: Some(defaults::CALIB_DIR.to_string()),
                file_extension: default_file_extension(),
                camera_view_setting: None,
            }],
            labels: vec![LabelSeries {
                label_dir: defaults::LABEL_DIR.to_string(),
                image_dir: defaults::IMAGE_DIR.to_string(),
                calib_dir: defaults::CALIB_DIR.to_string(),
                file_extension: default_file_extension(),
            }],
        })
    }

    /// Materialize the per-frame file paths, in `id_list` order.
    ///
    /// Relative series directories are resolved against `scene_dir`.
    pub fn file_paths(&self, scene_dir: &Path) -> Vec<FilePaths> {
        self.id_list
            .iter()
            .map(|frame_id| self.frame_paths(scene_dir, frame_id))
            .collect()
    }

    fn frame_paths(&self, scene_dir: &Path, frame_id: &str) -> FilePaths {
        let images = self
            .images
            .iter()
            .map(|image| ImagePaths {
                image: scene_dir
                    .join(&image.image_dir)
                    .join(format!("{}.{}", frame_id, image.file_extension)),
                calib: image
                    .calib_dir
                    .as_ref()
                    .map(|dir| scene_dir.join(dir).join(format!("{}.txt", frame_id))),
                camera_settings: image.camera_view_setting.clone(),
            })
            .collect();

        let labels = self
            .labels
            .iter()
            .map(|label| LabelPaths {
                label: scene_dir
                    .join(&label.label_dir)
                    .join(format!("{}.txt", frame_id)),
                image: scene_dir
                    .join(&label.image_dir)
                    .join(format!("{}.{}", frame_id, label.file_extension)),
                calib: scene_dir
                    .join(&label.calib_dir)
                    .join(format!("{}.txt", frame_id)),
            })
            .collect();

        FilePaths {
            key: FrameKey {
                kind: None,
                id: frame_id.to_string(),
            },
            pcd: scene_dir
                .join(&self.velodyne.velodyne_dir)
                .join(format!("{}.bin", frame_id)),
            images,
            labels,
        }
    }
}

/// Resolve a scene path into its manifest and per-frame file paths.
///
/// # Arguments
///
/// * `scene_path` - One of:
///   - the path of a `scene.meta` file,
///   - a directory containing `scene.meta`,
///   - a KITTI directory with `velodyne`, `image_2`, `calib` and `label_2`.
///
/// # Returns
///
/// The manifest together with one [`FilePaths`] per frame, in manifest order.
pub fn load_scene(scene_path: impl AsRef<Path>) -> Result<(SceneManifest, Vec<FilePaths>), KittiError> {
    let scene_path = scene_path.as_ref();
    let manifest_file: PathBuf = if scene_path.is_dir() {
        scene_path.join(SCENE_META_FILE)
    } else {
        scene_path.to_path_buf()
    };

    let (manifest, scene_dir) = if manifest_file.is_file() {
        let scene_dir = manifest_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        log::info!("reading scene manifest {}", manifest_file.display());
        (SceneManifest::decode_path(&manifest_file)?, scene_dir)
    } else {
        log::info!(
            "no {} found, reading {} as a KITTI directory",
            SCENE_META_FILE,
            scene_path.display()
        );
        (
            SceneManifest::default_scene(scene_path)?,
            scene_path.to_path_buf(),
        )
    };

    let paths = manifest.file_paths(&scene_dir);
    Ok((manifest, paths))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE_JSON: &str = r#"{
  "id_list": [
    "006497",
    "012187"
  ],
  "serieses": [
    {
      "type": "kitti_velodyne",
      "velodyne_dir": "velodyne"
    },
    {
      "type": "kitti_image",
      "image_dir": "image_rf",
      "calib_dir": null,
      "camera_view_setting": {
        "fov": 1.57,
        "direction": 0.92,
        "position": {"x": -2.0, "y": -1.0, "z": 0.8}
      }
    },
    {
      "type": "kitti_image",
      "image_dir": "image_2",
      "calib_dir": "calib"
    },
    {
      "type": "kitti_label",
      "label_dir": "label_2",
      "image_dir": "image_2",
      "calib_dir": "calib"
    },
    {
      "type": "nuscenes_radar",
      "radar_dir": "radar"
    }
  ],
  "dummy": "value"
}"#;

    #[test]
    fn test_decode_scene() -> Result<(), KittiError> {
        let scene = SceneManifest::decode(SCENE_JSON)?;
        assert_eq!(scene.id_list, vec!["006497", "012187"]);
        assert_eq!(scene.velodyne.velodyne_dir, "velodyne");
        assert_eq!(scene.images.len(), 2);
        assert_eq!(scene.labels.len(), 1);

        let image1 = &scene.images[0];
        assert_eq!(image1.image_dir, "image_rf");
        assert_eq!(image1.calib_dir, None);
        assert_eq!(image1.file_extension, "png");
        let settings = image1.camera_view_setting.as_ref().expect("settings");
        assert_eq!(settings.fov, 1.57);
        assert_eq!(settings.direction, Some(0.92));
        assert_eq!(settings.position, Some(Xyz { x: -2.0, y: -1.0, z: 0.8 }));

        let image2 = &scene.images[1];
        assert_eq!(image2.image_dir, "image_2");
        assert_eq!(image2.calib_dir.as_deref(), Some("calib"));
        assert_eq!(image2.camera_view_setting, None);

        let label = &scene.labels[0];
        assert_eq!(label.label_dir, "label_2");
        assert_eq!(label.image_dir, "image_2");
        assert_eq!(label.calib_dir, "calib");
        Ok(())
    }

    #[test]
    fn test_missing_velodyne_is_fatal() {
        let json = r#"{"id_list": ["0"], "serieses": [{"type": "kitti_image", "image_dir": "image_2"}]}"#;
        let err = SceneManifest::decode(json).unwrap_err();
        assert!(matches!(err, KittiError::ConfigurationError(_)));
    }

    #[test]
    fn test_duplicated_velodyne_is_fatal() {
        let json = r#"{"id_list": [], "serieses": [
            {"type": "kitti_velodyne", "velodyne_dir": "a"},
            {"type": "kitti_velodyne", "velodyne_dir": "b"}
        ]}"#;
        let err = SceneManifest::decode(json).unwrap_err();
        assert!(matches!(err, KittiError::ConfigurationError(_)));
    }

    #[test]
    fn test_file_paths_templates() -> Result<(), KittiError> {
        let scene = SceneManifest::decode(SCENE_JSON)?;
        let paths = scene.file_paths(Path::new("/data/scene"));
        assert_eq!(paths.len(), 2);

        let frame = &paths[1];
        assert_eq!(frame.key.id, "012187");
        assert_eq!(frame.key.kind, None);
        assert_eq!(frame.pcd, Path::new("/data/scene/velodyne/012187.bin"));
        assert_eq!(frame.images[0].image, Path::new("/data/scene/image_rf/012187.png"));
        assert_eq!(frame.images[0].calib, None);
        assert!(frame.images[0].camera_settings.is_some());
        assert_eq!(
            frame.images[1].calib.as_deref(),
            Some(Path::new("/data/scene/calib/012187.txt"))
        );
        assert_eq!(frame.labels[0].label, Path::new("/data/scene/label_2/012187.txt"));
        assert_eq!(frame.labels[0].image, Path::new("/data/scene/image_2/012187.png"));
        assert_eq!(frame.labels[0].calib, Path::new("/data/scene/calib/012187.txt"));
        Ok(())
    }

    #[test]
    fn test_absolute_series_dir_is_kept() -> Result<(), KittiError> {
        let json = r#"{"id_list": ["7"], "serieses": [{"type": "kitti_velodyne", "velodyne_dir": "/mnt/velo"}]}"#;
        let paths = SceneManifest::decode(json)?.file_paths(Path::new("/data/scene"));
        assert_eq!(paths[0].pcd, Path::new("/mnt/velo/7.bin"));
        Ok(())
    }

    #[test]
    fn test_load_scene_resolution() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let image_dir = dir.path().join(defaults::IMAGE_DIR);
        std::fs::create_dir_all(&image_dir)?;
        for id in ["000002", "000000", "000001"] {
            std::fs::write(image_dir.join(format!("{id}.png")), b"png")?;
        }
        std::fs::write(image_dir.join("notes.txt"), b"not an image")?;

        // no manifest: default layout
        let (scene, paths) = load_scene(dir.path())?;
        assert_eq!(scene.id_list, vec!["000000", "000001", "000002"]);
        assert_eq!(paths[0].pcd, dir.path().join("velodyne/000000.bin"));
        assert_eq!(paths[2].labels[0].label, dir.path().join("label_2/000002.txt"));

        // manifest inside the directory
        let json = r#"{"id_list": ["b", "a"], "serieses": [{"type": "kitti_velodyne", "velodyne_dir": "points"}]}"#;
        std::fs::write(dir.path().join(SCENE_META_FILE), json)?;
        let (scene, paths) = load_scene(dir.path())?;
        assert_eq!(scene.id_list, vec!["b", "a"]);
        assert_eq!(paths[0].pcd, dir.path().join("points/b.bin"));
        assert!(paths[0].images.is_empty());

        // explicit manifest path
        let (_, paths) = load_scene(dir.path().join(SCENE_META_FILE))?;
        assert_eq!(paths[1].pcd, dir.path().join("points/a.bin"));
        Ok(())
    }
}

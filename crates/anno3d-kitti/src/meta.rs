use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    calib::{read_calibration, Calibration},
    error::KittiError,
    file_paths::{FilePaths, ImagePaths},
    fov::{camera_horizontal_fov, CameraHorizontalFovKind},
    transforms::yaw_to_direction,
};

/// Mounting height of the KITTI velodyne in meters.
pub const DEFAULT_SENSOR_HEIGHT: f64 = 1.73;

/// Mounting height of the KITTI color cameras in meters.
pub const DEFAULT_CAMERA_HEIGHT: f64 = 1.65;

/// Vertical field of view of the KITTI color cameras in degrees.
pub const CAMERA_VERTICAL_FOV_DEGREES: f64 = 35.0;

/// Calibration kind understood by the point cloud editor.
pub const CALIB_KIND: &str = "kitti3dDetection";

/// Id of the frame metadata of an input data.
pub fn frame_meta_id(input_data_id: &str) -> String {
    format!("{input_data_id}.meta")
}

/// Id of the `number`-th camera image of an input data.
pub fn camera_image_id(input_data_id: &str, number: usize) -> String {
    format!("{input_data_id}.camera_{number}")
}

/// Id of the metadata of the `number`-th camera image of an input data.
pub fn camera_image_calib_id(input_data_id: &str, number: usize) -> String {
    format!("{}.calib", camera_image_id(input_data_id, number))
}

/// Input data id of a frame: `{prefix}_{frame_id}`, or the bare frame id without prefix.
pub fn input_data_id(prefix: &str, frame_id: &str) -> String {
    if prefix.is_empty() {
        frame_id.to_string()
    } else {
        format!("{prefix}_{frame_id}")
    }
}

/// A 3D vector as written into the metadata files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
    /// z component
    pub z: f64,
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Vector3 {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}

/// Point cloud part of the frame metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointCloudMetaData {
    /// Whether the point cloud uses a right handed coordinate system.
    pub is_right_hand_system: bool,
    /// The up direction of the point cloud.
    pub up_vector: Vector3,
    /// Mounting height of the lidar in meters.
    pub sensor_height: f64,
}

/// Image part of the frame metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagesMetaData {
    /// Number of camera images attached to the frame.
    pub image_count: usize,
    /// Calibration kind of the images.
    pub calib_kind: String,
}

/// Metadata attached to every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameMetaData {
    /// Point cloud metadata.
    pub points: PointCloudMetaData,
    /// Image metadata.
    pub images: ImagesMetaData,
}

impl FrameMetaData {
    /// Frame metadata for a KITTI frame with `image_count` images.
    pub fn new(image_count: usize, sensor_height: Option<f64>) -> Self {
        FrameMetaData {
            points: PointCloudMetaData {
                is_right_hand_system: true,
                up_vector: Vector3 { x: 0.0, y: 0.0, z: 1.0 },
                sensor_height: sensor_height.unwrap_or(DEFAULT_SENSOR_HEIGHT),
            },
            images: ImagesMetaData {
                image_count,
                calib_kind: CALIB_KIND.to_string(),
            },
        }
    }
}

/// Calibration matrices as written into the image metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KittiCalibMeta {
    /// 3x4 projection matrix, row-major.
    pub camera_matrix: Vec<f64>,
    /// 3x3 rectifying rotation, row-major.
    pub r0_matrix: Vec<f64>,
    /// 3x4 velodyne to camera transform, row-major.
    pub velo_cam_matrix: Vec<f64>,
    /// Calibration kind.
    pub kind: String,
}

impl From<&Calibration> for KittiCalibMeta {
    fn from(calib: &Calibration) -> Self {
        KittiCalibMeta {
            camera_matrix: calib.camera_matrix.to_vec(),
            r0_matrix: calib.r0_matrix.to_vec(),
            velo_cam_matrix: calib.velo_cam_matrix.to_vec(),
            kind: CALIB_KIND.to_string(),
        }
    }
}

/// Camera field of view in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageCameraFov {
    /// Horizontal field of view.
    pub horizontal: f64,
    /// Vertical field of view.
    pub vertical: f64,
}

/// Camera placement in the lidar frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCamera {
    /// Unit viewing direction.
    pub direction: Vector3,
    /// Field of view.
    pub fov: ImageCameraFov,
    /// Camera position.
    pub camera_position: Vector3,
}

/// Metadata attached to every camera image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// The calibration of the camera, `null` if the image has none.
    pub calib: Option<KittiCalibMeta>,
    /// The camera placement.
    pub camera: ImageCamera,
}

/// Type of a supplementary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplementaryKind {
    /// Opaque binary.
    Custom,
    /// Image file.
    Image,
    /// Text file.
    Text,
}

impl SupplementaryKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplementaryKind::Custom => "custom",
            SupplementaryKind::Image => "image",
            SupplementaryKind::Text => "text",
        }
    }
}

/// A file to attach to an input data.
#[derive(Debug, Clone, PartialEq)]
pub struct SupplementaryData {
    /// Supplementary data id, also used as its name.
    pub data_id: String,
    /// The local file.
    pub path: PathBuf,
    /// The type of the file.
    pub kind: SupplementaryKind,
}

/// Options of the supplementary metadata generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SupplementaryOptions {
    /// Where the camera horizontal field of view comes from.
    pub camera_horizontal_fov: CameraHorizontalFovKind,
    /// Field of view in degrees used when nothing else is known.
    pub fallback_horizontal_fov: Option<f64>,
    /// Lidar mounting height, [`DEFAULT_SENSOR_HEIGHT`] if `None`.
    pub sensor_height: Option<f64>,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), KittiError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(KittiError::io(path))
}

/// Write the frame metadata of an input data into `dir`.
pub fn create_frame_meta(
    dir: &Path,
    input_data_id: &str,
    image_count: usize,
    sensor_height: Option<f64>,
) -> Result<SupplementaryData, KittiError> {
    let data_id = frame_meta_id(input_data_id);
    let path = dir.join(&data_id);
    write_json(&path, &FrameMetaData::new(image_count, sensor_height))?;

    Ok(SupplementaryData {
        data_id,
        path,
        kind: SupplementaryKind::Text,
    })
}

/// Build the metadata of a camera image.
///
/// The camera sits at the KITTI camera height relative to the lidar and looks
/// along the lidar x axis unless `camera_view_setting` says otherwise.
pub fn image_meta(paths: &ImagePaths, horizontal_fov: f64) -> Result<ImageMeta, KittiError> {
    let calib = paths
        .calib
        .as_ref()
        .map(read_calibration)
        .transpose()?
        .as_ref()
        .map(KittiCalibMeta::from);

    let mut camera_position = Vector3 {
        x: 0.0,
        y: 0.0,
        z: DEFAULT_CAMERA_HEIGHT - DEFAULT_SENSOR_HEIGHT,
    };
    let mut yaw = 0.0;
    if let Some(settings) = &paths.camera_settings {
        if let Some(position) = settings.position {
            camera_position = Vector3 {
                x: position.x,
                y: position.y,
                z: position.z,
            };
        }
        if let Some(direction) = settings.direction {
            yaw = direction;
        }
    }

    Ok(ImageMeta {
        calib,
        camera: ImageCamera {
            direction: yaw_to_direction(yaw).into(),
            fov: ImageCameraFov {
                horizontal: horizontal_fov,
                vertical: CAMERA_VERTICAL_FOV_DEGREES.to_radians(),
            },
            camera_position,
        },
    })
}

/// Write the metadata of the `number`-th camera image of an input data into `dir`.
pub fn create_image_meta(
    dir: &Path,
    input_data_id: &str,
    number: usize,
    paths: &ImagePaths,
    horizontal_fov: f64,
) -> Result<SupplementaryData, KittiError> {
    let data_id = camera_image_calib_id(input_data_id, number);
    let path = dir.join(&data_id);
    write_json(&path, &image_meta(paths, horizontal_fov)?)?;

    Ok(SupplementaryData {
        data_id,
        path,
        kind: SupplementaryKind::Text,
    })
}

/// Generate every supplementary data of a frame.
///
/// # Arguments
///
/// * `dir` - Directory the generated metadata files are written to.
/// * `input_data_id` - The input data the supplementaries belong to.
/// * `paths` - The files of the frame.
/// * `options` - Generation options.
///
/// # Returns
///
/// The supplementaries in upload order: `(image, image meta)` per camera in series
/// order, then the frame metadata.
pub fn generate_frame_supplementaries(
    dir: &Path,
    input_data_id: &str,
    paths: &FilePaths,
    options: &SupplementaryOptions,
) -> Result<Vec<SupplementaryData>, KittiError> {
    let mut supplementaries = Vec::with_capacity(paths.images.len() * 2 + 1);

    for (number, image) in paths.images.iter().enumerate() {
        let fov = camera_horizontal_fov(
            options.camera_horizontal_fov,
            image,
            options.fallback_horizontal_fov,
        )?;

        supplementaries.push(SupplementaryData {
            data_id: camera_image_id(input_data_id, number),
            path: image.image.clone(),
            kind: SupplementaryKind::Image,
        });
        supplementaries.push(create_image_meta(dir, input_data_id, number, image, fov)?);
    }

    supplementaries.push(create_frame_meta(
        dir,
        input_data_id,
        paths.images.len(),
        options.sensor_height,
    )?);

    Ok(supplementaries)
}

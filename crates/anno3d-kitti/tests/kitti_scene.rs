//! Reads the scene under `tests/data/scene` end to end: manifest, calibration,
//! labels and the transform into the lidar frame.

use std::path::{Path, PathBuf};

use anno3d_kitti::{
    fov::camera_horizontal_fov, load_scene, read_calibration, read_labels_or_empty,
    transform_labels_into_lidar, CameraHorizontalFovKind, KittiError,
};
use approx::assert_relative_eq;

fn scene_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/data/scene")
}

#[test]
fn load_fixture_scene() -> Result<(), KittiError> {
    let (scene, frames) = load_scene(scene_dir())?;
    assert_eq!(scene.id_list, vec!["000000", "000001"]);
    assert_eq!(frames.len(), 2);

    let frame = &frames[0];
    assert_eq!(frame.pcd, scene_dir().join("velodyne/000000.bin"));
    assert_eq!(frame.images.len(), 2);
    assert_eq!(frame.images[1].image, scene_dir().join("image_rear/000000.jpg"));
    assert_eq!(frame.images[1].calib, None);
    assert_eq!(frame.labels.len(), 1);
    Ok(())
}

#[test]
fn fixture_fov_resolution() -> Result<(), KittiError> {
    let (_, frames) = load_scene(scene_dir())?;
    let front = &frames[0].images[0];
    let rear = &frames[0].images[1];

    let front_fov = camera_horizontal_fov(CameraHorizontalFovKind::Settings, front, None)?;
    assert_relative_eq!(front_fov.to_degrees(), 80.38, epsilon = 1e-2);

    let rear_fov = camera_horizontal_fov(CameraHorizontalFovKind::Settings, rear, None)?;
    assert_relative_eq!(rear_fov, 1.2);

    let rear_fov = camera_horizontal_fov(CameraHorizontalFovKind::Calib, rear, None)?;
    assert_relative_eq!(rear_fov, std::f64::consts::FRAC_PI_2);
    Ok(())
}

#[test]
fn fixture_labels_into_lidar() -> Result<(), KittiError> {
    let (_, frames) = load_scene(scene_dir())?;

    let label_paths = &frames[0].labels[0];
    let calib = read_calibration(&label_paths.calib)?;
    let labels = read_labels_or_empty(&label_paths.label)?;
    assert_eq!(labels.len(), 2);

    let lidar = transform_labels_into_lidar(&labels, &calib);
    let car = &lidar[0];
    assert_eq!(car.label_type, "Car");
    assert_relative_eq!(car.x, 73.7192, epsilon = 1e-3);
    assert_relative_eq!(car.y, 2.0819, epsilon = 1e-3);
    assert_relative_eq!(car.z, -0.8737, epsilon = 1e-3);
    assert_relative_eq!(car.yaw, 1.60 - std::f64::consts::FRAC_PI_2, epsilon = 1e-9);

    let pedestrian = &lidar[1];
    assert_eq!(pedestrian.annotation_id.as_deref(), Some("ped-0001"));
    assert_relative_eq!(pedestrian.x, 27.7237, epsilon = 1e-3);
    assert_relative_eq!(pedestrian.y, 5.7058, epsilon = 1e-3);

    // the second frame has no label file
    let empty = read_labels_or_empty(&frames[1].labels[0].label)?;
    assert!(empty.is_empty());
    Ok(())
}

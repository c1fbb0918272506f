use std::f64::consts::PI;

use glam::{DMat3, DQuat, DVec3};

use crate::{calib::Calibration, label::KittiLabel};

/// Wrap an angle into the range `(-pi, pi]`.
///
/// Non-finite angles yield `NaN`.
///
/// Example:
///
/// ```
/// use anno3d_kitti::transforms::normalize_yaw;
///
/// let yaw = normalize_yaw(2.5 * std::f64::consts::PI);
/// assert!((yaw - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
pub fn normalize_yaw(yaw: f64) -> f64 {
    let wrapped = (yaw + PI).rem_euclid(2.0 * PI) - PI;
    // -pi belongs to the other end of the range
    if wrapped <= -PI {
        PI
    } else {
        wrapped
    }
}

/// Unit front vector of an object rotated by `yaw` around the z axis.
pub fn yaw_to_direction(yaw: f64) -> [f64; 3] {
    (DQuat::from_rotation_z(yaw) * DVec3::X).to_array()
}

/// Transform labels from the camera frame into the lidar (velodyne) frame.
///
/// # Arguments
///
/// * `labels` - Labels expressed in the camera frame of `calib`.
/// * `calib` - The calibration of the frame the labels belong to.
///
/// # Returns
///
/// The labels in the lidar frame with `position' = R^-1 * (position - t)` and
/// `yaw' = normalize(-yaw - pi / 2)`. All other fields are preserved.
///
/// PRECONDITION: the rotation part of `Tr_velo_to_cam` is invertible.
pub fn transform_labels_into_lidar(labels: &[KittiLabel], calib: &Calibration) -> Vec<KittiLabel> {
    // rows -> glam column-major matrix
    let rotation = DMat3::from_cols_array_2d(&calib.rotation()).transpose();
    let rotation_inv = rotation.inverse();
    let translation = DVec3::from_array(calib.translation());

    labels
        .iter()
        .map(|label| {
            let xyz = DVec3::new(label.x, label.y, label.z);
            let lidar_xyz = rotation_inv * (xyz - translation);

            KittiLabel {
                x: lidar_xyz.x,
                y: lidar_xyz.y,
                z: lidar_xyz.z,
                yaw: normalize_yaw(-label.yaw - PI / 2.0),
                ..label.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn identity_calibration() -> Calibration {
        Calibration {
            camera_matrix: [1000.0, 0.0, 500.0, 0.0, 0.0, 1000.0, 200.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            r0_matrix: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            velo_cam_matrix: [1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        }
    }

    fn car(x: f64, y: f64, z: f64, yaw: f64) -> KittiLabel {
        KittiLabel {
            label_type: "Car".to_string(),
            height: 1.5,
            width: 1.6,
            depth: 3.5,
            x,
            y,
            z,
            yaw,
            annotation_id: Some("car-1".to_string()),
        }
    }

    #[test]
    fn test_normalize_yaw_range() {
        let mut yaw: f64 = -20.0;
        while yaw < 20.0 {
            let normalized = normalize_yaw(yaw);
            assert!(normalized > -PI && normalized <= PI, "{yaw} -> {normalized}");
            assert_relative_eq!(normalized.sin(), yaw.sin(), epsilon = 1e-9);
            assert_relative_eq!(normalized.cos(), yaw.cos(), epsilon = 1e-9);
            yaw += 0.37;
        }
        assert_eq!(normalize_yaw(-PI), PI);
        assert_eq!(normalize_yaw(PI), PI);
        assert_relative_eq!(normalize_yaw(0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_normalize_huge_yaw() {
        for yaw in [1.0e17, -1.0e17, f64::MAX, f64::MIN] {
            let normalized = normalize_yaw(yaw);
            assert!(normalized > -PI && normalized <= PI, "{yaw} -> {normalized}");
        }
        assert!(normalize_yaw(f64::INFINITY).is_nan());
        assert!(normalize_yaw(f64::NAN).is_nan());
    }

    #[test]
    fn test_identity_calibration() {
        let labels = transform_labels_into_lidar(&[car(1.0, 2.0, 0.3, 0.0)], &identity_calibration());
        assert_eq!(labels.len(), 1);

        let label = &labels[0];
        assert_relative_eq!(label.x, 1.0);
        assert_relative_eq!(label.y, 2.0);
        assert_relative_eq!(label.z, 0.3);
        assert_relative_eq!(label.yaw, -PI / 2.0);
        assert_eq!(label.label_type, "Car");
        assert_eq!((label.height, label.width, label.depth), (1.5, 1.6, 3.5));
        assert_eq!(label.annotation_id.as_deref(), Some("car-1"));
    }

    #[test]
    fn test_kitti_axes_into_lidar() {
        // camera: x right, y down, z forward; lidar: x forward, y left, z up
        let mut calib = identity_calibration();
        calib.velo_cam_matrix = [0.0, -1.0, 0.0, 0.1, 0.0, 0.0, -1.0, 0.2, 1.0, 0.0, 0.0, 0.3];

        let labels = transform_labels_into_lidar(&[car(1.1, 2.2, 10.3, PI)], &calib);
        let label = &labels[0];

        // lidar = R^T * (camera - t)
        assert_relative_eq!(label.x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(label.y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(label.z, -2.0, epsilon = 1e-12);
        assert_relative_eq!(label.yaw, PI / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_yaw_to_direction() {
        let front = yaw_to_direction(0.0);
        assert_relative_eq!(front[0], 1.0);
        assert_relative_eq!(front[1], 0.0);
        assert_relative_eq!(front[2], 0.0);

        let left = yaw_to_direction(PI / 2.0);
        assert_relative_eq!(left[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(left[1], 1.0, epsilon = 1e-12);
        assert_relative_eq!(left[2], 0.0, epsilon = 1e-12);
    }
}

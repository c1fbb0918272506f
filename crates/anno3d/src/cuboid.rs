use std::collections::HashSet;

use anno3d_annofab::model::{
    CuboidAnnotationDetail, CuboidAnnotationDetailData, CuboidDirection, CuboidShape, Size, Xyz,
};
use anno3d_kitti::{
    read_calibration, read_labels_or_empty, transforms::yaw_to_direction,
    transform_labels_into_lidar, KittiError, KittiLabel, LabelPaths,
};

/// Annotations created for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameCuboids {
    /// The cuboids with a known label.
    pub details: Vec<CuboidAnnotationDetail>,
    /// Number of labels read, known or not.
    pub label_count: usize,
}

/// The cuboid of a label expressed in the lidar frame.
///
/// KITTI locations are bottom centers, the cuboid location is the box center.
pub fn label_to_shape(label: &KittiLabel) -> CuboidShape {
    CuboidShape {
        dimensions: Size {
            width: label.width,
            height: label.height,
            depth: label.depth,
        },
        location: Xyz {
            x: label.x,
            y: label.y,
            z: label.z + label.height / 2.0,
        },
        rotation: Xyz {
            x: 0.0,
            y: 0.0,
            z: label.yaw,
        },
        direction: CuboidDirection {
            front: yaw_to_direction(label.yaw).into(),
            up: Xyz {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        },
    }
}

/// Map lidar frame labels to cuboid annotations.
///
/// # Arguments
///
/// * `account_id` - The account creating the annotations.
/// * `label_ids` - Label ids defined in the project.
/// * `labels` - Labels in the lidar frame.
///
/// # Returns
///
/// One annotation per label whose type is a known label id, in input order. The
/// annotation id is the label's own id or a fresh UUID.
pub fn labels_to_cuboids(
    account_id: &str,
    label_ids: &HashSet<String>,
    labels: &[KittiLabel],
) -> Vec<CuboidAnnotationDetail> {
    labels
        .iter()
        .filter(|label| {
            let known = label_ids.contains(&label.label_type);
            if !known {
                log::warn!("dropping label of unknown type {}", label.label_type);
            }
            known
        })
        .map(|label| CuboidAnnotationDetail {
            annotation_id: label
                .annotation_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            account_id: account_id.to_string(),
            label_id: label.label_type.clone(),
            is_protected: false,
            data_holding_type: "inner".to_string(),
            data: CuboidAnnotationDetailData::new(label_to_shape(label)),
        })
        .collect()
}

/// Read, transform and map the ground truth labels of a frame.
///
/// A missing label file counts as a frame without labels.
pub fn frame_cuboids(
    account_id: &str,
    label_ids: &HashSet<String>,
    label_paths: &[LabelPaths],
) -> Result<FrameCuboids, KittiError> {
    let mut lidar_labels = Vec::new();
    for paths in label_paths {
        let labels = read_labels_or_empty(&paths.label)?;
        if labels.is_empty() {
            continue;
        }
        let calib = read_calibration(&paths.calib)?;
        lidar_labels.extend(transform_labels_into_lidar(&labels, &calib));
    }

    Ok(FrameCuboids {
        details: labels_to_cuboids(account_id, label_ids, &lidar_labels),
        label_count: lidar_labels.len(),
    })
}

use std::path::Path;

use crate::error::KittiError;

const P2_PREFIX: &str = "P2: ";
const R0_RECT_PREFIX: &str = "R0_rect: ";
const TR_VELO_TO_CAM_PREFIX: &str = "Tr_velo_to_cam: ";

/// Per-frame KITTI calibration.
///
/// Matrices are stored row-major, exactly as they appear in the calibration file.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// 3x4 projection matrix of the left color camera (`P2`).
    pub camera_matrix: [f64; 12],
    /// 3x3 rectifying rotation (`R0_rect`).
    pub r0_matrix: [f64; 9],
    /// 3x4 rigid transform from velodyne to camera coordinates (`Tr_velo_to_cam`).
    pub velo_cam_matrix: [f64; 12],
}

impl Calibration {
    /// The projection matrix as rows.
    pub fn projection(&self) -> [[f64; 4]; 3] {
        rows_3x4(&self.camera_matrix)
    }

    /// Rotation part of the velodyne to camera transform.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        let m = rows_3x4(&self.velo_cam_matrix);
        [
            [m[0][0], m[0][1], m[0][2]],
            [m[1][0], m[1][1], m[1][2]],
            [m[2][0], m[2][1], m[2][2]],
        ]
    }

    /// Translation part of the velodyne to camera transform.
    pub fn translation(&self) -> [f64; 3] {
        let m = rows_3x4(&self.velo_cam_matrix);
        [m[0][3], m[1][3], m[2][3]]
    }

    /// Horizontal field of view of the camera in radians, `2 * atan(cx / fx)`.
    pub fn camera_horizontal_fov(&self) -> f64 {
        let p = self.projection();
        (p[0][2] / p[0][0]).atan() * 2.0
    }
}

impl std::str::FromStr for Calibration {
    type Err = KittiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines = s.lines().collect::<Vec<_>>();

        Ok(Calibration {
            camera_matrix: parse_entry(&lines, P2_PREFIX)?,
            r0_matrix: parse_entry(&lines, R0_RECT_PREFIX)?,
            velo_cam_matrix: parse_entry(&lines, TR_VELO_TO_CAM_PREFIX)?,
        })
    }
}

/// Read a KITTI calibration file.
///
/// # Arguments
///
/// * `path` - The path to the calibration text file.
///
/// # Returns
///
/// The parsed [`Calibration`]. Fails with [`KittiError::ParseError`] if any of the
/// `P2`, `R0_rect` or `Tr_velo_to_cam` entries is missing or has the wrong length.
pub fn read_calibration(path: impl AsRef<Path>) -> Result<Calibration, KittiError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(KittiError::io(path))?;
    content.parse::<Calibration>().map_err(|e| match e {
        KittiError::ParseError(msg) => {
            KittiError::ParseError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Find the first line starting with `prefix` and parse exactly `N` floats after it.
fn parse_entry<const N: usize>(lines: &[&str], prefix: &str) -> Result<[f64; N], KittiError> {
    let key = prefix.trim_end_matches([':', ' ']);
    let line = lines
        .iter()
        .find_map(|line| line.strip_prefix(prefix))
        .ok_or_else(|| KittiError::ParseError(format!("missing calibration entry {key}")))?;

    let values = line
        .split_whitespace()
        .map(|s| {
            s.parse::<f64>()
                .map_err(|e| KittiError::ParseError(format!("{key}: {s}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let num_values = values.len();
    values.try_into().map_err(|_| {
        KittiError::ParseError(format!(
            "{}: expected {} values, got {}",
            key, N, num_values
        ))
    })
}

fn rows_3x4(m: &[f64; 12]) -> [[f64; 4]; 3] {
    [
        [m[0], m[1], m[2], m[3]],
        [m[4], m[5], m[6], m[7]],
        [m[8], m[9], m[10], m[11]],
    ]
}

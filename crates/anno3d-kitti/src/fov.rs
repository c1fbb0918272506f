use crate::{calib::read_calibration, error::KittiError, file_paths::ImagePaths};

/// Horizontal field of view assumed when nothing better is known, in degrees.
///
/// NOTE: the KITTI color cameras cover roughly 90 x 35 degrees.
pub const DEFAULT_FALLBACK_FOV_DEGREES: f64 = 90.0;

/// Where the horizontal field of view of a camera image is taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraHorizontalFovKind {
    /// Use `camera_view_setting.fov` when present, otherwise behave as [`Self::Calib`].
    #[default]
    Settings,
    /// Derive the field of view from the calibration file if the image has one,
    /// otherwise use the fallback.
    Calib,
}

impl std::str::FromStr for CameraHorizontalFovKind {
    type Err = KittiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settings" => Ok(CameraHorizontalFovKind::Settings),
            "calib" => Ok(CameraHorizontalFovKind::Calib),
            _ => Err(KittiError::ConfigurationError(format!(
                "unknown camera horizontal fov kind {s}, expected settings or calib"
            ))),
        }
    }
}

/// Resolve the horizontal field of view of a camera image in radians.
///
/// # Arguments
///
/// * `kind` - The resolution strategy.
/// * `paths` - The files of the camera image.
/// * `fallback_degrees` - The field of view used when neither source is available,
///   [`DEFAULT_FALLBACK_FOV_DEGREES`] if `None`.
///
/// # Returns
///
/// The field of view in radians. Fails if a calibration file is named but cannot be read.
pub fn camera_horizontal_fov(
    kind: CameraHorizontalFovKind,
    paths: &ImagePaths,
    fallback_degrees: Option<f64>,
) -> Result<f64, KittiError> {
    if kind == CameraHorizontalFovKind::Settings {
        if let Some(settings) = &paths.camera_settings {
            return Ok(settings.fov);
        }
    }

    match &paths.calib {
        Some(calib) => Ok(read_calibration(calib)?.camera_horizontal_fov()),
        None => Ok(fallback_degrees
            .unwrap_or(DEFAULT_FALLBACK_FOV_DEGREES)
            .to_radians()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::CameraViewSettings;
    use approx::assert_relative_eq;

    fn paths(calib: Option<std::path::PathBuf>, fov: Option<f64>) -> ImagePaths {
        ImagePaths {
            image: "image_2/000000.png".into(),
            calib,
            camera_settings: fov.map(|fov| CameraViewSettings {
                fov,
                direction: None,
                position: None,
            }),
        }
    }

    #[test]
    fn test_resolution_order() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let calib = dir.path().join("000000.txt");
        std::fs::write(
            &calib,
            "P2: 1000 0 1000 0 0 1000 200 0 0 0 1 0\nR0_rect: 1 0 0 0 1 0 0 0 1\nTr_velo_to_cam: 1 0 0 0 0 1 0 0 0 0 1 0\n",
        )?;

        let both = paths(Some(calib.clone()), Some(1.2));
        assert_eq!(camera_horizontal_fov(CameraHorizontalFovKind::Settings, &both, None)?, 1.2);
        assert_relative_eq!(
            camera_horizontal_fov(CameraHorizontalFovKind::Calib, &both, None)?,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );

        let calib_only = paths(Some(calib), None);
        assert_relative_eq!(
            camera_horizontal_fov(CameraHorizontalFovKind::Settings, &calib_only, None)?,
            std::f64::consts::FRAC_PI_2,
            epsilon = 1e-12
        );
        Ok(())
    }

    #[test]
    fn test_fallback() -> Result<(), KittiError> {
        let nothing = paths(None, None);
        assert_relative_eq!(
            camera_horizontal_fov(CameraHorizontalFovKind::Settings, &nothing, None)?,
            90f64.to_radians()
        );
        assert_relative_eq!(
            camera_horizontal_fov(CameraHorizontalFovKind::Calib, &nothing, Some(60.0))?,
            60f64.to_radians()
        );

        let missing_file = paths(Some("/nonexistent/000000.txt".into()), None);
        assert!(matches!(
            camera_horizontal_fov(CameraHorizontalFovKind::Calib, &missing_file, None),
            Err(KittiError::Io(..))
        ));
        Ok(())
    }

    #[test]
    fn test_kind_from_str() -> Result<(), KittiError> {
        assert_eq!("settings".parse::<CameraHorizontalFovKind>()?, CameraHorizontalFovKind::Settings);
        assert_eq!("calib".parse::<CameraHorizontalFovKind>()?, CameraHorizontalFovKind::Calib);
        assert!("lens".parse::<CameraHorizontalFovKind>().is_err());
        Ok(())
    }
}

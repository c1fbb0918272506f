use std::path::Path;

use crate::error::KittiError;

/// Object types that are never turned into annotations.
const IGNORED_TYPES: [&str; 1] = ["DontCare"];

/// Minimum number of fields of a KITTI object label line.
const MIN_FIELDS: usize = 15;

/// A 3D object label in KITTI format.
///
/// The position is the bottom center of the box. Dimensions are expressed in the
/// local axes of the object.
#[derive(Debug, Clone, PartialEq)]
pub struct KittiLabel {
    /// Object type, e.g. `Car` or `Pedestrian`.
    pub label_type: String,
    /// Extent along the vertical axis.
    pub height: f64,
    /// Extent along the lateral axis.
    pub width: f64,
    /// Extent along the heading axis.
    pub depth: f64,
    /// x coordinate of the bottom center.
    pub x: f64,
    /// y coordinate of the bottom center.
    pub y: f64,
    /// z coordinate of the bottom center.
    pub z: f64,
    /// Rotation around the vertical axis in radians.
    pub yaw: f64,
    /// Annotation id to reuse on the remote side, if the label carries one.
    pub annotation_id: Option<String>,
}

impl KittiLabel {
    /// Decode a single label line.
    ///
    /// Returns `Ok(None)` for ignored object types (`DontCare`).
    ///
    /// NOTE: fields are TYPE, TRUNCATED, OCCLUDED, ALPHA, BBOX[4], H, W, L, X, Y, Z, RY,
    ///       optionally followed by SCORE and ANNOTATION_ID.
    pub fn decode_line(line: &str) -> Result<Option<Self>, KittiError> {
        let fields = line.split_whitespace().collect::<Vec<_>>();

        if fields.len() < MIN_FIELDS {
            return Err(KittiError::ParseError(format!(
                "Invalid number of label fields: {}",
                fields.len()
            )));
        }

        if IGNORED_TYPES.contains(&fields[0]) {
            return Ok(None);
        }

        Ok(Some(KittiLabel {
            label_type: fields[0].to_string(),
            height: parse_field(fields[8])?,
            width: parse_field(fields[9])?,
            depth: parse_field(fields[10])?,
            x: parse_field(fields[11])?,
            y: parse_field(fields[12])?,
            z: parse_field(fields[13])?,
            yaw: parse_field(fields[14])?,
            annotation_id: fields.get(16).map(|s| s.to_string()),
        }))
    }

    /// Decode every non-empty line of a label file, skipping ignored types.
    pub fn decode_many(text: &str) -> Result<Vec<Self>, KittiError> {
        let labels = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(Self::decode_line)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(labels.into_iter().flatten().collect())
    }
}

/// Read a KITTI label file.
///
/// # Arguments
///
/// * `path` - The path to the label text file.
///
/// # Returns
///
/// The labels of the file, without ignored object types.
pub fn read_labels(path: impl AsRef<Path>) -> Result<Vec<KittiLabel>, KittiError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(KittiError::io(path))?;
    KittiLabel::decode_many(&content).map_err(|e| match e {
        KittiError::ParseError(msg) => {
            KittiError::ParseError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Read a KITTI label file, treating a missing file as a frame without labels.
pub fn read_labels_or_empty(path: impl AsRef<Path>) -> Result<Vec<KittiLabel>, KittiError> {
    let path = path.as_ref();
    if !path.is_file() {
        log::debug!("no label file at {}, assuming no labels", path.display());
        return Ok(Vec::new());
    }
    read_labels(path)
}

fn parse_field(s: &str) -> Result<f64, KittiError> {
    let value = s
        .parse::<f64>()
        .map_err(|e| KittiError::ParseError(format!("{}: {}", s, e)))?;
    if !value.is_finite() {
        return Err(KittiError::ParseError(format!("{}: not a finite number", s)));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &str = "Car 0.00 0 -1.58 587.19 178.91 603.38 191.75 1.26 1.60 3.56 -1.53 1.89 73.44 -1.60
DontCare -1 -1 -10 503.89 169.71 590.61 190.13 -1 -1 -1 -1000 -1000 -1000 -10

Pedestrian 0.00 0 0.21 423.17 173.67 433.17 224.03 1.87 0.50 0.90 -5.50 1.76 27.47 0.01 1.0 ped-0001
";

    #[test]
    fn test_decode_many() -> Result<(), KittiError> {
        let labels = KittiLabel::decode_many(LABELS)?;
        assert_eq!(labels.len(), 2);

        let car = &labels[0];
        assert_eq!(car.label_type, "Car");
        assert_eq!(car.height, 1.26);
        assert_eq!(car.width, 1.60);
        assert_eq!(car.depth, 3.56);
        assert_eq!((car.x, car.y, car.z), (-1.53, 1.89, 73.44));
        assert_eq!(car.yaw, -1.60);
        assert_eq!(car.annotation_id, None);

        let pedestrian = &labels[1];
        assert_eq!(pedestrian.label_type, "Pedestrian");
        assert_eq!(pedestrian.annotation_id.as_deref(), Some("ped-0001"));
        Ok(())
    }

    #[test]
    fn test_dont_care_is_dropped() -> Result<(), KittiError> {
        let line = "DontCare -1 -1 -10 503.89 169.71 590.61 190.13 -1 -1 -1 -1000 -1000 -1000 -10";
        assert_eq!(KittiLabel::decode_line(line)?, None);
        Ok(())
    }

    #[test]
    fn test_too_few_fields() {
        let err = KittiLabel::decode_line("Car 0.00 0 -1.58").unwrap_err();
        assert!(matches!(err, KittiError::ParseError(_)));
    }

    #[test]
    fn test_invalid_float() {
        let line = "Car 0.00 0 -1.58 587.19 178.91 603.38 191.75 tall 1.60 3.56 -1.53 1.89 73.44 -1.60";
        assert!(KittiLabel::decode_line(line).is_err());
    }

    #[test]
    fn test_non_finite_values() {
        for yaw in ["inf", "-inf", "NaN"] {
            let line = format!(
                "Car 0.00 0 -1.58 587.19 178.91 603.38 191.75 1.26 1.60 3.56 -1.53 1.89 73.44 {yaw}"
            );
            let err = KittiLabel::decode_line(&line).unwrap_err();
            assert!(matches!(err, KittiError::ParseError(_)), "{yaw}");
        }
    }

    #[test]
    fn test_read_labels_or_empty() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        assert!(read_labels_or_empty(dir.path().join("000000.txt"))?.is_empty());

        let path = dir.path().join("000001.txt");
        std::fs::write(&path, LABELS)?;
        assert_eq!(read_labels_or_empty(&path)?.len(), 2);
        Ok(())
    }
}

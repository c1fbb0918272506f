use std::{num::NonZeroUsize, time::Duration};

use anno3d_kitti::CameraHorizontalFovKind;
use serde::Deserialize;

use crate::{error::UploadError, task_creation::TaskCreationStrategy};

/// How far the pipeline runs.
///
/// The kinds are ordered: each one performs the work of the previous ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum UploadKind {
    /// Upload input data and supplementary data only.
    #[default]
    DataOnly,
    /// Also create tasks.
    CreateTask,
    /// Also create annotations from the ground truth labels.
    CreateAnnotation,
}

impl std::str::FromStr for UploadKind {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(UploadKind::DataOnly),
            "task" => Ok(UploadKind::CreateTask),
            "annotation" => Ok(UploadKind::CreateAnnotation),
            _ => Err(UploadError::InvalidInput(format!(
                "unknown upload kind {s}, expected data, task or annotation"
            ))),
        }
    }
}

/// Tuning of the upload pipeline, shared by every scene uploaded.
///
/// Deserializable from JSON, durations are given in seconds:
///
/// ```
/// use anno3d::SceneUploaderConfig;
///
/// let config: SceneUploaderConfig =
///     serde_json::from_str(r#"{"parallelism": 4, "job_poll_timeout": 600}"#).unwrap();
/// assert_eq!(config.parallelism, Some(4));
/// assert_eq!(config.job_poll_interval.as_secs(), 5);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneUploaderConfig {
    /// Maximum number of concurrent remote operations, unbounded if `None`.
    pub parallelism: Option<usize>,
    /// Wait between two polls of the task generation job.
    #[serde(deserialize_with = "seconds::deserialize")]
    pub job_poll_interval: Duration,
    /// Give up waiting for the task generation job after this long, never if `None`.
    #[serde(deserialize_with = "seconds::deserialize_optional")]
    pub job_poll_timeout: Option<Duration>,
    /// How tasks are created.
    pub task_creation: TaskCreationStrategy,
    /// Overwrite input data and supplementary data that already exist.
    pub force: bool,
}

impl Default for SceneUploaderConfig {
    fn default() -> Self {
        Self {
            parallelism: None,
            job_poll_interval: Duration::from_secs(5),
            job_poll_timeout: None,
            task_creation: TaskCreationStrategy::default(),
            force: false,
        }
    }
}

/// What to upload and where, for one scene.
#[derive(Debug, Clone)]
pub struct SceneUploaderInput {
    /// The target project.
    pub project_id: String,
    /// Prefix of the input data ids, `{prefix}_{frame_id}`.
    pub input_data_id_prefix: String,
    /// Prefix of the task ids. Must not be empty when tasks are created.
    pub task_id_prefix: String,
    /// Number of frames per task, all frames in one task if `None`.
    pub frames_per_task: Option<NonZeroUsize>,
    /// Where the camera horizontal field of view comes from.
    pub camera_horizontal_fov: CameraHorizontalFovKind,
    /// Lidar mounting height in meters, the KITTI height if `None`.
    pub sensor_height: Option<f64>,
    /// How far the pipeline runs.
    pub kind: UploadKind,
}

impl SceneUploaderInput {
    /// Check the settings are consistent with the upload kind.
    pub fn validate(&self) -> Result<(), UploadError> {
        if self.kind >= UploadKind::CreateTask && self.task_id_prefix.is_empty() {
            return Err(UploadError::InvalidInput(
                "task_id_prefix must not be empty when creating tasks".to_string(),
            ));
        }
        Ok(())
    }
}

mod seconds {
    use std::time::Duration;

    use serde::{de::Error, Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(D::Error::custom)
    }

    pub fn deserialize_optional<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kind: UploadKind, task_id_prefix: &str) -> SceneUploaderInput {
        SceneUploaderInput {
            project_id: "project".to_string(),
            input_data_id_prefix: "scene".to_string(),
            task_id_prefix: task_id_prefix.to_string(),
            frames_per_task: None,
            camera_horizontal_fov: CameraHorizontalFovKind::Settings,
            sensor_height: None,
            kind,
        }
    }

    #[test]
    fn test_upload_kind() -> Result<(), UploadError> {
        assert_eq!("data".parse::<UploadKind>()?, UploadKind::DataOnly);
        assert_eq!("task".parse::<UploadKind>()?, UploadKind::CreateTask);
        assert_eq!("annotation".parse::<UploadKind>()?, UploadKind::CreateAnnotation);
        assert!("all".parse::<UploadKind>().is_err());

        assert!(UploadKind::CreateAnnotation > UploadKind::CreateTask);
        assert!(UploadKind::CreateTask > UploadKind::DataOnly);
        Ok(())
    }

    #[test]
    fn test_validate_task_prefix() {
        assert!(input(UploadKind::DataOnly, "").validate().is_ok());
        assert!(input(UploadKind::CreateTask, "").validate().is_err());
        assert!(input(UploadKind::CreateAnnotation, "").validate().is_err());
        assert!(input(UploadKind::CreateAnnotation, "task").validate().is_ok());
    }

    #[test]
    fn test_config_from_json() -> Result<(), serde_json::Error> {
        let config: SceneUploaderConfig = serde_json::from_str("{}")?;
        assert_eq!(config.parallelism, None);
        assert_eq!(config.job_poll_interval, Duration::from_secs(5));
        assert_eq!(config.job_poll_timeout, None);
        assert_eq!(config.task_creation, TaskCreationStrategy::BulkJob);
        assert!(!config.force);

        let config: SceneUploaderConfig = serde_json::from_str(
            r#"{"job_poll_interval": 0.5, "job_poll_timeout": null, "task_creation": "direct", "force": true}"#,
        )?;
        assert_eq!(config.job_poll_interval, Duration::from_millis(500));
        assert_eq!(config.job_poll_timeout, None);
        assert_eq!(config.task_creation, TaskCreationStrategy::Direct);
        assert!(config.force);

        assert!(serde_json::from_str::<SceneUploaderConfig>(r#"{"job_poll_interval": -1}"#).is_err());
        Ok(())
    }
}

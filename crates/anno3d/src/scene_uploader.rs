use std::{collections::HashSet, path::Path, sync::Arc};

use anno3d_annofab::{
    model::{CuboidAnnotations, SupplementaryDataType},
    AnnotationService, Uploader,
};
use anno3d_kitti::{
    load_scene,
    meta::{generate_frame_supplementaries, input_data_id},
    FilePaths, SupplementaryKind, SupplementaryOptions,
};
use futures::future::try_join_all;

use crate::{
    batching::{chunk_into_tasks, TaskBatch, UploadedFrame},
    config::{SceneUploaderConfig, SceneUploaderInput, UploadKind},
    cuboid::frame_cuboids,
    error::UploadError,
    limiter::{AbortFlag, ConcurrencyLimit},
    task_creation::{blocking, create_tasks, wait_for_job, TaskCreation},
};

/// What reached the remote side during an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Input data ids, in frame order.
    pub data_ids: Vec<String>,
    /// Task ids, in task order. Empty unless tasks were created.
    pub task_ids: Vec<String>,
    /// Number of cuboid annotations created.
    pub annotation_count: usize,
}

/// Uploads scenes as input data, tasks and annotations.
///
/// The upload runs in three phases, each fully joined before the next starts:
///
/// 1. every frame's point cloud and supplementary data, concurrently,
/// 2. task creation, waiting for the remote job if there is one,
/// 3. annotations, concurrently across tasks and in frame order within a task.
///
/// Every remote call runs on the blocking worker pool, bounded by the configured
/// parallelism. The first failure aborts the run; nothing is rolled back.
pub struct SceneUploader<S: AnnotationService + 'static> {
    service: Arc<S>,
    config: SceneUploaderConfig,
    limit: ConcurrencyLimit,
}

impl<S: AnnotationService + 'static> SceneUploader<S> {
    /// Create an uploader talking to `service`.
    pub fn new(service: Arc<S>, config: SceneUploaderConfig) -> Self {
        let limit = ConcurrencyLimit::new(config.parallelism);
        Self {
            service,
            config,
            limit,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &SceneUploaderConfig {
        &self.config
    }

    /// Upload the scene at `scene_path`.
    ///
    /// # Arguments
    ///
    /// * `scene_path` - A `scene.meta` file, a directory containing one, or a KITTI
    ///   directory laid out as `velodyne`, `image_2`, `calib` and `label_2`.
    /// * `input` - What to upload and where.
    pub async fn upload_from_path(
        &self,
        scene_path: &Path,
        input: &SceneUploaderInput,
    ) -> Result<UploadSummary, UploadError> {
        let (scene, frames) = load_scene(scene_path)?;
        log::info!("upload scene: {}", serde_json::to_string_pretty(&scene).unwrap_or_default());
        self.upload_frames(frames, input).await
    }

    /// Upload frames that were already resolved into file paths.
    pub async fn upload_frames(
        &self,
        frames: Vec<FilePaths>,
        input: &SceneUploaderInput,
    ) -> Result<UploadSummary, UploadError> {
        input.validate()?;
        let uploader = Uploader::new(self.service.clone(), &input.project_id, self.config.force);

        // fail before uploading anything if annotations cannot be created
        let label_ids = if input.kind == UploadKind::CreateAnnotation {
            Some(Arc::new(self.fetch_label_ids(&input.project_id).await?))
        } else {
            None
        };

        log::info!("uploading {} frames", frames.len());
        let uploaded = self.upload_data(&uploader, frames, input).await?;
        log::info!("uploaded {} input data", uploaded.len());

        let mut summary = UploadSummary {
            data_ids: uploaded.iter().map(|frame| frame.data_id.clone()).collect(),
            ..Default::default()
        };
        if input.kind == UploadKind::DataOnly {
            return Ok(summary);
        }

        let batches = chunk_into_tasks(&input.task_id_prefix, uploaded, input.frames_per_task);
        self.run_task_creation(&uploader, &batches).await?;
        summary.task_ids = batches.iter().map(|batch| batch.task_id.clone()).collect();
        log::info!("created {} tasks", summary.task_ids.len());

        let Some(label_ids) = label_ids else {
            return Ok(summary);
        };

        summary.annotation_count = self.create_annotations(&input.project_id, label_ids, &batches).await?;
        log::info!("created {} annotations", summary.annotation_count);

        Ok(summary)
    }

    async fn fetch_label_ids(&self, project_id: &str) -> Result<HashSet<String>, UploadError> {
        let service = self.service.clone();
        let project_id = project_id.to_string();
        blocking(move || {
            let labels = service
                .get_annotation_specs(&project_id)?
                .labels
                .ok_or(UploadError::MissingLabelSpecs(project_id))?;
            Ok(labels.into_iter().map(|label| label.label_id).collect())
        })
        .await
    }

    /// Upload every frame. The first failure is returned as soon as it happens;
    /// frames already on the blocking pool stop before their next remote call.
    async fn upload_data(
        &self,
        uploader: &Uploader<S>,
        frames: Vec<FilePaths>,
        input: &SceneUploaderInput,
    ) -> Result<Vec<UploadedFrame>, UploadError> {
        let options = SupplementaryOptions {
            camera_horizontal_fov: input.camera_horizontal_fov,
            fallback_horizontal_fov: None,
            sensor_height: input.sensor_height,
        };

        let abort = AbortFlag::new();
        let units = frames.into_iter().map(|paths| {
            let uploader = uploader.clone();
            let abort = abort.clone();
            let data_id = input_data_id(&input.input_data_id_prefix, &paths.key.id);
            self.limit.run(blocking(move || {
                abort.record(upload_frame(&uploader, &data_id, &paths, &options, &abort))?;
                Ok(UploadedFrame { data_id, paths })
            }))
        });

        try_join_all(units).await
    }

    async fn run_task_creation(
        &self,
        uploader: &Uploader<S>,
        batches: &[TaskBatch<UploadedFrame>],
    ) -> Result<(), UploadError> {
        match create_tasks(uploader, batches, self.config.task_creation, &self.limit).await? {
            TaskCreation::Created(tasks) => {
                log::debug!("created tasks: {:?}", tasks);
            }
            TaskCreation::Pending(job) => {
                wait_for_job(
                    &self.service,
                    job,
                    self.config.job_poll_interval,
                    self.config.job_poll_timeout,
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn create_annotations(
        &self,
        project_id: &str,
        label_ids: Arc<HashSet<String>>,
        batches: &[TaskBatch<UploadedFrame>],
    ) -> Result<usize, UploadError> {
        let units = batches.iter().map(|batch| {
            let service = self.service.clone();
            let label_ids = label_ids.clone();
            let project_id = project_id.to_string();
            let batch = batch.clone();
            self.limit.run(async move {
                let mut count = 0;
                // frames of a task in order
                for frame in batch.frames {
                    let service = service.clone();
                    let label_ids = label_ids.clone();
                    let project_id = project_id.clone();
                    let task_id = batch.task_id.clone();
                    count += blocking(move || {
                        let cuboids = frame_cuboids(service.account_id(), &label_ids, &frame.paths.labels)?;
                        log::info!(
                            "creating annotations of {}/{}: {} of {} labels",
                            task_id,
                            frame.data_id,
                            cuboids.details.len(),
                            cuboids.label_count
                        );
                        let count = cuboids.details.len();
                        service.create_annotation(&CuboidAnnotations {
                            project_id,
                            task_id,
                            input_data_id: frame.data_id,
                            details: cuboids.details,
                        })?;
                        Ok(count)
                    })
                    .await?;
                }
                Ok::<_, UploadError>(count)
            })
        });

        Ok(try_join_all(units).await?.into_iter().sum())
    }
}

/// Upload the point cloud of a frame, then its supplementary data in order.
fn upload_frame<S: AnnotationService + ?Sized>(
    uploader: &Uploader<S>,
    data_id: &str,
    paths: &FilePaths,
    options: &SupplementaryOptions,
    abort: &AbortFlag,
) -> Result<(), UploadError> {
    abort.check()?;
    uploader.upload_input_data(data_id, &paths.pcd)?;

    let dir = tempfile::tempdir()?;
    let supplementaries = generate_frame_supplementaries(dir.path(), data_id, paths, options)?;
    for (index, supplementary) in supplementaries.iter().enumerate() {
        abort.check()?;
        uploader.upload_supplementary(
            data_id,
            &supplementary.data_id,
            &supplementary.path,
            supplementary_data_type(supplementary.kind),
            index + 1,
        )?;
    }

    log::info!("uploaded {}", paths.pcd.display());
    Ok(())
}

fn supplementary_data_type(kind: SupplementaryKind) -> SupplementaryDataType {
    match kind {
        SupplementaryKind::Custom => SupplementaryDataType::Custom,
        SupplementaryKind::Image => SupplementaryDataType::Image,
        SupplementaryKind::Text => SupplementaryDataType::Text,
    }
}

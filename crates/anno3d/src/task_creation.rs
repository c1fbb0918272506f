use std::time::Duration;

use anno3d_annofab::{
    content_type::guess_content_type,
    model::{JobInfo, JobStatus, Task, TaskGenerateRequest, TaskGenerateRule},
    AnnotationService, Uploader,
};
use serde::Deserialize;

use crate::{
    batching::{task_definition_csv, TaskBatch, UploadedFrame},
    error::UploadError,
    limiter::ConcurrencyLimit,
};

/// How tasks are created on the remote side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCreationStrategy {
    /// Upload a task definition CSV and let an asynchronous job create every task.
    #[default]
    BulkJob,
    /// Create every task with its own request.
    Direct,
}

/// Outcome of a task creation request.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskCreation {
    /// The tasks exist.
    Created(Vec<Task>),
    /// A job is creating the tasks, see [`wait_for_job`].
    Pending(JobInfo),
}

/// Run a blocking closure on the blocking worker pool.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, UploadError>
where
    F: FnOnce() -> Result<T, UploadError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Request the creation of the given tasks.
///
/// # Arguments
///
/// * `uploader` - Uploader of the target project.
/// * `batches` - The tasks and their frames.
/// * `strategy` - How the tasks are created.
/// * `limit` - Bound on concurrent requests of [`TaskCreationStrategy::Direct`].
///
/// # Returns
///
/// [`TaskCreation::Pending`] for a bulk job, [`TaskCreation::Created`] otherwise.
/// Nothing is requested for an empty `batches`.
pub async fn create_tasks<S: AnnotationService + 'static>(
    uploader: &Uploader<S>,
    batches: &[TaskBatch<UploadedFrame>],
    strategy: TaskCreationStrategy,
    limit: &ConcurrencyLimit,
) -> Result<TaskCreation, UploadError> {
    if batches.is_empty() {
        return Ok(TaskCreation::Created(Vec::new()));
    }

    match strategy {
        TaskCreationStrategy::BulkJob => {
            let csv = task_definition_csv(batches);
            log::info!("task definition csv:\n{}", csv);

            let uploader = uploader.clone();
            let job = blocking(move || {
                let csv_data_path =
                    uploader.upload_temp_data(csv.into_bytes(), guess_content_type("task.csv"))?;
                let service = uploader.service();
                let project = service.get_project(uploader.project_id())?;
                let request = TaskGenerateRequest {
                    task_generate_rule: TaskGenerateRule::ByInputDataCsv { csv_data_path },
                    project_last_updated_datetime: project.updated_datetime,
                };
                let response =
                    service.generate_tasks_from_definition(uploader.project_id(), &request)?;
                Ok(response.job)
            })
            .await?;

            Ok(TaskCreation::Pending(job))
        }
        TaskCreationStrategy::Direct => {
            let requests = batches.iter().map(|batch| {
                let uploader = uploader.clone();
                let task_id = batch.task_id.clone();
                let data_ids = batch
                    .frames
                    .iter()
                    .map(|frame| frame.data_id.clone())
                    .collect::<Vec<_>>();
                limit.run(blocking(move || {
                    let task = uploader
                        .service()
                        .put_task(uploader.project_id(), &task_id, &data_ids)?;
                    log::info!("created task {} with {} frames", task.task_id, data_ids.len());
                    Ok(task)
                }))
            });

            Ok(TaskCreation::Created(
                futures::future::try_join_all(requests).await?,
            ))
        }
    }
}

/// Poll a job until it leaves the progress state.
///
/// # Arguments
///
/// * `service` - The remote service.
/// * `job` - The job as returned when it was started.
/// * `interval` - Wait between two polls.
/// * `timeout` - Give up after this long, never if `None`.
///
/// # Returns
///
/// The succeeded job. A failed job is [`UploadError::JobFailed`] carrying the
/// remote detail, a job that disappears is [`UploadError::JobNotFound`].
pub async fn wait_for_job<S: AnnotationService + 'static>(
    service: &std::sync::Arc<S>,
    job: JobInfo,
    interval: Duration,
    timeout: Option<Duration>,
) -> Result<JobInfo, UploadError> {
    let started = tokio::time::Instant::now();
    let mut job = job;

    while job.job_status == JobStatus::Progress {
        let elapsed = started.elapsed();
        if timeout.is_some_and(|timeout| elapsed >= timeout) {
            return Err(UploadError::JobTimeout {
                job_id: job.job_id,
                elapsed,
            });
        }

        log::info!("waiting for job {} to finish", job.job_id);
        tokio::time::sleep(interval).await;

        let service = service.clone();
        let (project_id, job_type, job_id) = (job.project_id.clone(), job.job_type, job.job_id.clone());
        job = blocking(move || {
            service
                .get_job(&project_id, job_type, &job_id)?
                .ok_or(UploadError::JobNotFound(job_id))
        })
        .await?;
    }

    if job.job_status == JobStatus::Failed {
        return Err(UploadError::JobFailed {
            detail: job.job_detail.unwrap_or_default().to_string(),
            job_id: job.job_id,
        });
    }

    Ok(job)
}

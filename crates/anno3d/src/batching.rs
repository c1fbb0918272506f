use std::num::NonZeroUsize;

use anno3d_kitti::FilePaths;

/// A frame whose point cloud has been uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFrame {
    /// The input data id of the point cloud.
    pub data_id: String,
    /// The local files of the frame.
    pub paths: FilePaths,
}

/// The frames of one task, in upload order.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskBatch<T> {
    /// The task id.
    pub task_id: String,
    /// The frames of the task.
    pub frames: Vec<T>,
}

/// Partition ordered frames into tasks.
///
/// # Arguments
///
/// * `task_id_prefix` - Prefix of the generated task ids.
/// * `frames` - The frames, in upload order.
/// * `frames_per_task` - Chunk size, a single task holding every frame if `None`.
///
/// # Returns
///
/// The tasks in order. With a chunk size, task ids are `{prefix}_{index}` and the
/// last task may be shorter; without, the single task id is the bare prefix.
/// No frames yield no tasks.
///
/// Example:
///
/// ```
/// use std::num::NonZeroUsize;
/// use anno3d::batching::chunk_into_tasks;
///
/// let tasks = chunk_into_tasks("task", vec![1, 2, 3], NonZeroUsize::new(2));
/// assert_eq!(tasks[0].task_id, "task_0");
/// assert_eq!(tasks[1].frames, vec![3]);
/// ```
pub fn chunk_into_tasks<T>(
    task_id_prefix: &str,
    frames: Vec<T>,
    frames_per_task: Option<NonZeroUsize>,
) -> Vec<TaskBatch<T>> {
    if frames.is_empty() {
        return Vec::new();
    }

    let Some(chunk_size) = frames_per_task else {
        return vec![TaskBatch {
            task_id: task_id_prefix.to_string(),
            frames,
        }];
    };

    let mut batches = Vec::with_capacity(frames.len().div_ceil(chunk_size.get()));
    let mut frames = frames.into_iter().peekable();
    while frames.peek().is_some() {
        batches.push(TaskBatch {
            task_id: format!("{}_{}", task_id_prefix, batches.len()),
            frames: frames.by_ref().take(chunk_size.get()).collect(),
        });
    }
    batches
}

/// Render the task definition CSV: one `task_id,input_data_name,input_data_id`
/// line per frame, CRLF terminated.
///
/// The input data name is the point cloud file name.
pub fn task_definition_csv(batches: &[TaskBatch<UploadedFrame>]) -> String {
    batches
        .iter()
        .flat_map(|batch| {
            batch.frames.iter().map(move |frame| {
                let input_data_name = frame
                    .paths
                    .pcd
                    .file_name()
                    .map(|name| name.to_string_lossy())
                    .unwrap_or_default();
                format!("{},{},{}\r\n", batch.task_id, input_data_name, frame.data_id)
            })
        })
        .collect()
}

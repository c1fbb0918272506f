use serde::{Deserialize, Serialize};

/// A pre-signed location to upload a file to before registering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempUploadSlot {
    /// Pre-signed URL to `PUT` the file to.
    pub url: String,
    /// Path to reference the uploaded file by in subsequent requests.
    pub path: String,
}

/// A registered input data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputData {
    /// The input data id.
    pub input_data_id: String,
    /// The input data name.
    pub input_data_name: String,
    /// Last modification time, required to overwrite the record.
    pub updated_datetime: String,
}

/// Body of an input data registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDataRequest {
    /// The input data name.
    pub input_data_name: String,
    /// Temp path of the uploaded file.
    pub input_data_path: String,
    /// `updated_datetime` of the record being overwritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_datetime: Option<String>,
}

/// Type of a supplementary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupplementaryDataType {
    /// Opaque binary.
    Custom,
    /// Image file.
    Image,
    /// Text file.
    Text,
}

/// A registered supplementary data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementaryData {
    /// The input data the supplementary data belongs to.
    pub input_data_id: String,
    /// The supplementary data id.
    pub supplementary_data_id: String,
    /// Last modification time, required to overwrite the record.
    pub updated_datetime: String,
}

/// Body of a supplementary data registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplementaryDataRequest {
    /// The supplementary data name.
    pub supplementary_data_name: String,
    /// Temp path of the uploaded file.
    pub supplementary_data_path: String,
    /// The type of the file.
    pub supplementary_data_type: SupplementaryDataType,
    /// Display order among the supplementaries of the input data.
    pub supplementary_data_number: usize,
    /// `updated_datetime` of the record being overwritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated_datetime: Option<String>,
}

/// The parts of a project the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// The project id.
    pub project_id: String,
    /// Last modification time, required to generate tasks.
    pub updated_datetime: String,
}

/// Kind of an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobType {
    /// Task generation.
    #[serde(rename = "gen-tasks")]
    GenTasks,
}

impl JobType {
    /// Wire name of the job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::GenTasks => "gen-tasks",
        }
    }
}

/// State of an asynchronous job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Still running.
    Progress,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error, see [`JobInfo::job_detail`].
    Failed,
}

/// An asynchronous job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    /// The project the job runs in.
    pub project_id: String,
    /// The job type.
    pub job_type: JobType,
    /// The job id.
    pub job_id: String,
    /// The job state.
    pub job_status: JobStatus,
    /// Free-form failure detail.
    #[serde(default)]
    pub job_detail: Option<serde_json::Value>,
}

/// How tasks are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum TaskGenerateRule {
    /// One task per distinct task id of a `task_id,input_data_name,input_data_id` CSV.
    ByInputDataCsv {
        /// Temp path of the uploaded CSV.
        csv_data_path: String,
    },
}

/// Body of a task generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskGenerateRequest {
    /// The generation rule.
    pub task_generate_rule: TaskGenerateRule,
    /// `updated_datetime` of the project.
    pub project_last_updated_datetime: String,
}

/// Response of a task generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskGenerateResponse {
    /// The started job.
    pub job: JobInfo,
}

/// A task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// The project the task belongs to.
    pub project_id: String,
    /// The task id.
    pub task_id: String,
    /// Input data of the task, in order.
    pub input_data_id_list: Vec<String>,
}

/// Body of a task creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// Input data of the task, in order.
    pub input_data_id_list: Vec<String>,
}

/// A label of the annotation specs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    /// The label id, matched against KITTI object types.
    pub label_id: String,
}

/// The annotation specs of a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSpecs {
    /// The labels, absent if the project has never been configured.
    #[serde(default)]
    pub labels: Option<Vec<LabelSpec>>,
}

/// A 3D vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    /// x component
    pub x: f64,
    /// y component
    pub y: f64,
    /// z component
    pub z: f64,
}

impl From<[f64; 3]> for Xyz {
    fn from(v: [f64; 3]) -> Self {
        Xyz {
            x: v[0],
            y: v[1],
            z: v[2],
        }
    }
}

/// Size of a cuboid in its local axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Extent along the lateral axis.
    pub width: f64,
    /// Extent along the vertical axis.
    pub height: f64,
    /// Extent along the heading axis.
    pub depth: f64,
}

/// Orientation vectors of a cuboid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuboidDirection {
    /// Unit front vector.
    pub front: Xyz,
    /// Unit up vector.
    pub up: Xyz,
}

/// Geometry of a cuboid in the point cloud frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuboidShape {
    /// The size.
    pub dimensions: Size,
    /// The center.
    pub location: Xyz,
    /// Euler angles, applied z, x, y.
    pub rotation: Xyz,
    /// Orientation vectors, redundant with `rotation`.
    pub direction: CuboidDirection,
}

/// Custom annotation data of a cuboid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuboidAnnotationDetailData {
    /// Always `CUBOID`.
    pub kind: String,
    /// The geometry.
    pub shape: CuboidShape,
    /// Data format version, `2`.
    pub version: String,
}

impl CuboidAnnotationDetailData {
    /// Cuboid data of the current format version.
    pub fn new(shape: CuboidShape) -> Self {
        Self {
            kind: "CUBOID".to_string(),
            shape,
            version: "2".to_string(),
        }
    }
}

/// One annotation of an input data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuboidAnnotationDetail {
    /// The annotation id.
    pub annotation_id: String,
    /// The account creating the annotation.
    pub account_id: String,
    /// The label of the annotation.
    pub label_id: String,
    /// Whether the annotation is locked against edits.
    pub is_protected: bool,
    /// Always `inner`.
    pub data_holding_type: String,
    /// The cuboid.
    pub data: CuboidAnnotationDetailData,
}

/// All annotations of an input data within a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuboidAnnotations {
    /// The project id.
    pub project_id: String,
    /// The task id.
    pub task_id: String,
    /// The input data id.
    pub input_data_id: String,
    /// The annotations.
    pub details: Vec<CuboidAnnotationDetail>,
}

use crate::{
    error::AnnofabError,
    model::{
        AnnotationSpecs, CuboidAnnotations, InputData, InputDataRequest, JobInfo, JobType,
        Project, SupplementaryData, SupplementaryDataRequest, Task, TaskGenerateRequest,
        TaskGenerateResponse, TempUploadSlot,
    },
};

/// The remote annotation service operations used by the upload pipeline.
///
/// Every call blocks until the server answered. Implementations must be shareable
/// across threads since calls are issued from a pool of blocking workers.
pub trait AnnotationService: Send + Sync {
    /// The account the service acts as.
    fn account_id(&self) -> &str;

    /// Reserve a temporary location to upload a file to.
    fn create_temp_upload_slot(&self, project_id: &str) -> Result<TempUploadSlot, AnnofabError>;

    /// Upload raw bytes to a slot created by [`Self::create_temp_upload_slot`].
    fn put_temp_data(
        &self,
        slot: &TempUploadSlot,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AnnofabError>;

    /// Fetch an input data, `None` if it does not exist.
    fn get_input_data(
        &self,
        project_id: &str,
        input_data_id: &str,
    ) -> Result<Option<InputData>, AnnofabError>;

    /// Create or overwrite an input data.
    fn register_input_data(
        &self,
        project_id: &str,
        input_data_id: &str,
        request: &InputDataRequest,
    ) -> Result<InputData, AnnofabError>;

    /// List the supplementary data of an input data.
    fn get_supplementary_data_list(
        &self,
        project_id: &str,
        input_data_id: &str,
    ) -> Result<Vec<SupplementaryData>, AnnofabError>;

    /// Create or overwrite a supplementary data.
    fn register_supplementary_data(
        &self,
        project_id: &str,
        input_data_id: &str,
        supplementary_data_id: &str,
        request: &SupplementaryDataRequest,
    ) -> Result<SupplementaryData, AnnofabError>;

    /// Fetch a project.
    fn get_project(&self, project_id: &str) -> Result<Project, AnnofabError>;

    /// Start an asynchronous task generation job.
    fn generate_tasks_from_definition(
        &self,
        project_id: &str,
        request: &TaskGenerateRequest,
    ) -> Result<TaskGenerateResponse, AnnofabError>;

    /// Fetch the current state of a job, `None` if the job is gone.
    fn get_job(
        &self,
        project_id: &str,
        job_type: JobType,
        job_id: &str,
    ) -> Result<Option<JobInfo>, AnnofabError>;

    /// Create a task directly.
    fn put_task(
        &self,
        project_id: &str,
        task_id: &str,
        input_data_ids: &[String],
    ) -> Result<Task, AnnofabError>;

    /// Replace the annotations of one input data of a task.
    fn create_annotation(&self, annotations: &CuboidAnnotations) -> Result<(), AnnofabError>;

    /// Fetch the annotation specs of a project.
    fn get_annotation_specs(&self, project_id: &str) -> Result<AnnotationSpecs, AnnofabError>;
}

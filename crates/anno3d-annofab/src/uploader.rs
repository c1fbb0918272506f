use std::{path::Path, sync::Arc};

use crate::{
    content_type::guess_content_type,
    error::AnnofabError,
    model::{InputDataRequest, SupplementaryDataRequest, SupplementaryDataType},
    service::AnnotationService,
};

/// Uploads local files as input data and supplementary data of a project.
///
/// Every upload goes through a temporary slot: reserve, `PUT` the bytes, then
/// register the slot path under the requested id. Existing records are only
/// overwritten when `force` is set.
pub struct Uploader<S: AnnotationService + ?Sized> {
    service: Arc<S>,
    project_id: String,
    force: bool,
}

impl<S: AnnotationService + ?Sized> Clone for Uploader<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            project_id: self.project_id.clone(),
            force: self.force,
        }
    }
}

impl<S: AnnotationService + ?Sized> Uploader<S> {
    /// Create an uploader for `project_id`.
    pub fn new(service: Arc<S>, project_id: impl Into<String>, force: bool) -> Self {
        Self {
            service,
            project_id: project_id.into(),
            force,
        }
    }

    /// The project files are uploaded to.
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// The remote service.
    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Upload bytes to a fresh temporary slot and return its path.
    pub fn upload_temp_data(&self, data: Vec<u8>, content_type: &str) -> Result<String, AnnofabError> {
        let slot = self.service.create_temp_upload_slot(&self.project_id)?;
        self.service.put_temp_data(&slot, data, content_type)?;
        Ok(slot.path)
    }

    /// Upload a file to a fresh temporary slot and return its path.
    pub fn upload_temp_file(&self, file: &Path) -> Result<String, AnnofabError> {
        let data = std::fs::read(file).map_err(|e| AnnofabError::Io(file.to_path_buf(), e))?;
        self.upload_temp_data(data, guess_content_type(file))
    }

    /// Upload `file` as the input data `input_data_id`.
    ///
    /// The input data name is the file name. Returns the input data id.
    pub fn upload_input_data(&self, input_data_id: &str, file: &Path) -> Result<String, AnnofabError> {
        let last_updated_datetime = match self.service.get_input_data(&self.project_id, input_data_id)? {
            Some(_) if !self.force => {
                return Err(AnnofabError::AlreadyExists {
                    kind: "input data",
                    id: input_data_id.to_string(),
                })
            }
            Some(existing) => Some(existing.updated_datetime),
            None => None,
        };

        let request = InputDataRequest {
            input_data_name: file_name(file),
            input_data_path: self.upload_temp_file(file)?,
            last_updated_datetime,
        };
        let input_data = self
            .service
            .register_input_data(&self.project_id, input_data_id, &request)?;
        log::debug!("uploaded input data: {:?}", input_data);

        Ok(input_data_id.to_string())
    }

    /// Upload `file` as the supplementary data `supplementary_data_id` of an input data.
    ///
    /// # Arguments
    ///
    /// * `input_data_id` - The input data to attach the file to.
    /// * `supplementary_data_id` - The id, also used as the name.
    /// * `file` - The local file.
    /// * `data_type` - The type of the file.
    /// * `number` - Display order among the supplementaries of the input data.
    ///
    /// # Returns
    ///
    /// The supplementary data id.
    pub fn upload_supplementary(
        &self,
        input_data_id: &str,
        supplementary_data_id: &str,
        file: &Path,
        data_type: SupplementaryDataType,
        number: usize,
    ) -> Result<String, AnnofabError> {
        let existing = self
            .service
            .get_supplementary_data_list(&self.project_id, input_data_id)?
            .into_iter()
            .find(|s| s.supplementary_data_id == supplementary_data_id);

        let last_updated_datetime = match existing {
            Some(_) if !self.force => {
                return Err(AnnofabError::AlreadyExists {
                    kind: "supplementary data",
                    id: format!("{input_data_id}/{supplementary_data_id}"),
                })
            }
            Some(existing) => Some(existing.updated_datetime),
            None => None,
        };

        let request = SupplementaryDataRequest {
            supplementary_data_name: supplementary_data_id.to_string(),
            supplementary_data_path: self.upload_temp_file(file)?,
            supplementary_data_type: data_type,
            supplementary_data_number: number,
            last_updated_datetime,
        };
        let supplementary = self.service.register_supplementary_data(
            &self.project_id,
            input_data_id,
            supplementary_data_id,
            &request,
        )?;
        log::debug!("uploaded supplementary data: {:?}", supplementary);

        Ok(supplementary_data_id.to_string())
    }
}

fn file_name(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string_lossy().to_string())
}

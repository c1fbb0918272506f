use std::time::Duration;

use reqwest::{
    blocking::{RequestBuilder, Response},
    header::{AUTHORIZATION, CONTENT_TYPE},
    StatusCode, Url,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::AnnofabError,
    model::{
        AnnotationSpecs, CuboidAnnotations, InputData, InputDataRequest, JobInfo, JobType,
        Project, SupplementaryData, SupplementaryDataRequest, Task, TaskGenerateRequest,
        TaskGenerateResponse, TaskRequest, TempUploadSlot,
    },
    service::AnnotationService,
};

/// The public Annofab endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://annofab.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// How to authenticate against Annofab.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// User id and password, exchanged for a token at login.
    IdPass {
        /// The user id.
        user_id: String,
        /// The password.
        password: String,
    },
    /// Personal access token.
    Pat(String),
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credential::IdPass { user_id, .. } => f
                .debug_struct("IdPass")
                .field("user_id", user_id)
                .field("password", &"***")
                .finish(),
            Credential::Pat(_) => f.debug_tuple("Pat").field(&"***").finish(),
        }
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    user_id: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: Token,
}

#[derive(Deserialize)]
struct Token {
    id_token: String,
}

#[derive(Deserialize)]
struct MyAccount {
    account_id: String,
}

#[derive(Deserialize)]
struct JobList {
    list: Vec<JobInfo>,
}

/// Blocking client of the Annofab web API (`{endpoint}/api/v1`).
///
/// NOTE: the underlying blocking HTTP client must be created and dropped outside
/// of an async runtime.
pub struct AnnofabClient {
    http: reqwest::blocking::Client,
    api_url: Url,
    authorization: String,
    account_id: String,
}

impl AnnofabClient {
    /// Authenticate against `endpoint` and resolve the account of the credential.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - The Annofab base URL, e.g. [`DEFAULT_ENDPOINT`].
    /// * `credential` - How to authenticate.
    pub fn new(endpoint: &str, credential: &Credential) -> Result<Self, AnnofabError> {
        let mut client = match credential {
            Credential::Pat(token) => Self::build(endpoint, format!("Bearer {token}"))?,
            Credential::IdPass { user_id, password } => {
                let mut client = Self::build(endpoint, String::new())?;
                let url = client.url(&["login"]);
                let response: LoginResponse = client.call(
                    "POST",
                    &url,
                    client.http.post(url.clone()).json(&LoginRequest { user_id, password }),
                )?;
                client.authorization = response.token.id_token;
                client
            }
        };

        let account: MyAccount = client.get(&["my", "account"])?;
        log::info!("logged in to {} as account {}", endpoint, account.account_id);
        client.account_id = account.account_id;
        Ok(client)
    }

    fn build(endpoint: &str, authorization: String) -> Result<Self, AnnofabError> {
        let api_url = Url::parse(&format!("{}/api/v1", endpoint.trim_end_matches('/')))
            .map_err(|e| AnnofabError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        if api_url.cannot_be_a_base() {
            return Err(AnnofabError::InvalidEndpoint(endpoint.to_string()));
        }

        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            authorization,
            account_id: String::new(),
        })
    }

    /// API URL of the given path segments, percent-encoded.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn send(&self, method: &str, url: &Url, request: RequestBuilder) -> Result<Response, AnnofabError> {
        log::debug!("{} {}", method, url);
        let request = if self.authorization.is_empty() {
            request
        } else {
            request.header(AUTHORIZATION, &self.authorization)
        };
        check_status(method, url, request.send()?)
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        url: &Url,
        request: RequestBuilder,
    ) -> Result<T, AnnofabError> {
        let text = self.send(method, url, request)?.text()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, AnnofabError> {
        let url = self.url(segments);
        self.call("GET", &url, self.http.get(url.clone()))
    }

    fn get_optional<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Option<T>, AnnofabError> {
        match self.get(segments) {
            Ok(value) => Ok(Some(value)),
            Err(AnnofabError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn put<B: Serialize, T: DeserializeOwned>(&self, segments: &[&str], body: &B) -> Result<T, AnnofabError> {
        let url = self.url(segments);
        self.call("PUT", &url, self.http.put(url.clone()).json(body))
    }
}

fn check_status(method: &str, url: &Url, response: Response) -> Result<Response, AnnofabError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(AnnofabError::Status {
        method: method.to_string(),
        url: url.to_string(),
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}

impl AnnotationService for AnnofabClient {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn create_temp_upload_slot(&self, project_id: &str) -> Result<TempUploadSlot, AnnofabError> {
        let url = self.url(&["projects", project_id, "create-temp-path"]);
        self.call("POST", &url, self.http.post(url.clone()))
    }

    fn put_temp_data(
        &self,
        slot: &TempUploadSlot,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AnnofabError> {
        let url = Url::parse(&slot.url)
            .map_err(|e| AnnofabError::InvalidEndpoint(format!("{}: {e}", slot.url)))?;
        log::debug!("PUT {} bytes as {}", data.len(), content_type);

        // pre-signed, must not carry our credentials
        let response = self
            .http
            .put(url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(data)
            .send()?;
        check_status("PUT", &url, response)?;
        Ok(())
    }

    fn get_input_data(
        &self,
        project_id: &str,
        input_data_id: &str,
    ) -> Result<Option<InputData>, AnnofabError> {
        self.get_optional(&["projects", project_id, "inputs", input_data_id])
    }

    fn register_input_data(
        &self,
        project_id: &str,
        input_data_id: &str,
        request: &InputDataRequest,
    ) -> Result<InputData, AnnofabError> {
        self.put(&["projects", project_id, "inputs", input_data_id], request)
    }

    fn get_supplementary_data_list(
        &self,
        project_id: &str,
        input_data_id: &str,
    ) -> Result<Vec<SupplementaryData>, AnnofabError> {
        self.get(&["projects", project_id, "inputs", input_data_id, "supplementary-data"])
    }

    fn register_supplementary_data(
        &self,
        project_id: &str,
        input_data_id: &str,
        supplementary_data_id: &str,
        request: &SupplementaryDataRequest,
    ) -> Result<SupplementaryData, AnnofabError> {
        self.put(
            &[
                "projects",
                project_id,
                "inputs",
                input_data_id,
                "supplementary-data",
                supplementary_data_id,
            ],
            request,
        )
    }

    fn get_project(&self, project_id: &str) -> Result<Project, AnnofabError> {
        self.get(&["projects", project_id])
    }

    fn generate_tasks_from_definition(
        &self,
        project_id: &str,
        request: &TaskGenerateRequest,
    ) -> Result<TaskGenerateResponse, AnnofabError> {
        let url = self.url(&["projects", project_id, "generate-tasks"]);
        self.call("POST", &url, self.http.post(url.clone()).json(request))
    }

    fn get_job(
        &self,
        project_id: &str,
        job_type: JobType,
        job_id: &str,
    ) -> Result<Option<JobInfo>, AnnofabError> {
        let url = self.url(&["projects", project_id, "jobs"]);
        let jobs: JobList = self.call(
            "GET",
            &url,
            self.http.get(url.clone()).query(&[("type", job_type.as_str())]),
        )?;
        Ok(jobs.list.into_iter().find(|job| job.job_id == job_id))
    }

    fn put_task(
        &self,
        project_id: &str,
        task_id: &str,
        input_data_ids: &[String],
    ) -> Result<Task, AnnofabError> {
        let request = TaskRequest {
            input_data_id_list: input_data_ids.to_vec(),
        };
        self.put(&["projects", project_id, "tasks", task_id], &request)
    }

    fn create_annotation(&self, annotations: &CuboidAnnotations) -> Result<(), AnnofabError> {
        let url = self.url(&[
            "projects",
            &annotations.project_id,
            "tasks",
            &annotations.task_id,
            "inputs",
            &annotations.input_data_id,
            "annotation",
        ]);
        self.send(
            "PUT",
            &url,
            self.http.put(url.clone()).query(&[("v", "2")]).json(annotations),
        )?;
        Ok(())
    }

    fn get_annotation_specs(&self, project_id: &str) -> Result<AnnotationSpecs, AnnofabError> {
        let url = self.url(&["projects", project_id, "annotation-specs"]);
        self.call("GET", &url, self.http.get(url.clone()).query(&[("v", "2")]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_segments_are_encoded() -> Result<(), AnnofabError> {
        let client = AnnofabClient::build("https://annofab.com/", String::new())?;
        assert_eq!(
            client.url(&["projects", "p1", "inputs", "scene 0/1"]).as_str(),
            "https://annofab.com/api/v1/projects/p1/inputs/scene%200%2F1"
        );
        assert_eq!(
            client.url(&["my", "account"]).as_str(),
            "https://annofab.com/api/v1/my/account"
        );
        Ok(())
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            AnnofabClient::build("not a url", String::new()),
            Err(AnnofabError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn test_credential_debug_hides_secrets() {
        let pat = format!("{:?}", Credential::Pat("secret-token".to_string()));
        assert!(!pat.contains("secret-token"));

        let id_pass = format!(
            "{:?}",
            Credential::IdPass {
                user_id: "alice".to_string(),
                password: "hunter2".to_string(),
            }
        );
        assert!(id_pass.contains("alice"));
        assert!(!id_pass.contains("hunter2"));
    }
}

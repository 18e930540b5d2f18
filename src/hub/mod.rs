//! Client for the edge ML backend.
//!
//! [`HubApi`] is the seam between the console engine and the network: the
//! engine only ever talks to `Arc<dyn HubApi>`, so scenarios can run against
//! a scripted backend. [`HttpHubApi`] is the reqwest implementation.

mod error;
mod types;

pub use error::*;
pub use types::*;

use crate::config::BackendConfig;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Every backend call the console makes.
#[async_trait]
pub trait HubApi: Send + Sync {
    /// Liveness probe against the server root.
    async fn health(&self) -> Result<(), ApiError>;

    async fn system_info(&self) -> Result<SystemInfo, ApiError>;

    /// Authenticate with a hub API token.
    async fn connect(&self, token: &str) -> Result<UserInfo, ApiError>;

    async fn start_server(&self) -> Result<ServerStartResponse, ApiError>;

    async fn hub_status(&self) -> Result<HubStatus, ApiError>;

    async fn upload(
        &self,
        object_name: &str,
        files: &[ImageFile],
    ) -> Result<UploadResponse, ApiError>;

    /// Start a training run. Returns the training id.
    async fn execute_notebook(&self, request: &ExecuteNotebookRequest) -> Result<String, ApiError>;

    async fn training_status(&self, training_id: &str) -> Result<OperationStatus, ApiError>;

    /// Start a deployment. Returns the deployment id.
    async fn start_deployment(&self, model_type: &str) -> Result<String, ApiError>;

    async fn deployment_status(&self, deployment_id: &str) -> Result<OperationStatus, ApiError>;

    async fn start_stream(&self) -> Result<StreamStartResponse, ApiError>;

    async fn stop_stream(&self) -> Result<StreamStopResponse, ApiError>;
}

/// reqwest-backed [`HubApi`].
pub struct HttpHubApi {
    client: reqwest::Client,
    backend: BackendConfig,
    probe_timeout: Duration,
}

impl HttpHubApi {
    /// Create a client for `backend`. `probe_timeout` bounds only the
    /// liveness probe; other requests use the optional client-wide timeout.
    pub fn new(backend: BackendConfig, probe_timeout: Duration) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = backend.request_timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(ApiError::from_reqwest)?;
        Ok(Self::with_client(backend, probe_timeout, client))
    }

    /// Create a client with a custom reqwest client (for testing).
    pub fn with_client(
        backend: BackendConfig,
        probe_timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            backend,
            probe_timeout,
        }
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .get(self.backend.api_url(path))
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .client
            .post(self.backend.api_url(path))
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.backend.api_url(path))
            .json(body)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        decode(response).await
    }
}

/// Turn a response into `T`, mapping non-2xx statuses to [`ApiError::Http`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::from_status(status.as_u16(), &body));
    }

    let body = response.text().await.map_err(ApiError::from_reqwest)?;
    serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

#[async_trait]
impl HubApi for HttpHubApi {
    async fn health(&self) -> Result<(), ApiError> {
        let url = format!("{}/health", self.backend.base_url());
        let response = self
            .client
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        Ok(())
    }

    async fn system_info(&self) -> Result<SystemInfo, ApiError> {
        self.get("/system/info").await
    }

    async fn connect(&self, token: &str) -> Result<UserInfo, ApiError> {
        let response: ConnectResponse = self
            .post_json("/jupyterhub/connect", &ConnectRequest { token })
            .await?;
        Ok(response.user_info)
    }

    async fn start_server(&self) -> Result<ServerStartResponse, ApiError> {
        self.post("/jupyterhub/start-server").await
    }

    async fn hub_status(&self) -> Result<HubStatus, ApiError> {
        self.get("/jupyterhub/status").await
    }

    async fn upload(
        &self,
        object_name: &str,
        files: &[ImageFile],
    ) -> Result<UploadResponse, ApiError> {
        let mut form = reqwest::multipart::Form::new().text("object_name", object_name.to_string());

        for file in files {
            let bytes = tokio::fs::read(&file.path)
                .await
                .map_err(|e| ApiError::File {
                    path: file.path.display().to_string(),
                    message: e.to_string(),
                })?;
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(file.file_name())
                .mime_str(&file.mime)
                .map_err(ApiError::from_reqwest)?;
            form = form.part("files", part);
        }

        tracing::debug!(object_name, files = files.len(), "Uploading training images");

        let response = self
            .client
            .post(self.backend.api_url("/training/upload"))
            .multipart(form)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;
        decode(response).await
    }

    async fn execute_notebook(&self, request: &ExecuteNotebookRequest) -> Result<String, ApiError> {
        let response: TrainingStartResponse = self
            .post_json("/training/execute-notebook", request)
            .await?;
        Ok(response.training_id)
    }

    async fn training_status(&self, training_id: &str) -> Result<OperationStatus, ApiError> {
        self.get(&format!("/training/status/{}", training_id)).await
    }

    async fn start_deployment(&self, model_type: &str) -> Result<String, ApiError> {
        let response: DeploymentStartResponse = self
            .post_json("/deployment/start", &DeploymentRequest { model_type })
            .await?;
        Ok(response.deployment_id)
    }

    async fn deployment_status(&self, deployment_id: &str) -> Result<OperationStatus, ApiError> {
        self.get(&format!("/deployment/status/{}", deployment_id))
            .await
    }

    async fn start_stream(&self) -> Result<StreamStartResponse, ApiError> {
        self.post("/stream/start").await
    }

    async fn stop_stream(&self) -> Result<StreamStopResponse, ApiError> {
        self.post("/stream/stop").await
    }
}

use crate::error::{LabelerError, Result};
use crate::upload::UploadReport;
use reqwest::multipart::{Form, Part};
use std::path::PathBuf;

/// Sends exported files to an upload endpoint
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl UploadClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), endpoint: endpoint.into(), token: token.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Upload `paths` as `file0`, `file1`, ... together with the token.
    ///
    /// A non-2xx answer becomes [`LabelerError::Upload`] carrying the endpoint's text.
    pub async fn upload(&self, paths: &[PathBuf]) -> Result<UploadReport> {
        let mut form = Form::new().text("token", self.token.clone());

        for (index, path) in paths.iter().enumerate() {
            let data = tokio::fs::read(path).await.map_err(|e| LabelerError::io(path, e))?;
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("file{}", index));

            form = form.part(format!("file{}", index), Part::bytes(data).file_name(file_name));
        }

        log::info!("Uploading {} file(s) to {}", paths.len(), self.endpoint);
        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| LabelerError::UploadTransport(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| LabelerError::UploadTransport(e.to_string()))?;

        if !status.is_success() {
            return Err(LabelerError::Upload { status: status.as_u16(), body });
        }

        UploadReport::parse(&body)
            .ok_or_else(|| LabelerError::UploadTransport(format!("Unexpected response from endpoint: {:?}", body)))
    }
}

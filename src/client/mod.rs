mod normalize;
mod validate;

pub use normalize::normalize_response;
pub use validate::{validate, ACCEPTED_EXTENSIONS, MAX_FILE_SIZE, MAX_TOTAL_SIZE};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{UploadError, UploadResult};
use crate::ids::generate_reference_id;
use crate::models::{FileAttachment, SubmissionForm, SubmissionRequest, SubmissionResult};

const MOCK_FALLBACK_DELAY: Duration = Duration::from_secs(1);

/// Drives one submission end to end: connectivity precheck, validation,
/// reference id generation, multipart upload, response normalization and
/// the bounded retry policy.
pub struct AssignmentClient {
    client: Client,
    config: ClientConfig,
}

impl AssignmentClient {
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self { client, config }
    }

    /// Submits one assignment. Exactly one result or error comes back per
    /// call; validation failures leave the caller's data untouched for
    /// correction and resubmission.
    pub async fn submit(
        &self,
        form: SubmissionForm,
        files: Vec<FileAttachment>,
    ) -> UploadResult<SubmissionResult> {
        self.check_connection().await?;
        validate(&files, &form)?;

        // One id per submit action, quoted to the user no matter how many
        // physical attempts happen underneath.
        let request = SubmissionRequest {
            reference_id: generate_reference_id(),
            form,
            files,
        };

        let total_bytes: u64 = request.files.iter().map(|f| f.size_bytes).sum();
        info!(
            reference_id = %request.reference_id,
            files = request.files.len(),
            total_mb = total_bytes as f64 / 1024.0 / 1024.0,
            "sending submission to webhook"
        );

        self.send_with_retries(&request).await
    }

    /// Cheap connectivity probe before any validation or upload work: if
    /// the webhook host does not resolve, the network is treated as down.
    async fn check_connection(&self) -> UploadResult<()> {
        let url = Url::parse(&self.config.webhook_url)
            .map_err(|e| UploadError::Network(format!("invalid webhook URL: {}", e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| UploadError::Network("webhook URL has no host".to_string()))?;
        let port = url.port_or_known_default().unwrap_or(443);

        tokio::net::lookup_host((host, port))
            .await
            .map_err(|_| UploadError::Offline)?;
        Ok(())
    }

    async fn send_with_retries(&self, request: &SubmissionRequest) -> UploadResult<SubmissionResult> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        let last_error = loop {
            match self.send_once(request).await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt >= max_retries {
                        break e;
                    }
                    attempt += 1;
                    warn!(
                        reference_id = %request.reference_id,
                        error = %e,
                        "Connection issue. Retrying ({}/{})...",
                        attempt,
                        max_retries
                    );
                    tokio::time::sleep(self.config.retry_delay).await;
                }
            }
        };

        if self.config.enable_mock_fallback {
            warn!(
                reference_id = %request.reference_id,
                "all attempts failed, using development fallback response"
            );
            return Ok(self.mock_fallback(&request.reference_id).await);
        }

        Err(last_error)
    }

    /// One physical POST. Retries reuse this with the same reference id and
    /// an identical body; validation is never re-run.
    async fn send_once(&self, request: &SubmissionRequest) -> UploadResult<SubmissionResult> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .header("Accept", "application/json")
            // Content-Type stays with reqwest so it can append the
            // multipart boundary.
            .multipart(build_multipart(request))
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    UploadError::Timeout
                } else {
                    UploadError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        normalize_response(status, &body, &request.reference_id)
    }

    /// Development-only synthetic success, so the submission flow can be
    /// exercised without a reachable webhook.
    async fn mock_fallback(&self, reference_id: &str) -> SubmissionResult {
        tokio::time::sleep(MOCK_FALLBACK_DELAY).await;
        SubmissionResult {
            success: true,
            message: "Assignment received successfully".to_string(),
            reference_id: reference_id.to_string(),
            expected_response_time: "within 1 hour".to_string(),
        }
    }
}

/// Builds the multipart body: each file as a positional `file<N>` binary
/// part plus `file<N>_name` / `file<N>_type` / `file<N>_size` companion
/// fields. The receiving side cannot always recover name, type and size
/// from the binary part alone, so they travel redundantly as plain fields.
fn build_multipart(request: &SubmissionRequest) -> Form {
    let mut form = Form::new();

    for (index, file) in request.files.iter().enumerate() {
        let field = format!("file{}", index);
        let part = Part::bytes(file.content.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .unwrap_or_else(|_| {
                Part::bytes(file.content.clone()).file_name(file.name.clone())
            });

        form = form
            .part(field.clone(), part)
            .text(format!("{}_name", field), file.name.clone())
            .text(format!("{}_type", field), file.mime_type.clone())
            .text(format!("{}_size", field), file.size_bytes.to_string());
    }

    let deadline = request
        .form
        .deadline
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();

    form.text("subject", request.form.subject.clone())
        .text("academicLevel", request.form.academic_level.clone())
        .text("pageCount", request.form.page_count.clone())
        .text("deadline", deadline)
        .text("instructions", request.form.instructions.clone())
        .text("email", request.form.email.clone())
        .text("fileCount", request.files.len().to_string())
        .text("referenceId", request.reference_id.clone())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subjects offered by the upload form. Informational only; validation just
/// requires a non-empty subject.
pub const SUBJECTS: &[&str] = &[
    "business",
    "computer-science",
    "engineering",
    "humanities",
    "mathematics",
    "medicine",
    "science",
    "social-sciences",
    "other",
];

pub const ACADEMIC_LEVELS: &[&str] = &["high-school", "undergraduate", "masters", "phd"];

/// One attached file, held in memory until the submission succeeds.
#[derive(Debug, Clone)]
pub struct FileAttachment {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub content: Vec<u8>,
}

impl FileAttachment {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = mime_guess::from_path(&name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Self {
            mime_type,
            size_bytes: content.len() as u64,
            name,
            content,
        }
    }
}

/// User-entered scalar fields of the upload form.
#[derive(Debug, Clone, Default)]
pub struct SubmissionForm {
    pub subject: String,
    pub academic_level: String,
    pub page_count: String,
    pub deadline: Option<DateTime<Utc>>,
    pub instructions: String,
    pub email: String,
}

/// A validated submission, ready to send. Built only after the validation
/// rules pass; the reference id is fixed for the lifetime of the request,
/// including retries.
#[derive(Debug)]
pub struct SubmissionRequest {
    pub reference_id: String,
    pub form: SubmissionForm,
    pub files: Vec<FileAttachment>,
}

/// The one canonical result shape the caller ever sees, whatever the
/// webhook actually returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub expected_response_time: String,
}

impl SubmissionResult {
    /// Degraded or array-shaped responses carry no trustworthy payload, so
    /// the result is synthesized around the client-generated reference id.
    pub fn accepted(reference_id: &str, message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            reference_id: reference_id.to_string(),
            expected_response_time: "within 1 hour".to_string(),
        }
    }
}

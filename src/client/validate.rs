use regex::Regex;
use std::sync::OnceLock;

use crate::error::{UploadError, UploadResult};
use crate::models::{FileAttachment, SubmissionForm};

pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const MAX_TOTAL_SIZE: u64 = 50 * 1024 * 1024;
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx"];

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn extension(name: &str) -> Option<String> {
    name.rsplit('.').next().map(|ext| ext.to_lowercase())
}

/// Runs the validation rules in their fixed order, stopping at the first
/// failure. Only the first problem is reported; the caller keeps the form
/// and files intact so the user can correct and resubmit.
pub fn validate(files: &[FileAttachment], form: &SubmissionForm) -> UploadResult<()> {
    if files.is_empty() {
        return Err(UploadError::NoFiles);
    }

    let mut total_size: u64 = 0;
    for file in files {
        total_size += file.size_bytes;

        if file.size_bytes > MAX_FILE_SIZE {
            return Err(UploadError::FileTooLarge {
                name: file.name.clone(),
            });
        }

        let ext = extension(&file.name).unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(UploadError::UnsupportedFormat {
                name: file.name.clone(),
            });
        }

        if file.size_bytes == 0 {
            return Err(UploadError::EmptyFile {
                name: file.name.clone(),
            });
        }
    }

    if total_size > MAX_TOTAL_SIZE {
        return Err(UploadError::TotalSizeExceeded {
            total_mb: total_size as f64 / 1024.0 / 1024.0,
        });
    }

    if form.subject.is_empty() {
        return Err(UploadError::MissingSubject);
    }

    if form.academic_level.is_empty() {
        return Err(UploadError::MissingLevel);
    }

    if form.deadline.is_none() {
        return Err(UploadError::MissingDeadline);
    }

    if form.email.is_empty() || !email_re().is_match(&form.email) {
        return Err(UploadError::InvalidEmail);
    }

    Ok(())
}

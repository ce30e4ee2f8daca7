use thiserror::Error;

/// Errors produced by the submission pipeline.
///
/// The first nine variants are validation failures detected before any
/// network activity; the rest come from the transport or the webhook.
/// Display strings double as the user-facing messages shown in the form.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please upload at least one file")]
    NoFiles,

    #[error("File {name} exceeds the maximum size of 10MB")]
    FileTooLarge { name: String },

    #[error("File {name} is not an acceptable format. Please use PDF, DOC, or DOCX")]
    UnsupportedFormat { name: String },

    #[error("File {name} appears to be empty or corrupted")]
    EmptyFile { name: String },

    #[error("Total file size ({total_mb:.1}MB) exceeds the maximum of 50MB. Please reduce the size or number of files.")]
    TotalSizeExceeded { total_mb: f64 },

    #[error("Please select a subject")]
    MissingSubject,

    #[error("Please select an academic level")]
    MissingLevel,

    #[error("Please select a deadline")]
    MissingDeadline,

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please check your internet connection and try again.")]
    Offline,

    #[error("Request timed out. The server took too long to respond.")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Server error ({status}): {body}")]
    Server { status: u16, body: String },

    /// Shape B response with `success: false`; the server's own message is
    /// surfaced verbatim.
    #[error("{0}")]
    ServerRejected(String),

    #[error("Could not process server response. Please try again later.")]
    MalformedResponse,
}

impl UploadError {
    /// Validation errors are terminal for the attempt and never retried;
    /// everything else goes through the retry policy first.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::NoFiles
                | UploadError::FileTooLarge { .. }
                | UploadError::UnsupportedFormat { .. }
                | UploadError::EmptyFile { .. }
                | UploadError::TotalSizeExceeded { .. }
                | UploadError::MissingSubject
                | UploadError::MissingLevel
                | UploadError::MissingDeadline
                | UploadError::InvalidEmail
        )
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

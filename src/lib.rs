pub mod client;
pub mod config;
pub mod discovery;
pub mod error;
pub mod ids;
pub mod models;
pub mod routes;

pub use client::AssignmentClient;
pub use config::{ClientConfig, Config};
pub use error::{UploadError, UploadResult};
pub use models::{FileAttachment, SubmissionForm, SubmissionRequest, SubmissionResult};

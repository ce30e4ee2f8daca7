//! Command-line submission tool: drives the assignment client against a
//! webhook URL. Intended for manual testing of a deployed receiver.
//!
//! Usage:
//!   submit <file> [<file>...]
//!
//! Form fields come from the environment: SUBJECT, ACADEMIC_LEVEL,
//! PAGE_COUNT, DEADLINE (RFC 3339), INSTRUCTIONS, EMAIL, WEBHOOK_URL,
//! ENABLE_MOCK_FALLBACK.

use chrono::{DateTime, Duration, Utc};

use assignmentace::config::Config;
use assignmentace::models::{FileAttachment, SubmissionForm, ACADEMIC_LEVELS, SUBJECTS};
use assignmentace::AssignmentClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "assignmentace=info".into()),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: submit <file> [<file>...]");
        eprintln!("subjects: {}", SUBJECTS.join(", "));
        eprintln!("levels:   {}", ACADEMIC_LEVELS.join(", "));
        std::process::exit(2);
    }

    let mut files = Vec::new();
    for path in &paths {
        let content = std::fs::read(path)?;
        let name = std::path::Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path)
            .to_string();
        files.push(FileAttachment::new(name, content));
    }

    let deadline = match std::env::var("DEADLINE") {
        Ok(raw) => Some(DateTime::parse_from_rfc3339(&raw)?.with_timezone(&Utc)),
        Err(_) => Some(Utc::now() + Duration::days(7)),
    };

    let form = SubmissionForm {
        subject: std::env::var("SUBJECT").unwrap_or_else(|_| "other".to_string()),
        academic_level: std::env::var("ACADEMIC_LEVEL")
            .unwrap_or_else(|_| "undergraduate".to_string()),
        page_count: std::env::var("PAGE_COUNT").unwrap_or_default(),
        deadline,
        instructions: std::env::var("INSTRUCTIONS").unwrap_or_default(),
        email: std::env::var("EMAIL").unwrap_or_default(),
    };

    let config = Config::from_env()?;
    let client = AssignmentClient::new(config.client);

    match client.submit(form, files).await {
        Ok(result) => {
            println!("Submitted. Reference ID: {}", result.reference_id);
            println!("{} ({})", result.message, result.expected_response_time);
            Ok(())
        }
        Err(e) => {
            eprintln!("Submission failed: {}", e);
            std::process::exit(1);
        }
    }
}

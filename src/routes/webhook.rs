use axum::extract::Multipart;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::discovery::{run_discovery, BinaryPart, ParsedRequest};
use crate::ids::fallback_reference_id;

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "assignmentace-webhook",
    }))
}

/// Webhook receiver for assignment submissions. The contract is
/// "acknowledge and report": every request gets HTTP 200 with a discovery
/// report; malformed or missing file data degrades to a diagnostic
/// mismatch, never a rejection.
pub async fn receive_upload(headers: HeaderMap, multipart: Multipart) -> Json<Value> {
    let parsed = parse_request(&headers, multipart).await;

    let expected_count: usize = parsed
        .first_field("fileCount")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let report = run_discovery(&parsed, expected_count);

    if report.detected_count != report.expected_count {
        warn!(
            expected = report.expected_count,
            detected = report.detected_count,
            "file count mismatch in submission"
        );
    }

    let reference_id = match parsed.first_field("referenceId") {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => fallback_reference_id(),
    };

    info!(
        reference_id = %reference_id,
        files = report.detected_count,
        "acknowledging submission"
    );

    let names: Vec<String> = report
        .detected_files
        .iter()
        .map(|f| f.name.clone())
        .collect();

    let uploaded_files = if names.is_empty() {
        json!(["No files detected"])
    } else {
        json!(names.clone())
    };

    // Binary parts are echoed as metadata so a downstream step could fetch
    // and persist them; raw bytes are not serialized into the JSON ack.
    let binary_echo: Value = parsed
        .binary
        .iter()
        .map(|part| {
            (
                part.field_name.clone(),
                json!({
                    "fileName": part.file_name,
                    "mimeType": part.mime_type,
                    "sizeBytes": part.data.len(),
                }),
            )
        })
        .collect::<serde_json::Map<_, _>>()
        .into();

    Json(json!({
        "success": true,
        "referenceId": reference_id,
        "message": "Assignment uploaded successfully",
        "timestamp": Utc::now().to_rfc3339(),
        "formData": {
            "subject": field_or(&parsed, "subject", "Not specified"),
            "academicLevel": field_or(&parsed, "academicLevel", "Not specified"),
            "pageCount": field_or(&parsed, "pageCount", "Not specified"),
            "deadline": field_or(&parsed, "deadline", "Not specified"),
            "instructions": field_or(&parsed, "instructions", "None"),
            "email": field_or(&parsed, "email", "Not provided"),
            "fileCount": field_or(&parsed, "fileCount", "0"),
            "uploadedFiles": uploaded_files,
        },
        "files": {
            "count": report.detected_count,
            "names": names,
            "hasBinaryData": report.has_binary_payload,
            "diagnostics": {
                "expectedFileCount": report.expected_count,
                "detectedFileCount": report.detected_count,
                "hasBinaryData": report.has_binary_payload,
                "detectedFileKeys": parsed.detected_file_keys(),
                "contentType": parsed.content_type.clone(),
                "bodyKeys": report.body_field_names,
            },
            "detected": report.detected_files,
        },
        "binary": binary_echo,
    }))
}

fn field_or(parsed: &ParsedRequest, name: &str, default: &str) -> String {
    match parsed.first_field(name) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

/// Reads the multipart stream into the uniform request view the detection
/// passes operate on: parts carrying a filename become binary parts,
/// everything else lands in the scalar-field map.
async fn parse_request(headers: &HeaderMap, mut multipart: Multipart) -> ParsedRequest {
    let mut parsed = ParsedRequest {
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string(),
        ..ParsedRequest::default()
    };

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);
        let mime_type = field.content_type().map(str::to_string);

        if file_name.is_some() {
            if let Ok(data) = field.bytes().await {
                parsed.binary.push(BinaryPart {
                    field_name: name,
                    file_name,
                    mime_type,
                    data: data.to_vec(),
                });
            }
        } else if let Ok(text) = field.text().await {
            parsed.push_field(name, text);
        }
    }

    parsed
}

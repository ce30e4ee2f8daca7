use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{UploadError, UploadResult};
use crate::models::SubmissionResult;

/// Reduces one webhook response to the canonical result shape.
///
/// Three body variants are recognized:
/// - a JSON array (workflow-engine convention): element 0 proves the
///   workflow ran, but nothing inside it is trusted; the client-generated
///   reference id wins.
/// - a JSON object: taken directly as a `SubmissionResult`; `success:false`
///   surfaces the server's own message.
/// - anything unparseable with a 2xx status: degraded success, since the
///   transport confirmed receipt even though the content did not parse.
///
/// Non-2xx statuses fail immediately with the status and body text.
pub fn normalize_response(
    status: u16,
    body: &str,
    reference_id: &str,
) -> UploadResult<SubmissionResult> {
    if !(200..300).contains(&status) {
        return Err(UploadError::Server {
            status,
            body: body.to_string(),
        });
    }

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => {
            debug!(elements = items.len(), "array-shaped webhook response");
            Ok(SubmissionResult::accepted(
                reference_id,
                "Assignment submitted successfully",
            ))
        }
        Ok(value @ Value::Object(_)) => {
            let mut result: SubmissionResult = serde_json::from_value(value)
                .map_err(|_| UploadError::MalformedResponse)?;
            if !result.success {
                let message = if result.message.is_empty() {
                    "The server reported an error with your submission".to_string()
                } else {
                    result.message
                };
                return Err(UploadError::ServerRejected(message));
            }
            if result.reference_id.is_empty() {
                result.reference_id = reference_id.to_string();
            }
            Ok(result)
        }
        _ => {
            // 2xx with a body we cannot use: the upload itself went through.
            warn!(status, "unparseable webhook response, treating as received");
            Ok(SubmissionResult::accepted(
                reference_id,
                "Assignment submitted successfully",
            ))
        }
    }
}

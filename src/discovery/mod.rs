use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

/// One binary part of the parsed multipart request, as surfaced by the
/// HTTP framework.
#[derive(Debug, Clone)]
pub struct BinaryPart {
    pub field_name: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// Uniform view of one inbound webhook request: the scalar-field map plus
/// the binary parts. All detection passes operate over this structure.
#[derive(Debug, Default)]
pub struct ParsedRequest {
    pub content_type: String,
    /// Scalar fields; repeated field names accumulate values in order.
    pub fields: BTreeMap<String, Vec<String>>,
    pub binary: Vec<BinaryPart>,
}

impl ParsedRequest {
    pub fn push_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.entry(name.into()).or_default().push(value.into());
    }

    pub fn first_field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn body_keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Body field names starting with `file`, reported in diagnostics.
    pub fn detected_file_keys(&self) -> Vec<String> {
        self.fields
            .keys()
            .filter(|k| k.starts_with("file"))
            .cloned()
            .collect()
    }
}

/// Which detection pass produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DetectionSource {
    #[serde(rename = "binary")]
    Binary,
    #[serde(rename = "body.file-array")]
    BodyFileArray,
    #[serde(rename = "body.file-single")]
    BodyFileSingle,
    #[serde(rename = "metadata")]
    Metadata,
    #[serde(rename = "body.fileN")]
    BodyFileN,
    #[serde(rename = "data.files")]
    DataFiles,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetectedFile {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(rename = "size", skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub source: DetectionSource,
}

/// Result of running all detection passes over one request. Built fresh
/// per request, folded into the acknowledgement, then dropped.
#[derive(Debug)]
pub struct FileDiscoveryReport {
    pub detected_files: Vec<DetectedFile>,
    pub expected_count: usize,
    pub detected_count: usize,
    pub has_binary_payload: bool,
    pub body_field_names: Vec<String>,
}

/// The passes run in this order, unconditionally: different client
/// versions and proxies populate different shapes, sometimes several at
/// once, so detections accumulate instead of short-circuiting. A new
/// shape means appending one more function here.
const DETECTION_PASSES: &[fn(&ParsedRequest) -> Vec<DetectedFile>] = &[
    detect_binary_parts,
    detect_generic_file_field,
    detect_metadata_triples,
    detect_legacy_fields,
    detect_nested_data_files,
];

/// Runs the five detection passes and cross-checks the outcome against the
/// client-declared file count. A mismatch is diagnostic information, never
/// a rejection; the heuristics are known to be imperfect.
pub fn run_discovery(parsed: &ParsedRequest, expected_count: usize) -> FileDiscoveryReport {
    let mut seen = HashSet::new();
    let mut detected = Vec::new();

    for pass in DETECTION_PASSES {
        for file in pass(parsed) {
            // Name collisions across passes keep the first-seen entry.
            if seen.insert(file.name.clone()) {
                detected.push(file);
            }
        }
    }

    debug!(
        expected = expected_count,
        detected = detected.len(),
        "file discovery complete"
    );

    FileDiscoveryReport {
        detected_count: detected.len(),
        detected_files: detected,
        expected_count,
        has_binary_payload: !parsed.binary.is_empty(),
        body_field_names: parsed.body_keys(),
    }
}

/// Pass 1: binary attachments surfaced by the multipart parser. The
/// richest shape for actual content; name, type and size come straight
/// from the part metadata.
fn detect_binary_parts(parsed: &ParsedRequest) -> Vec<DetectedFile> {
    parsed
        .binary
        .iter()
        .map(|part| DetectedFile {
            name: part
                .file_name
                .clone()
                .unwrap_or_else(|| part.field_name.clone()),
            mime_type: Some(
                part.mime_type
                    .clone()
                    .unwrap_or_else(|| "unknown".to_string()),
            ),
            size_bytes: Some(part.data.len() as u64),
            source: DetectionSource::Binary,
        })
        .collect()
}

/// Pass 2: a scalar field literally named `file`. No real filename is
/// recoverable from this shape, so names are synthesized positionally.
fn detect_generic_file_field(parsed: &ParsedRequest) -> Vec<DetectedFile> {
    let Some(values) = parsed.fields.get("file") else {
        return Vec::new();
    };

    if values.len() > 1 {
        (0..values.len())
            .map(|index| DetectedFile {
                name: format!("file-{}", index),
                mime_type: None,
                size_bytes: None,
                source: DetectionSource::BodyFileArray,
            })
            .collect()
    } else {
        vec![DetectedFile {
            name: "file".to_string(),
            mime_type: None,
            size_bytes: None,
            source: DetectionSource::BodyFileSingle,
        }]
    }
}

fn metadata_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^file_(\d+)_name$").unwrap())
}

/// Pass 3: indexed `file_<N>_name` / `file_<N>_type` / `file_<N>_size`
/// triples, the redundant metadata our own composer sends alongside each
/// binary part. The richest signal when binary parts are stripped.
fn detect_metadata_triples(parsed: &ParsedRequest) -> Vec<DetectedFile> {
    let mut entries: Vec<(usize, DetectedFile)> = Vec::new();

    for key in parsed.fields.keys() {
        let Some(caps) = metadata_name_re().captures(key) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };

        let name = parsed.first_field(key).unwrap_or_default();
        if name.is_empty() {
            continue;
        }

        let mime_type = parsed
            .first_field(&format!("file_{}_type", index))
            .map(str::to_string);
        let size_bytes = parsed
            .first_field(&format!("file_{}_size", index))
            .and_then(|s| s.parse::<u64>().ok())
            .or(Some(0));

        entries.push((
            index,
            DetectedFile {
                name: name.to_string(),
                mime_type,
                size_bytes,
                source: DetectionSource::Metadata,
            },
        ));
    }

    entries.sort_by_key(|(index, _)| *index);
    entries.into_iter().map(|(_, file)| file).collect()
}

fn legacy_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^file(\d+)$").unwrap())
}

/// Pass 4: bare `file<N>` scalar fields, kept for an older client
/// convention that sent file content as plain form fields.
fn detect_legacy_fields(parsed: &ParsedRequest) -> Vec<DetectedFile> {
    let mut entries: Vec<(usize, DetectedFile)> = Vec::new();

    for (key, values) in &parsed.fields {
        let Some(caps) = legacy_field_re().captures(key) else {
            continue;
        };
        let Ok(index) = caps[1].parse::<usize>() else {
            continue;
        };
        if values.iter().all(|v| v.is_empty()) {
            continue;
        }

        entries.push((
            index,
            DetectedFile {
                name: key.clone(),
                mime_type: None,
                size_bytes: None,
                source: DetectionSource::BodyFileN,
            },
        ));
    }

    entries.sort_by_key(|(index, _)| *index);
    entries.into_iter().map(|(_, file)| file).collect()
}

/// Pass 5: a `data` field carrying a JSON document with a nested `files`
/// array, as produced by some proxy configurations.
fn detect_nested_data_files(parsed: &ParsedRequest) -> Vec<DetectedFile> {
    let Some(raw) = parsed.first_field("data") else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };
    let Some(files) = value.get("files").and_then(Value::as_array) else {
        return Vec::new();
    };

    files
        .iter()
        .map(|entry| DetectedFile {
            name: entry
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or("unnamed file")
                .to_string(),
            mime_type: None,
            size_bytes: None,
            source: DetectionSource::DataFiles,
        })
        .collect()
}

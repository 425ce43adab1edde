use crate::DomainResult;
use crate::error::DomainError;
use crate::requests::DocType;

pub const MAX_RESPONSE_FILE_BYTES: u64 = 50 * 1024 * 1024;
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/pdf",
];

const STORAGE_PREFIX: &str = "adoption-requests";

#[derive(Clone, Debug)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Uniform gate for adopter-supplied uploads. Every file is checked before
/// the first upload call; a gate failure aborts the whole batch.
#[derive(Clone, Debug)]
pub struct FileGate {
    max_bytes: u64,
}

impl Default for FileGate {
    fn default() -> Self {
        Self {
            max_bytes: MAX_RESPONSE_FILE_BYTES,
        }
    }
}

impl FileGate {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn validate(&self, file: &UploadFile) -> DomainResult<()> {
        let size_bytes = file.bytes.len() as u64;
        if size_bytes == 0 {
            return Err(DomainError::EmptyFile);
        }
        if size_bytes > self.max_bytes {
            return Err(DomainError::FileTooLarge {
                size_bytes,
                max_bytes: self.max_bytes,
            });
        }
        let content_type = file.content_type.trim().to_ascii_lowercase();
        if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
            return Err(DomainError::InvalidFileType(file.content_type.clone()));
        }
        Ok(())
    }

    pub fn validate_all(&self, files: &[UploadFile]) -> DomainResult<()> {
        for file in files {
            self.validate(file)?;
        }
        Ok(())
    }
}

/// Deterministic write path. The signed-URL read side parses foundation and
/// request ids back out of this exact shape, so the two must never drift.
pub fn storage_path(
    foundation_id: i64,
    request_id: i64,
    doc_type: DocType,
    timestamp_ms: i64,
    file_name: &str,
) -> String {
    format!(
        "{STORAGE_PREFIX}/{foundation_id}/{request_id}/{}-{timestamp_ms}-{}",
        doc_type.as_str(),
        sanitize_file_name(file_name)
    )
}

pub fn parse_storage_path(path: &str) -> Option<(i64, i64)> {
    let rest = path.strip_prefix(STORAGE_PREFIX)?.strip_prefix('/')?;
    let mut segments = rest.splitn(3, '/');
    let foundation_id = segments.next()?.parse().ok()?;
    let request_id = segments.next()?.parse().ok()?;
    segments.next()?;
    Some((foundation_id, request_id))
}

pub fn sanitize_file_name(file_name: &str) -> String {
    let sanitized: String = file_name
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_matches(|ch| ch == '.' || ch == '_');
    if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized.to_string()
    }
}

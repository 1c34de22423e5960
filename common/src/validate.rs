use crate::data::CandidateFile;

/// 100 MiB upload cap.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Mime types the backend accepts. Exact matches only.
pub const ALLOWED_TYPES: [&str; 4] = [
    "video/mp4",
    "video/webm",
    "video/ogg",
    "video/quicktime",
];

pub const TYPE_MESSAGE: &str = "Please select a valid video file (MP4, WebM, OGG, or MOV)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(String),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

pub fn size_in_mib(size: u64) -> f64 {
    size as f64 / (1024.0 * 1024.0)
}

pub fn oversize_message(size: u64) -> String {
    format!(
        "File size must be less than 100MB. Your file is {:.2}MB",
        size_in_mib(size)
    )
}

/// Classifies a candidate. Rules run in order and the first failure wins:
/// size cap, then mime type. Pure and deterministic.
pub fn validate(file: &CandidateFile) -> ValidationOutcome {
    if file.size > MAX_FILE_SIZE {
        return ValidationOutcome::Rejected(oversize_message(file.size));
    }
    if !ALLOWED_TYPES.contains(&file.mime_type.as_str()) {
        return ValidationOutcome::Rejected(TYPE_MESSAGE.to_string());
    }
    ValidationOutcome::Accepted
}

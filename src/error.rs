use thiserror::Error;

pub type Result<T> = std::result::Result<T, GhoursError>;

/// Fixed message shown whenever the history source cannot be read.
pub const SOURCE_UNAVAILABLE_MSG: &str =
    "error running git log; make sure this is a valid git repository";

#[derive(Error, Debug)]
pub enum GhoursError {
    #[error("{}{}", SOURCE_UNAVAILABLE_MSG, detail_suffix(.detail))]
    SourceUnavailable { detail: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),
    #[error("Estimated time for '{0}' overflowed; lower --base-commit-time or --session-threshold")]
    DurationOverflow(String),
    #[error("Invalid range: since ({since}) is after until ({until})")]
    InvalidRange { since: String, until: String },
}

impl GhoursError {
    pub fn source_unavailable(detail: impl Into<String>) -> Self {
        GhoursError::SourceUnavailable { detail: detail.into() }
    }
}

fn detail_suffix(detail: &str) -> String {
    let detail = detail.trim();
    if detail.is_empty() {
        String::new()
    } else {
        format!(" ({detail})")
    }
}

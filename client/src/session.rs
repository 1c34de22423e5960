use std::{error::Error, fmt};

use common::{
    data::CandidateFile,
    payloads::ErrorBody,
    validate::{validate, ValidationOutcome},
};
use reqwest::{multipart, Body, Client, StatusCode};
use tokio_util::codec::{BytesCodec, FramedRead};
use url::Url;

pub const NO_FILE_MESSAGE: &str = "Please select a file to upload";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error: Unable to connect to the server. Please check your connection and try again.";
pub const GENERIC_FAILURE_MESSAGE: &str = "Upload failed. Please try again.";

/// Everything that can go wrong during one upload attempt. All variants are
/// recoverable; the session converts each into an error message rather than
/// letting it escape.
#[derive(Clone, Debug)]
pub enum UploadError {
    /// Size or type rejection. Never causes a network call.
    Validation(String),
    /// Non-2xx response, message sourced from the body when possible.
    Server(String),
    /// The server could not be reached at all.
    Network,
    /// Anything else that broke mid-attempt.
    Unexpected(Option<String>),
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(reason) => write!(f, "{reason}"),
            Self::Server(message) => write!(f, "{message}"),
            Self::Network => write!(f, "{NETWORK_ERROR_MESSAGE}"),
            Self::Unexpected(Some(message)) => write!(f, "{message}"),
            Self::Unexpected(None) => write!(f, "{GENERIC_FAILURE_MESSAGE}"),
        }
    }
}

impl Error for UploadError {}

impl From<reqwest::Error> for UploadError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_connect() || value.is_timeout() {
            Self::Network
        } else {
            Self::Unexpected(Some(value.to_string()))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    FileSelected,
    Uploading,
    Error(String),
    Closed,
}

/// Terminal result of one upload attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    Success,
    Failure(String),
}

/// Request ingredients for one attempt, handed out by `start_submit`.
/// The attempt number ties a finished request back to the session so a
/// response arriving after `cancel` is discarded instead of applied.
#[derive(Clone, Debug)]
pub struct PreparedUpload {
    pub attempt: u64,
    pub url: Url,
    pub file: CandidateFile,
}

type SuccessHook = Box<dyn FnMut(&CandidateFile) + Send>;

/// Single-attempt-at-a-time upload workflow. Owns the selected file and is
/// the sole mutator of the session state; callers read the state back to
/// decide what to show.
///
/// The network half is split out so the state transitions stay synchronous:
/// `start_submit` moves the session into `Uploading` and returns the request
/// ingredients, `perform` does the one suspension point, and `finish_submit`
/// applies the outcome. `submit` chains the three for callers that do not
/// need the seams.
pub struct UploadSession {
    state: SessionState,
    file: Option<CandidateFile>,
    endpoint: Url,
    attempt: u64,
    on_success: Option<SuccessHook>,
}

impl UploadSession {
    pub fn new(endpoint: Url) -> Self {
        Self {
            state: SessionState::Idle,
            file: None,
            endpoint,
            attempt: 0,
            on_success: None,
        }
    }

    /// Registers the callback invoked (at most once) with the selected file
    /// when the session completes successfully.
    pub fn on_success(mut self, hook: impl FnMut(&CandidateFile) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&CandidateFile> {
        self.file.as_ref()
    }

    /// Offers a candidate file. An accepted candidate replaces the current
    /// selection; a rejected one surfaces its reason and is not stored, and
    /// any previously stored file is kept.
    pub fn select(&mut self, candidate: CandidateFile) {
        if matches!(self.state, SessionState::Uploading | SessionState::Closed) {
            return;
        }
        match validate(&candidate) {
            ValidationOutcome::Accepted => {
                self.file = Some(candidate);
                self.state = SessionState::FileSelected;
            }
            ValidationOutcome::Rejected(reason) => {
                self.state = SessionState::Error(reason);
            }
        }
    }

    /// Begins a submit. Returns `None` without touching the network when the
    /// submit is not allowed: nothing selected, validation failure, an
    /// attempt already in flight, or a closed session. The stored file is
    /// re-validated in case it changed on disk since selection.
    pub fn start_submit(&mut self) -> Option<PreparedUpload> {
        if matches!(self.state, SessionState::Uploading | SessionState::Closed) {
            return None;
        }
        let Some(file) = self.file.clone() else {
            self.state = SessionState::Error(NO_FILE_MESSAGE.to_string());
            return None;
        };
        if let ValidationOutcome::Rejected(reason) = validate(&file) {
            self.state = SessionState::Error(reason);
            return None;
        }
        self.attempt += 1;
        self.state = SessionState::Uploading;
        Some(PreparedUpload {
            attempt: self.attempt,
            url: self.endpoint.clone(),
            file,
        })
    }

    /// Applies the outcome of an attempt. A stale attempt number, or a
    /// session that was cancelled while the request was in flight, is
    /// silently ignored.
    pub fn finish_submit(&mut self, attempt: u64, outcome: UploadOutcome) {
        if self.state != SessionState::Uploading || attempt != self.attempt {
            return;
        }
        match outcome {
            UploadOutcome::Success => {
                if let (Some(hook), Some(file)) = (&mut self.on_success, &self.file) {
                    hook(file);
                }
                self.file = None;
                self.state = SessionState::Closed;
            }
            UploadOutcome::Failure(message) => {
                self.state = SessionState::Error(message);
            }
        }
    }

    /// Runs one full submit and returns the resulting state.
    pub async fn submit(&mut self, client: &Client) -> &SessionState {
        if let Some(prepared) = self.start_submit() {
            let outcome = perform(client, &prepared).await;
            self.finish_submit(prepared.attempt, outcome);
        }
        self.state()
    }

    /// Ends the session, discarding the selection and any error. Does not
    /// abort an in-flight request; its outcome will be discarded by
    /// `finish_submit` instead.
    pub fn cancel(&mut self) {
        self.file = None;
        self.state = SessionState::Closed;
    }
}

/// Performs the network half of an attempt. Every failure mode collapses
/// into a `Failure` message; nothing escapes as an error.
pub async fn perform(client: &Client, prepared: &PreparedUpload) -> UploadOutcome {
    match try_upload(client, prepared).await {
        Ok(()) => UploadOutcome::Success,
        Err(e) => UploadOutcome::Failure(e.to_string()),
    }
}

async fn try_upload(client: &Client, prepared: &PreparedUpload) -> Result<(), UploadError> {
    let file = &prepared.file;
    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(|e| UploadError::Unexpected(Some(e.to_string())))?;
    let stream = FramedRead::new(handle, BytesCodec::new());
    let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), file.size)
        .file_name(file.name.clone())
        .mime_str(&file.mime_type)
        .map_err(|e| UploadError::Unexpected(Some(e.to_string())))?;
    // The multipart body supplies the boundary-bearing content type; never
    // set that header by hand.
    let form = multipart::Form::new()
        .part("video", part)
        .text("filename", file.name.clone())
        .text("filesize", file.size.to_string());

    let response = client
        .post(prepared.url.clone())
        .multipart(form)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.ok();
        return Err(UploadError::Server(server_error_message(status, body)));
    }

    // The success contract only requires a parseable body.
    let text = response.text().await?;
    serde_json::from_str::<serde_json::Value>(&text)
        .map_err(|e| UploadError::Unexpected(Some(e.to_string())))?;
    Ok(())
}

/// Extracts the message for a non-2xx response: body `error` field, then
/// body `message` field, then the status line. An unparseable body uses the
/// status line.
fn server_error_message(status: StatusCode, body: Option<String>) -> String {
    if let Some(body) = body {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(&body) {
            if let Some(message) = parsed.user_message() {
                return message.to_string();
            }
        }
    }
    format!(
        "Upload failed: {} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown Error")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_precedence() {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            server_error_message(status, Some(r#"{"error":"disk full"}"#.to_string())),
            "disk full"
        );
        assert_eq!(
            server_error_message(status, Some(r#"{"message":"busy"}"#.to_string())),
            "busy"
        );
        assert_eq!(
            server_error_message(status, Some("<html>oops</html>".to_string())),
            "Upload failed: 500 Internal Server Error"
        );
        assert_eq!(
            server_error_message(status, None),
            "Upload failed: 500 Internal Server Error"
        );
    }

    #[test]
    fn upload_error_display() {
        assert_eq!(UploadError::Network.to_string(), NETWORK_ERROR_MESSAGE);
        assert_eq!(
            UploadError::Unexpected(None).to_string(),
            GENERIC_FAILURE_MESSAGE
        );
        assert_eq!(
            UploadError::Unexpected(Some("boom".to_string())).to_string(),
            "boom"
        );
        assert_eq!(
            UploadError::Server("Upload failed: 502 Bad Gateway".to_string()).to_string(),
            "Upload failed: 502 Bad Gateway"
        );
    }
}

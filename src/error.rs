//! Error types shared by the countdown and the submission workflow.

use thiserror::Error;

/// The countdown target could not be turned into an instant.
///
/// This is a configuration defect, so it is raised once at construction and
/// never at tick time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidTargetError {
    #[error("Countdown target cannot be empty")]
    Empty,

    #[error("Invalid countdown target '{input}': {reason}")]
    Unparsable { input: String, reason: String },
}

/// A submit attempt that was refused before any network I/O.
///
/// These are not results; the form simply does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("No file selected")]
    MissingFile,

    #[error("A submission is already in flight")]
    InFlight,
}

/// Failure below HTTP: DNS, refused connection, reset, timeout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("{0}")]
    Request(String),

    #[error("Request timed out after {0} ms")]
    TimedOut(u128),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Request(err.to_string())
    }
}

/// Ways a dispatched submission can fail.
///
/// All of them are folded into `SubmissionResult::Failed` at the workflow
/// boundary; see [`SubmissionError::message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Server responded with status {status}")]
    Server { status: u16, detail: Option<String> },

    #[error("Malformed server response: {0}")]
    MalformedResponse(String),
}

pub const GENERIC_UPLOAD_FAILURE: &str = "Upload failed";
pub const MALFORMED_RESPONSE_MESSAGE: &str = "Malformed server response";

impl SubmissionError {
    /// The single line shown to the user for this failure.
    pub fn message(&self) -> String {
        match self {
            SubmissionError::Transport(err) => {
                let text = err.to_string();
                if text.trim().is_empty() {
                    GENERIC_UPLOAD_FAILURE.to_string()
                } else {
                    text
                }
            }
            SubmissionError::Server {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.clone(),
            SubmissionError::Server { .. } => GENERIC_UPLOAD_FAILURE.to_string(),
            SubmissionError::MalformedResponse(_) => MALFORMED_RESPONSE_MESSAGE.to_string(),
        }
    }
}

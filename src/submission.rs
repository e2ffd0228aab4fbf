//! Bot-file submission: request model, state machine and the upload workflow.
//!
//! # State machine
//! ```text
//!   Idle ──submit──▶ Submitting ──response──▶ Succeeded
//!    ▲                                   └──▶ Failed
//!    └──────────── edit ◀───────────────────── (either)
//! ```
//! A settled state (Succeeded/Failed) may also go straight back to
//! Submitting on a new submit. Submitting never accepts another submit.

use crate::config::{EMAIL_FIELD, TEAM_FIELD};
use crate::error::{SubmissionError, SubmitRejected, MALFORMED_RESPONSE_MESSAGE};
use crate::transport::{RawResponse, UploadTransport};
use log::{debug, info, warn};
use serde::Deserialize;
use std::cell::RefCell;
use std::fmt;

/// An in-memory file picked by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct FileBlob {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl FileBlob {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

impl fmt::Debug for FileBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileBlob")
            .field("name", &self.name)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// What the form holds at the moment the user presses submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRequest {
    pub team: Option<String>,
    pub email: Option<String>,
    pub file: Option<FileBlob>,
}

impl SubmissionRequest {
    pub fn new(team: Option<String>, email: Option<String>, file: Option<FileBlob>) -> Self {
        Self { team, email, file }
    }

    /// Turn the form into a network payload. Fails only when no file is attached.
    pub fn into_payload(self) -> Result<UploadPayload, SubmitRejected> {
        let file = self.file.ok_or(SubmitRejected::MissingFile)?;
        Ok(UploadPayload::new(self.team, self.email, file))
    }
}

/// Multipart body ready to send: ordered text fields plus the file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    fields: Vec<(&'static str, String)>,
    file: FileBlob,
}

impl UploadPayload {
    /// Empty optional fields are left out of the body entirely.
    pub fn new(team: Option<String>, email: Option<String>, file: FileBlob) -> Self {
        let fields = [(TEAM_FIELD, team), (EMAIL_FIELD, email)]
            .into_iter()
            .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| (name, v)))
            .collect();
        Self { fields, file }
    }

    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn file(&self) -> &FileBlob {
        &self.file
    }

    pub fn into_parts(self) -> (Vec<(&'static str, String)>, FileBlob) {
        (self.fields, self.file)
    }
}

/// Outcome of one dispatched submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    Uploaded { filename: String, size_bytes: u64 },
    Failed { message: String },
}

impl SubmissionResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, SubmissionResult::Uploaded { .. })
    }

    /// Line shown under the form, e.g. `Uploaded bot.py (2 KB)`.
    pub fn status_line(&self) -> String {
        match self {
            SubmissionResult::Uploaded {
                filename,
                size_bytes,
            } => format!("Uploaded {} ({} KB)", filename, kilobytes(*size_bytes)),
            SubmissionResult::Failed { message } => message.clone(),
        }
    }
}

/// Size in KB rounded to one decimal place.
fn kilobytes(size_bytes: u64) -> f64 {
    (size_bytes as f64 / 1024.0 * 10.0).round() / 10.0
}

impl From<SubmissionError> for SubmissionResult {
    fn from(err: SubmissionError) -> Self {
        SubmissionResult::Failed {
            message: err.message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    Succeeded(SubmissionResult),
    Failed(String),
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    /// Status line for the last settled result, if any.
    pub fn status_line(&self) -> Option<String> {
        match self {
            SubmissionState::Succeeded(result) => Some(result.status_line()),
            SubmissionState::Failed(message) => Some(message.clone()),
            SubmissionState::Idle | SubmissionState::Submitting => None,
        }
    }
}

#[derive(Deserialize)]
struct UploadReceipt {
    filename: String,
    size: u64,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Map a raw HTTP response onto the result taxonomy.
pub fn interpret_response(response: &RawResponse) -> Result<SubmissionResult, SubmissionError> {
    if !response.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.detail)
            .and_then(|detail| match detail {
                serde_json::Value::Null => None,
                serde_json::Value::String(text) => Some(text),
                other => Some(other.to_string()),
            });
        return Err(SubmissionError::Server {
            status: response.status,
            detail,
        });
    }

    let receipt: UploadReceipt = serde_json::from_str(&response.body)
        .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;

    Ok(SubmissionResult::Uploaded {
        filename: receipt.filename,
        size_bytes: receipt.size,
    })
}

/// Single-form upload workflow: at most one request in flight, one request
/// per accepted submit, every failure folded into a [`SubmissionResult`].
pub struct SubmissionWorkflow<T: UploadTransport> {
    endpoint: String,
    transport: T,
    state: RefCell<SubmissionState>,
}

impl<T: UploadTransport> SubmissionWorkflow<T> {
    pub fn new(endpoint: impl Into<String>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
            state: RefCell::new(SubmissionState::Idle),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> SubmissionState {
        self.state.borrow().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.borrow().is_in_flight()
    }

    /// The user changed the form after a settled result.
    pub fn acknowledge_edit(&self) {
        let mut state = self.state.borrow_mut();
        if matches!(
            *state,
            SubmissionState::Succeeded(_) | SubmissionState::Failed(_)
        ) {
            *state = SubmissionState::Idle;
        }
    }

    /// Upload `request` once.
    ///
    /// Rejections happen before any I/O and leave the state untouched. An
    /// accepted submit always ends in `Succeeded` or `Failed`.
    pub async fn submit(&self, request: SubmissionRequest) -> Result<SubmissionResult, SubmitRejected> {
        if self.is_in_flight() {
            warn!("Submission ignored: another upload is still in flight");
            return Err(SubmitRejected::InFlight);
        }
        let payload = request.into_payload().inspect_err(|_| {
            debug!("Submission ignored: no file selected");
        })?;

        info!(
            "Uploading '{}' ({} bytes) to {}",
            payload.file().name,
            payload.file().size(),
            self.endpoint
        );
        *self.state.borrow_mut() = SubmissionState::Submitting;

        let outcome = match self.transport.post(&self.endpoint, payload).await {
            Ok(response) => interpret_response(&response),
            Err(err) => Err(SubmissionError::from(err)),
        };

        let result = match outcome {
            Ok(result) => {
                info!("Upload succeeded: {}", result.status_line());
                result
            }
            Err(err) => {
                if let SubmissionError::MalformedResponse(reason) = &err {
                    warn!("{}: {}", MALFORMED_RESPONSE_MESSAGE, reason);
                }
                warn!("Upload failed: {}", err);
                SubmissionResult::from(err)
            }
        };

        *self.state.borrow_mut() = match &result {
            SubmissionResult::Uploaded { .. } => SubmissionState::Succeeded(result.clone()),
            SubmissionResult::Failed { message } => SubmissionState::Failed(message.clone()),
        };
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, GENERIC_UPLOAD_FAILURE};
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use std::cell::Cell;

    /// Counts requests and replays a canned response, optionally holding the
    /// response back until the gate is opened.
    struct StubTransport {
        calls: Cell<usize>,
        last_payload: RefCell<Option<UploadPayload>>,
        response: Result<RawResponse, TransportError>,
        gate: RefCell<Option<oneshot::Receiver<()>>>,
    }

    impl StubTransport {
        fn replying(response: Result<RawResponse, TransportError>) -> Self {
            Self {
                calls: Cell::new(0),
                last_payload: RefCell::new(None),
                response,
                gate: RefCell::new(None),
            }
        }

        fn gated(response: Result<RawResponse, TransportError>, gate: oneshot::Receiver<()>) -> Self {
            let stub = Self::replying(response);
            *stub.gate.borrow_mut() = Some(gate);
            stub
        }
    }

    impl UploadTransport for StubTransport {
        async fn post(&self, _url: &str, payload: UploadPayload) -> Result<RawResponse, TransportError> {
            self.calls.set(self.calls.get() + 1);
            *self.last_payload.borrow_mut() = Some(payload);
            let gate = self.gate.borrow_mut().take();
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.response.clone()
        }
    }

    fn bot_file() -> FileBlob {
        FileBlob::new("bot.py", vec![0u8; 2048])
    }

    fn request_with_file() -> SubmissionRequest {
        SubmissionRequest::new(Some("Team 456".into()), Some("p456@example.com".into()), Some(bot_file()))
    }

    fn workflow(response: Result<RawResponse, TransportError>) -> SubmissionWorkflow<StubTransport> {
        SubmissionWorkflow::new("http://localhost:8000/api/upload", StubTransport::replying(response))
    }

    #[test]
    fn test_success_response() {
        let wf = workflow(Ok(RawResponse::new(200, r#"{"filename":"bot.py","size":2048}"#)));

        let result = block_on(wf.submit(request_with_file())).unwrap();
        assert_eq!(
            result,
            SubmissionResult::Uploaded {
                filename: "bot.py".into(),
                size_bytes: 2048,
            }
        );
        assert_eq!(result.status_line(), "Uploaded bot.py (2 KB)");
        assert_eq!(wf.state(), SubmissionState::Succeeded(result));
        assert_eq!(wf.transport.calls.get(), 1);
    }

    #[test]
    fn test_success_with_extra_fields() {
        let wf = workflow(Ok(RawResponse::new(
            201,
            r#"{"filename":"agent.zip","size":1536,"stored_at":"s3://arena/agent.zip"}"#,
        )));

        let result = block_on(wf.submit(request_with_file())).unwrap();
        assert_eq!(result.status_line(), "Uploaded agent.zip (1.5 KB)");
    }

    #[test]
    fn test_server_error_with_detail() {
        let wf = workflow(Ok(RawResponse::new(400, r#"{"detail":"file too large"}"#)));

        let result = block_on(wf.submit(request_with_file())).unwrap();
        assert_eq!(
            result,
            SubmissionResult::Failed {
                message: "file too large".into(),
            }
        );
        assert_eq!(wf.state(), SubmissionState::Failed("file too large".into()));
    }

    #[test]
    fn test_server_error_without_detail() {
        for body in ["", "<html>Bad Gateway</html>", "{}", r#"{"detail":null}"#] {
            let wf = workflow(Ok(RawResponse::new(502, body)));
            let result = block_on(wf.submit(request_with_file())).unwrap();
            assert_eq!(result.status_line(), GENERIC_UPLOAD_FAILURE, "body {body:?}");
        }
    }

    #[test]
    fn test_structured_detail_is_rendered_as_json() {
        let wf = workflow(Ok(RawResponse::new(
            422,
            r#"{"detail":[{"loc":["body","file"],"msg":"field required"}]}"#,
        )));

        let result = block_on(wf.submit(request_with_file())).unwrap();
        assert!(!result.is_ok());
        assert!(result.status_line().contains("field required"));
    }

    #[test]
    fn test_success_status_with_missing_fields_is_malformed() {
        for body in ["not json", r#"{"filename":"bot.py"}"#, r#"{"size":12}"#, r#"{"filename":"bot.py","size":"big"}"#] {
            let wf = workflow(Ok(RawResponse::new(200, body)));
            let result = block_on(wf.submit(request_with_file())).unwrap();
            assert_eq!(
                result,
                SubmissionResult::Failed {
                    message: MALFORMED_RESPONSE_MESSAGE.into(),
                },
                "body {body:?}"
            );
        }
    }

    #[test]
    fn test_transport_failure() {
        let wf = workflow(Err(TransportError::Request(
            "error sending request: Connection refused (os error 111)".into(),
        )));

        let result = block_on(wf.submit(request_with_file())).unwrap();
        match result {
            SubmissionResult::Failed { message } => assert!(!message.is_empty()),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(matches!(wf.state(), SubmissionState::Failed(_)));
    }

    #[test]
    fn test_missing_file_never_hits_network() {
        let wf = workflow(Ok(RawResponse::new(200, r#"{"filename":"bot.py","size":1}"#)));
        let request = SubmissionRequest::new(Some("Team 456".into()), None, None);

        let rejected = block_on(wf.submit(request));
        assert_eq!(rejected, Err(SubmitRejected::MissingFile));
        assert_eq!(wf.transport.calls.get(), 0);
        assert_eq!(wf.state(), SubmissionState::Idle);
    }

    #[test]
    fn test_second_submit_while_in_flight_is_rejected() {
        let (open_gate, gate) = oneshot::channel();
        let wf = SubmissionWorkflow::new(
            "http://localhost:8000/api/upload",
            StubTransport::gated(Ok(RawResponse::new(200, r#"{"filename":"bot.py","size":2048}"#)), gate),
        );

        let (first, second, _) = block_on(async {
            futures::join!(
                wf.submit(request_with_file()),
                async {
                    assert!(wf.is_in_flight());
                    wf.submit(request_with_file()).await
                },
                async {
                    let _ = open_gate.send(());
                }
            )
        });

        assert!(first.unwrap().is_ok());
        assert_eq!(second, Err(SubmitRejected::InFlight));
        assert_eq!(wf.transport.calls.get(), 1);
    }

    #[test]
    fn test_edit_after_failure_returns_to_idle() {
        let wf = workflow(Ok(RawResponse::new(500, r#"{"detail":"disk full"}"#)));
        block_on(wf.submit(request_with_file())).unwrap();
        assert_eq!(wf.state().status_line().as_deref(), Some("disk full"));

        wf.acknowledge_edit();
        assert_eq!(wf.state(), SubmissionState::Idle);
        assert_eq!(wf.state().status_line(), None);
    }

    #[test]
    fn test_retry_after_failure_is_a_new_request() {
        let wf = workflow(Err(TransportError::TimedOut(30_000)));
        block_on(wf.submit(request_with_file())).unwrap();
        block_on(wf.submit(request_with_file())).unwrap();
        assert_eq!(wf.transport.calls.get(), 2);
    }

    #[test]
    fn test_payload_fields() {
        let wf = workflow(Ok(RawResponse::new(200, r#"{"filename":"bot.py","size":2048}"#)));
        block_on(wf.submit(request_with_file())).unwrap();

        let payload = wf.transport.last_payload.borrow().clone().unwrap();
        assert_eq!(
            payload.fields(),
            &[("team", "Team 456".to_string()), ("email", "p456@example.com".to_string())]
        );
        assert_eq!(payload.file().name, "bot.py");
        assert_eq!(payload.file().size(), 2048);
    }

    #[test]
    fn test_empty_optional_fields_are_omitted() {
        let payload = SubmissionRequest::new(Some(String::new()), None, Some(bot_file()))
            .into_payload()
            .unwrap();
        assert!(payload.fields().is_empty());
    }

    #[test]
    fn test_kilobyte_rounding() {
        let line = |size| {
            SubmissionResult::Uploaded {
                filename: "a".into(),
                size_bytes: size,
            }
            .status_line()
        };
        assert_eq!(line(0), "Uploaded a (0 KB)");
        assert_eq!(line(100), "Uploaded a (0.1 KB)");
        assert_eq!(line(1_048_576), "Uploaded a (1024 KB)");
    }
}

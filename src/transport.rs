//! HTTP plumbing for the upload endpoint.
//!
//! The workflow only sees [`UploadTransport`]; the real implementation is
//! [`HttpTransport`], built on reqwest, which targets both wasm32 (fetch) and
//! native builds.

use crate::error::TransportError;
use crate::submission::UploadPayload;
use log::debug;
use std::future::Future;
use std::time::Duration;

/// Status code and body text of an HTTP response, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one multipart POST and hands back whatever came back.
///
/// Implementations must issue exactly one request per call and must not
/// retry.
#[allow(async_fn_in_trait)]
pub trait UploadTransport {
    async fn post(&self, url: &str, payload: UploadPayload) -> Result<RawResponse, TransportError>;
}

/// reqwest-backed transport with an explicit request timeout.
///
/// The deadline covers the whole exchange: connecting, sending the form and
/// reading the response body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        #[cfg(not(target_arch = "wasm32"))]
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        #[cfg(target_arch = "wasm32")]
        let client = reqwest::Client::builder().build()?;

        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_form(payload: UploadPayload) -> reqwest::multipart::Form {
        let (fields, file) = payload.into_parts();
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name, value);
        }
        let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.name);
        form.part(crate::config::FILE_FIELD, part)
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::TimedOut(self.timeout.as_millis())
        } else {
            TransportError::from(err)
        }
    }

    /// Send the request and read the full body.
    async fn exchange(&self, request: reqwest::RequestBuilder) -> Result<RawResponse, TransportError> {
        let response = request.send().await.map_err(|e| self.map_error(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;
        Ok(RawResponse { status, body })
    }

    // reqwest's client timeout already bounds send and body read.
    #[cfg(not(target_arch = "wasm32"))]
    async fn exchange_with_deadline(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<RawResponse, TransportError> {
        self.exchange(request).await
    }

    // fetch has no client-level timeout, so race the whole exchange against a timer.
    #[cfg(target_arch = "wasm32")]
    async fn exchange_with_deadline(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<RawResponse, TransportError> {
        use gloo_timers::future::TimeoutFuture;

        let millis = u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX);
        race_deadline(self.exchange(request), TimeoutFuture::new(millis), self.timeout).await
    }
}

/// Resolve `work` unless `deadline` fires first, in which case the work is
/// dropped and `TimedOut` is returned.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
async fn race_deadline<W, D>(work: W, deadline: D, timeout: Duration) -> Result<RawResponse, TransportError>
where
    W: Future<Output = Result<RawResponse, TransportError>>,
    D: Future<Output = ()>,
{
    use futures::future::{select, Either};

    match select(Box::pin(work), Box::pin(deadline)).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(TransportError::TimedOut(timeout.as_millis())),
    }
}

impl UploadTransport for HttpTransport {
    async fn post(&self, url: &str, payload: UploadPayload) -> Result<RawResponse, TransportError> {
        debug!("POST {} ({} bytes)", url, payload.file().size());

        let request = self.client.post(url).multipart(Self::build_form(payload));
        let response = self.exchange_with_deadline(request).await?;

        debug!("POST {} -> {}", url, response.status);
        Ok(response)
    }
}

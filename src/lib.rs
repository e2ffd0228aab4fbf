//! Landing page for the Vibe Coding — Squid Game Edition competition.
//!
//! Two pieces carry the logic: [`countdown`] turns the fixed competition
//! start into a live days/hours/minutes/seconds reading, and [`submission`]
//! uploads a bot file to the arena backend at most once at a time. The Yew
//! layer in [`hooks`] and [`components`] wires them into the page.

pub mod components;
pub mod config;
pub mod countdown;
pub mod error;
pub mod hooks;
pub mod submission;
pub mod transport;

pub use config::AppConfig;
pub use countdown::{Clock, CountdownClock, CountdownTarget, CountdownValue, SystemClock};
pub use error::{InvalidTargetError, SubmissionError, SubmitRejected, TransportError};
pub use submission::{
    FileBlob, SubmissionRequest, SubmissionResult, SubmissionState, SubmissionWorkflow, UploadPayload,
};
pub use transport::{HttpTransport, RawResponse, UploadTransport};

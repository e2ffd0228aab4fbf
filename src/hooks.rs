use crate::config::{AppConfig, TICK_MS};
use crate::countdown::{CountdownClock, CountdownTarget, CountdownValue};
use crate::error::SubmitRejected;
use crate::submission::{FileBlob, SubmissionRequest, SubmissionState, SubmissionWorkflow};
use crate::transport::HttpTransport;
use gloo_timers::callback::Interval;
use log::{error, warn};
use std::rc::Rc;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Live countdown reading, refreshed every second while the calling component
/// is mounted.
///
/// The interval is owned by the effect: it is dropped (and so cancelled) when
/// the component unmounts or the target changes. No interval is started for a
/// target that has already passed, and a reading equal to the previous one
/// does not re-render.
#[hook]
pub fn use_countdown(target: CountdownTarget) -> CountdownValue {
    let clock = use_memo(target, |target| CountdownClock::system(*target));
    let value = use_state_eq(|| clock.current());

    {
        let value = value.clone();
        let clock = clock.clone();
        use_effect_with(target, move |_| {
            value.set(clock.current());

            let mut interval = None;
            if !clock.is_finished() {
                let value = value.clone();
                interval = Some(Interval::new(TICK_MS, move || {
                    value.set(clock.current());
                }));
            }
            move || drop(interval)
        });
    }

    *value
}

/// Form fields and callbacks for the upload form.
#[derive(Clone)]
pub struct SubmissionHandle {
    pub team: String,
    pub email: String,
    /// Name of the currently selected file, if any.
    pub file_name: Option<String>,
    pub state: SubmissionState,
    /// True from the click until the workflow settles, including the time
    /// spent reading the file into memory.
    pub busy: bool,
    pub on_team_input: Callback<InputEvent>,
    pub on_email_input: Callback<InputEvent>,
    pub on_file_change: Callback<Event>,
    pub on_submit: Callback<SubmitEvent>,
    /// Attach to the file `<input>` so it can be cleared after a success.
    pub file_input: NodeRef,
}

/// Read a browser `File` into memory.
async fn read_file(file: web_sys::File) -> Result<FileBlob, String> {
    let buffer = JsFuture::from(file.array_buffer())
        .await
        .map_err(|e| format!("Could not read {}: {:?}", file.name(), e))?;
    let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
    Ok(FileBlob::new(file.name(), bytes))
}

/// State to render after an edit. While the hook is busy the workflow may
/// still be Idle (the file is being read), so the hook's own state wins.
fn mirrored_state(busy: bool, current: &SubmissionState, workflow: SubmissionState) -> SubmissionState {
    if busy {
        current.clone()
    } else {
        workflow
    }
}

fn input_value(e: &InputEvent) -> String {
    let input: HtmlInputElement = e.target_unchecked_into();
    input.value()
}

/// Custom hook owning one `SubmissionWorkflow` for the lifetime of the form.
#[hook]
pub fn use_submission(config: Rc<AppConfig>) -> SubmissionHandle {
    let workflow = use_memo(config, |config| {
        HttpTransport::new(config.request_timeout)
            .map(|transport| SubmissionWorkflow::new(config.upload_endpoint(), transport))
            .map_err(|e| e.to_string())
    });
    let team = use_state(String::new);
    let email = use_state(String::new);
    let file = use_state(|| None::<web_sys::File>);
    let state = use_state(SubmissionState::default);
    let busy = use_state(|| false);
    let file_input = use_node_ref();

    // Mirror the workflow's state machine into render state.
    let sync_state = {
        let state = state.clone();
        let busy = busy.clone();
        let workflow = workflow.clone();
        Callback::from(move |_: ()| {
            if let Ok(wf) = &*workflow {
                state.set(mirrored_state(*busy, &state, wf.state()));
            }
        })
    };

    let on_team_input = {
        let team = team.clone();
        let workflow = workflow.clone();
        let sync_state = sync_state.clone();
        Callback::from(move |e: InputEvent| {
            team.set(input_value(&e));
            if let Ok(wf) = &*workflow {
                wf.acknowledge_edit();
            }
            sync_state.emit(());
        })
    };

    let on_email_input = {
        let email = email.clone();
        let workflow = workflow.clone();
        let sync_state = sync_state.clone();
        Callback::from(move |e: InputEvent| {
            email.set(input_value(&e));
            if let Ok(wf) = &*workflow {
                wf.acknowledge_edit();
            }
            sync_state.emit(());
        })
    };

    let on_file_change = {
        let file = file.clone();
        let workflow = workflow.clone();
        let sync_state = sync_state.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            file.set(input.files().and_then(|list| list.get(0)));
            if let Ok(wf) = &*workflow {
                wf.acknowledge_edit();
            }
            sync_state.emit(());
        })
    };

    let on_submit = {
        let team = team.clone();
        let email = email.clone();
        let file = file.clone();
        let state = state.clone();
        let busy = busy.clone();
        let workflow = workflow.clone();
        let file_input = file_input.clone();

        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            if *busy {
                return;
            }
            let Some(selected) = (*file).clone() else {
                return;
            };
            let wf = match &*workflow {
                Ok(_) => workflow.clone(),
                Err(reason) => {
                    error!("Upload client unavailable: {}", reason);
                    state.set(SubmissionState::Failed(reason.clone()));
                    return;
                }
            };

            busy.set(true);
            state.set(SubmissionState::Submitting);

            let team = (*team).clone();
            let email = (*email).clone();
            let file = file.clone();
            let state = state.clone();
            let busy = busy.clone();
            let file_input = file_input.clone();

            wasm_bindgen_futures::spawn_local(async move {
                let Ok(workflow) = &*wf else {
                    return;
                };

                let blob = match read_file(selected).await {
                    Ok(blob) => blob,
                    Err(reason) => {
                        warn!("{}", reason);
                        state.set(SubmissionState::Failed(reason));
                        busy.set(false);
                        return;
                    }
                };

                let request = SubmissionRequest::new(Some(team), Some(email), Some(blob));
                match workflow.submit(request).await {
                    Ok(result) => {
                        // The selection is only cleared after a successful upload.
                        if result.is_ok() {
                            file.set(None);
                            if let Some(input) = file_input.cast::<HtmlInputElement>() {
                                input.set_value("");
                            }
                        }
                    }
                    Err(SubmitRejected::InFlight) | Err(SubmitRejected::MissingFile) => {}
                }
                state.set(workflow.state());
                busy.set(false);
            });
        })
    };

    SubmissionHandle {
        team: (*team).clone(),
        email: (*email).clone(),
        file_name: (*file).as_ref().map(|f| f.name()),
        state: (*state).clone(),
        busy: *busy || state.is_in_flight(),
        on_team_input,
        on_email_input,
        on_file_change,
        on_submit,
        file_input,
    }
}

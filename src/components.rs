//! Yew view components for the arena landing page.
//!
//! The countdown and upload form pull their behaviour from `crate::hooks`;
//! everything else renders purely from props.

use crate::config::AppConfig;
use crate::countdown::{CountdownTarget, CountdownValue};
use crate::hooks::{use_countdown, use_submission};
use crate::submission::SubmissionState;
use std::rc::Rc;
use yew::prelude::*;

/// Steps shown in the competition flow list.
pub const COMPETITION_STEPS: [&str; 5] = [
    "Read rules",
    "Watch demo",
    "Download dataset & template",
    "Train bot on the 3 maps",
    "Upload bot code",
];

/// A rule card: title and one-line description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCard {
    pub title: &'static str,
    pub desc: &'static str,
}

pub const ARENA_RULES: [RuleCard; 4] = [
    RuleCard {
        title: "Survive Each Round",
        desc: "Progress through coding trials. Fewer bugs, more points. Elimination is real.",
    },
    RuleCard {
        title: "Beat the Clock",
        desc: "Each stage has strict time. Optimize, improvise, overcome.",
    },
    RuleCard {
        title: "Follow the Protocol",
        desc: "Respect input/output formats and constraints. Precision matters in the arena.",
    },
    RuleCard {
        title: "Style for Bonus",
        desc: "Polished UI/UX, animations, and clean architecture earn extra rewards.",
    },
];

/// Zero-pad a countdown unit to two digits; days may grow wider.
pub fn pad_unit(value: u64) -> String {
    format!("{:02}", value)
}

/// Label/value pairs in display order.
pub fn countdown_units(value: &CountdownValue) -> [(&'static str, u64); 4] {
    [
        ("Days", value.days),
        ("Hours", value.hours),
        ("Minutes", value.minutes),
        ("Seconds", value.seconds),
    ]
}

/// Text of the submit button for the current state.
pub fn submit_label(busy: bool) -> &'static str {
    if busy {
        "Uploading…"
    } else {
        "Send to Arena Storage"
    }
}

/// CSS class for the inline status line.
pub fn status_class(state: &SubmissionState) -> &'static str {
    match state {
        SubmissionState::Succeeded(_) => "upload-status ok",
        SubmissionState::Failed(_) => "upload-status error",
        SubmissionState::Idle | SubmissionState::Submitting => "upload-status",
    }
}

#[derive(Properties, PartialEq)]
pub struct CountdownTimerProps {
    pub target: CountdownTarget,
}

/// Four-cell countdown to the competition start.
#[function_component(CountdownTimer)]
pub fn countdown_timer(props: &CountdownTimerProps) -> Html {
    let value = use_countdown(props.target);

    html! {
        <section class="countdown">
            <div class="countdown-grid">
                { countdown_units(&value).iter().map(|(label, unit)| html! {
                    <div class="countdown-cell" key={*label}>
                        <div class="countdown-value">{ pad_unit(*unit) }</div>
                        <div class="countdown-label">{ *label }</div>
                    </div>
                }).collect::<Html>() }
            </div>
            <p class="countdown-caption">
                { if value.done { "The games have begun" } else { "Countdown to Competition Start" } }
            </p>
        </section>
    }
}

#[derive(Properties, PartialEq)]
pub struct HeroProps {
    pub target: CountdownTarget,
}

#[function_component(Hero)]
pub fn hero(props: &HeroProps) -> Html {
    html! {
        <section id="home" class="hero">
            <h1 class="neon-title">{ "Vibe Coding" }</h1>
            <h2 class="neon-subtitle">{ "Squid Game Edition" }</h2>
            <p class="hero-tagline">
                { "Enter the arena. Code smart, survive rounds, and claim the crown." }
            </p>
            <CountdownTimer target={props.target} />
        </section>
    }
}

#[function_component(Rules)]
pub fn rules() -> Html {
    html! {
        <section id="rules" class="rules">
            <h2>{ "Arena Rules" }</h2>
            <p>{ "Read carefully. Break them, and the doors close." }</p>
            <div class="rule-grid">
                { ARENA_RULES.iter().enumerate().map(|(i, rule)| html! {
                    <div class="rule-card" key={i}>
                        <span class="rule-index">{ pad_unit(i as u64 + 1) }</span>
                        <h4>{ rule.title }</h4>
                        <p>{ rule.desc }</p>
                    </div>
                }).collect::<Html>() }
            </div>
        </section>
    }
}

/// Placeholder frame for the demo video; swap the `<video>` for an embed later.
#[function_component(VideoShowcase)]
pub fn video_showcase() -> Html {
    html! {
        <section id="demo" class="video-showcase">
            <h3>{ "Demo Screen" }</h3>
            <p>{ "A giant screen descends into the arena. Press play when you are ready." }</p>
            <div class="video-frame">
                <p class="video-hint">
                    { "Drop your demo video in this frame or replace with an embed URL." }
                </p>
                <video class="video-placeholder" controls={true} muted={true} loop={true} />
            </div>
        </section>
    }
}

#[function_component(CompetitionFlow)]
pub fn competition_flow() -> Html {
    html! {
        <section id="compete" class="competition-flow">
            <h3>{ "Competition Flow" }</h3>
            <p>{ "Pass through each door to reach the final upload." }</p>
            <ol class="flow-steps">
                { COMPETITION_STEPS.iter().enumerate().map(|(i, step)| html! {
                    <li class="flow-step" key={i}>
                        <span class="flow-index">{ pad_unit(i as u64 + 1) }</span>
                        <span class="flow-label">{ *step }</span>
                    </li>
                }).collect::<Html>() }
            </ol>
        </section>
    }
}

#[derive(Properties, PartialEq)]
pub struct DatasetLinkProps {
    pub url: AttrValue,
}

#[function_component(DatasetLink)]
pub fn dataset_link(props: &DatasetLinkProps) -> Html {
    html! {
        <a class="dataset-link" href={props.url.clone()} target="_blank" rel="noreferrer">
            <h4>{ "Get Dataset & Template" }</h4>
            <p>{ "Download the arena assets and the starter template to begin your run." }</p>
        </a>
    }
}

#[derive(Properties, PartialEq)]
pub struct UploadFormProps {
    pub config: Rc<AppConfig>,
}

/// Team/email/file form bound to a single submission workflow.
#[function_component(UploadForm)]
pub fn upload_form(props: &UploadFormProps) -> Html {
    let handle = use_submission(props.config.clone());

    html! {
        <form id="submit" class="upload-form" onsubmit={handle.on_submit.clone()}>
            <h4>{ "Upload Your Bot Code" }</h4>
            <div class="upload-fields">
                <input
                    type="text"
                    placeholder="Team name (optional)"
                    value={handle.team.clone()}
                    oninput={handle.on_team_input.clone()}
                />
                <input
                    type="email"
                    placeholder="Email (optional)"
                    value={handle.email.clone()}
                    oninput={handle.on_email_input.clone()}
                />
                <input
                    ref={handle.file_input.clone()}
                    type="file"
                    required={true}
                    onchange={handle.on_file_change.clone()}
                />
            </div>
            <button type="submit" disabled={handle.busy}>
                { submit_label(handle.busy) }
            </button>
            if let Some(line) = handle.state.status_line() {
                <p class={status_class(&handle.state)}>{ line }</p>
            }
        </form>
    }
}

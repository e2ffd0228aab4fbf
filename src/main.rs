//! Main module for the arena landing page using Yew.
//! Resolves configuration once and hands it to the page sections.

use log::info;
use std::rc::Rc;
use vibe_arena::components::{CompetitionFlow, DatasetLink, Hero, Rules, UploadForm, VideoShowcase};
use vibe_arena::AppConfig;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
struct PageProps {
    config: Rc<AppConfig>,
}

/// Page layout: hero with countdown, rules, demo, flow, then dataset link
/// beside the form.
#[function_component(Page)]
fn page(props: &PageProps) -> Html {
    let config = props.config.clone();

    html! {
        <main class="arena">
            <Hero target={config.competition_start} />
            <Rules />
            <VideoShowcase />
            <CompetitionFlow />
            <section id="dataset" class="actions">
                <DatasetLink url={AttrValue::from(config.dataset_url.clone())} />
                <UploadForm config={config.clone()} />
            </section>
            <footer class="footer">
                <p>{ "© Vibe Coding — Squid Game Edition" }</p>
            </footer>
        </main>
    }
}

/// Top-level component; a broken build-time configuration renders an error
/// instead of a half-working page.
#[function_component]
pub fn App() -> Html {
    let config = use_memo((), |_| AppConfig::from_build_env().map(Rc::new));

    match &*config {
        Ok(config) => html! { <Page config={config.clone()} /> },
        Err(e) => html! {
            <div class="config-error">{ format!("Configuration error: {}", e) }</div>
        },
    }
}

/// Entry point: installs the panic hook and mounts the App.
fn main() {
    console_error_panic_hook::set_once();
    info!("Mounting arena landing page");
    yew::Renderer::<App>::new().render();
}

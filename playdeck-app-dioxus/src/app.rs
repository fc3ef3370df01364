use crate::bridge::use_player_bridge;
use crate::components::{Header, LyricsPanel, ProgressBar, Transport};
use crate::engine_thread::EngineThread;
use crate::state::PlayerView;
use dioxus::prelude::*;

const PLAYER_CSS: Asset = asset!("/assets/player.css");

/// Root application component.
///
/// Owns the view lifetime: the engine is stopped, and its audio released,
/// when this component unmounts.
#[component]
pub fn App() -> Element {
    let engine = use_context::<EngineThread>();

    let initial = engine.handle().state();
    let view = use_context_provider(|| PlayerView::new(initial));

    use_player_bridge(engine.handle(), view);

    let drop_engine = engine.clone();
    use_drop(move || drop_engine.stop());

    rsx! {
        document::Stylesheet { href: PLAYER_CSS }

        div {
            class: "player",

            Header {}
            LyricsPanel {}
            ProgressBar {}
            Transport {}
        }
    }
}

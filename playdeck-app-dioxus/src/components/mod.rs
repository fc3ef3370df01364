mod header;
mod lyrics_panel;
mod progress_bar;
mod transport;

pub use header::Header;
pub use lyrics_panel::LyricsPanel;
pub use progress_bar::ProgressBar;
pub use transport::Transport;

use tracing::warn;

/// Log a command the engine could not accept
fn log_send_error(result: playdeck_core::error::Result<()>) {
    if let Err(e) = result {
        warn!("Failed to send player command: {e}");
    }
}

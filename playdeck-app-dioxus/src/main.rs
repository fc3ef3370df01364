#![cfg_attr(feature = "bundle", windows_subsystem = "windows")]
mod app;
mod audio_rodio;
mod bridge;
mod components;
mod engine_thread;
mod state;

use crate::app::App;
use crate::engine_thread::{EngineSetup, EngineThread};
use dioxus::desktop::{LogicalSize, WindowBuilder};
use playdeck_core::{
    CoreError, Lyrics, PlaybackState, PlayerHandle, PlaydeckConfig, TomlParseError,
    CONFIG_TEMPLATE,
};
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const APP_NAME: &str = "Playdeck";

fn main() {
    // Check config for logging.enabled before full config load
    let file_logging_enabled = check_file_logging_enabled();
    init_tracing(file_logging_enabled);

    let config = match PlaydeckConfig::load_or_create() {
        Ok(config) => config,
        Err(CoreError::ConfigNotFound { path }) => {
            show_new_config_dialog(&path);
            std::process::exit(0);
        }
        Err(CoreError::ConfigParseError(parse_error)) => {
            show_config_parse_error_dialog(&parse_error, &PlaydeckConfig::config_path());
            std::process::exit(1);
        }
        Err(e) => {
            error!("{e}");
            show_generic_error_dialog(&e.to_string());
            std::process::exit(1);
        }
    };

    let missing_fields = config.missing_fields();
    if !missing_fields.is_empty() {
        show_config_error_dialog(&missing_fields, &PlaydeckConfig::config_path());
    }
    if let Err(e) = config.validate() {
        error!("{e}");
        show_generic_error_dialog(&e.to_string());
        std::process::exit(1);
    }

    let base_dir = PlaydeckConfig::config_dir();
    let lyrics = match config.load_lyrics(&base_dir) {
        Ok(lyrics) => lyrics,
        Err(e) => {
            warn!("Failed to load lyrics, continuing without them: {e}");
            Lyrics::default()
        }
    };
    let track = config.track_info(&base_dir, &lyrics);
    info!(
        "Loaded track {} - {} ({} lyric lines)",
        track.artist,
        track.title,
        lyrics.len()
    );

    // Create shared cancellation token for graceful shutdown
    let cancel_token = CancellationToken::new();

    let ctrlc_token = cancel_token.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down gracefully...");
        ctrlc_token.cancel();
    }) {
        error!("Failed to set Ctrl+C handler: {}", e);
    }

    let (handle, mailbox) =
        PlayerHandle::new(PlaybackState::new(track.duration), Some(cancel_token));
    let setup = EngineSetup {
        track: track.clone(),
        lyrics: lyrics.clone(),
        policy: config.playback.before_first_line,
        clock: config.clock(),
    };
    let engine = match EngineThread::spawn(setup, handle, mailbox) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to start player engine: {e}");
            std::process::exit(1);
        }
    };

    let window = WindowBuilder::new()
        .with_title(format!("{APP_NAME} - {} - {}", track.artist, track.title))
        .with_resizable(true)
        .with_min_inner_size(LogicalSize::new(360.0, 480.0))
        .with_inner_size(LogicalSize::new(420.0, 720.0));

    let dioxus_config = dioxus::desktop::Config::default()
        .with_window(window)
        .with_disable_context_menu(true);

    // Inject the engine, track and lyrics before launch
    dioxus::LaunchBuilder::desktop()
        .with_cfg(dioxus_config)
        .with_context(engine.clone())
        .with_context(track)
        .with_context(lyrics)
        .launch(App);

    // Only reached on platforms where the event loop returns
    engine.stop();
}

/// Show a native OS dialog listing missing configuration fields, then exit
fn show_config_error_dialog(missing_fields: &[String], config_path: &Path) {
    let message = format!(
        "The following required configuration fields are missing or empty:\n\n{}\n\n\
        Please edit the configuration file to add these values.",
        missing_fields
            .iter()
            .map(|f| format!("  \u{2022} {f}"))
            .collect::<Vec<_>>()
            .join("\n")
    );

    let result = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Playdeck - Configuration Required")
        .set_description(&message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Exit".into(),
        ))
        .show();

    open_config_if_requested(&result, config_path);

    // Always exit after showing the dialog
    std::process::exit(1);
}

/// Show dialog when config is newly created
fn show_new_config_dialog(config_path: &Path) {
    let message = "A configuration file has been created.\n\n\
        Please edit it with the track to play:\n\
        \u{2022} track.title\n\
        \u{2022} track.artist\n\
        \u{2022} track.audio_path\n\
        \u{2022} track.duration_secs";

    let result = MessageDialog::new()
        .set_level(MessageLevel::Info)
        .set_title("Playdeck - Configuration Created")
        .set_description(message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Exit".into(),
        ))
        .show();

    open_config_if_requested(&result, config_path);
}

fn open_config_if_requested(result: &MessageDialogResult, config_path: &Path) {
    if matches!(result, MessageDialogResult::Custom(s) if s == "Open Config") {
        if let Err(e) = open::that(config_path) {
            error!("Failed to open config file: {e}");
        }
    }
}

/// Show dialog when config file has TOML parsing errors
fn show_config_parse_error_dialog(parse_error: &TomlParseError, config_path: &Path) {
    let message = format!(
        "Your configuration file has a syntax error and cannot be loaded.\n\n\
        Error: {parse_error}\n\n\
        You can either:\n\
        \u{2022} Open the config file and fix the syntax error\n\
        \u{2022} Reset to a fresh configuration template"
    );

    let result = MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Playdeck - Configuration Error")
        .set_description(&message)
        .set_buttons(MessageButtons::OkCancelCustom(
            "Open Config".into(),
            "Reset Config".into(),
        ))
        .show();

    match result {
        MessageDialogResult::Custom(button) if button == "Open Config" => {
            if let Err(e) = open::that(config_path) {
                error!("Failed to open config file: {e}");
            }
        }
        MessageDialogResult::Custom(button) if button == "Reset Config" => {
            if let Err(e) = std::fs::write(config_path, CONFIG_TEMPLATE) {
                error!("Failed to reset config file: {e}");
                MessageDialog::new()
                    .set_level(MessageLevel::Error)
                    .set_title("Playdeck - Reset Failed")
                    .set_description(format!("Failed to reset configuration:\n{e}"))
                    .set_buttons(MessageButtons::Ok)
                    .show();
            } else {
                MessageDialog::new()
                    .set_level(MessageLevel::Info)
                    .set_title("Playdeck - Configuration Reset")
                    .set_description(
                        "Configuration has been reset to the default template.\n\n\
                        Please edit it with your track details and restart the app.",
                    )
                    .set_buttons(MessageButtons::Ok)
                    .show();
                if let Err(e) = open::that(config_path) {
                    error!("Failed to open config file: {e}");
                }
            }
        }
        _ => {
            // User closed dialog - just exit
        }
    }

    std::process::exit(1);
}

/// Show a generic error dialog for unexpected errors
fn show_generic_error_dialog(error_message: &str) {
    let message = format!(
        "An unexpected error occurred:\n\n{error_message}\n\n\
        Please check your configuration file."
    );

    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("Playdeck - Error")
        .set_description(&message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Check if file logging is enabled by reading the config file.
/// This is done before full config loading to set up tracing first.
/// Returns `false` if config doesn't exist or can't be parsed.
fn check_file_logging_enabled() -> bool {
    // Minimal structs to parse just the logging.enabled field
    #[derive(serde::Deserialize)]
    struct PartialConfig {
        #[serde(default)]
        logging: PartialLoggingConfig,
    }
    #[derive(serde::Deserialize, Default)]
    struct PartialLoggingConfig {
        #[serde(default)]
        enabled: bool,
    }

    let config_path = PlaydeckConfig::config_path();
    let Ok(content) = std::fs::read_to_string(&config_path) else {
        return false;
    };

    toml::from_str::<PartialConfig>(&content)
        .map(|c| c.logging.enabled)
        .unwrap_or(false)
}

/// Initialize tracing with console output and optional file logging
fn init_tracing(file_logging_enabled: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,symphonia=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer();

    if file_logging_enabled {
        let log_path = playdeck_core::log_file_path();

        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }

        match File::create(&log_path) {
            Ok(file) => {
                let file_layer = tracing_subscriber::fmt::layer()
                    .with_writer(Arc::new(file))
                    .with_ansi(false);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt_layer)
                    .with(file_layer)
                    .init();

                return;
            }
            Err(e) => {
                eprintln!("Failed to create log file at {}: {e}", log_path.display());
            }
        }
    }

    // Fallback: console only
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

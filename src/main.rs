//! Interactive fiction in the terminal, written on the fly by a local model.

mod engine;
mod model;
mod ui;

use std::io;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::engine::engine::{StoryEngine, TurnLimits};
use crate::engine::llm_client::{Backend, LlmClient};
use crate::model::genre::Genre;
use crate::ui::app::{App, AppOptions};
use crate::ui::render;
use crate::ui::settings::SettingsOverrides;
use crate::ui::settings_io::{load_settings, save_settings, settings_path};

#[derive(Parser)]
#[command(
    name = "story-forge",
    about = "Choose-your-own-adventure stories generated by a local language model",
    version
)]
struct Cli {
    /// Model server API flavour
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Model server root URL (e.g. http://localhost:11434)
    #[arg(long)]
    base_url: Option<String>,

    /// Model name as the server knows it
    #[arg(long)]
    model: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Skip the genre menu (action, horror, adventure, mystery, fantasy)
    #[arg(long)]
    genre: Option<Genre>,

    /// Earliest turn at which the story may end
    #[arg(long, default_value_t = 10)]
    min_turns: u32,

    /// Turn at which the story is always brought to an end
    #[arg(long, default_value_t = 15)]
    max_turns: u32,

    /// Append every generated segment to this JSON file
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Check that the model server answers, then exit
    #[arg(long)]
    check: bool,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// Store the effective model settings as the new defaults
    #[arg(long)]
    save_settings: bool,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }

    let path = settings_path();
    let mut settings = load_settings(&path);
    settings.apply(SettingsOverrides {
        backend: cli.backend,
        base_url: cli.base_url,
        model: cli.model,
        temperature: cli.temperature,
    });

    if cli.save_settings {
        save_settings(&path, &settings)?;
        info!(path = %path.display(), "settings saved");
    }

    let limits = TurnLimits::new(cli.min_turns, cli.max_turns)?;
    let client = LlmClient::new(
        settings.backend,
        settings.base_url(),
        &settings.model,
        settings.temperature,
        Duration::from_secs(settings.timeout_secs),
    )?;
    info!(
        backend = ?client.backend(),
        model = client.model(),
        base_url = settings.base_url(),
        "model client ready"
    );

    if cli.check {
        let summary = client.test_connection()?;
        render::info(&mut io::stdout(), &summary)?;
        return Ok(());
    }

    let options = AppOptions {
        genre: cli.genre,
        transcript: cli.transcript,
    };

    install_interrupt_handler()?;

    let stdin = io::stdin();
    let mut app = App::new(
        StoryEngine::new(client, limits),
        stdin.lock(),
        io::stdout(),
        options,
    );
    app.run()
}

/// Ctrl-C during play ends the program the same way as closing stdin.
fn install_interrupt_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        info!("interrupted");
        // Nothing left to report to if stdout is gone.
        let _ = render::terminated(&mut io::stdout());
        process::exit(0);
    })
    .context("failed to install Ctrl-C handler")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "story-forge",
            "--backend",
            "openai",
            "--genre",
            "horror",
            "--max-turns",
            "8",
            "--no-color",
        ])
        .unwrap();

        assert_eq!(cli.backend, Some(Backend::Openai));
        assert_eq!(cli.genre, Some(Genre::Horror));
        assert_eq!(cli.min_turns, 10);
        assert_eq!(cli.max_turns, 8);
        assert!(cli.no_color);
        assert!(TurnLimits::new(cli.min_turns, cli.max_turns).is_err());
    }

    #[test]
    fn interrupt_handler_is_installed_once() {
        assert!(install_interrupt_handler().is_ok());
        assert!(install_interrupt_handler().is_err());
    }

    #[test]
    fn rejects_unknown_genre() {
        assert!(Cli::try_parse_from(["story-forge", "--genre", "romance"]).is_err());
    }
}

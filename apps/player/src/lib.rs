pub mod adapters;
pub mod api;
pub mod cli;
pub mod config;
pub mod offline;
pub mod session;
pub mod speech;
pub mod terminal;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::adapters::{CompletionSink, LessonSource};
use crate::api::ApiClient;
use crate::cli::Cli;
use crate::config::Config;
use crate::offline::{FileLessonSource, LoggedCompletion};
use crate::session::{Adapters, LessonSession, SessionOutcome};
use crate::speech::{ConsoleSynthesizer, TypedRecognizer};
use crate::terminal::TerminalNotices;

/// Install the log subscriber. `RUST_LOG` wins over the `info`/`debug` default.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::from_env()?;
    cli.apply(&mut config);

    let api = ApiClient::new(&config.api_url, config.api_token.clone());

    let lesson = match &cli.file {
        Some(path) => {
            tracing::info!("Loading lesson from {}...", path.display());
            FileLessonSource::new(path).load().await?
        }
        None => {
            let lesson_id = cli
                .lesson_id
                .context("either --lesson-id or --file is required")?;
            tracing::info!("Fetching lesson {} from {}...", lesson_id, api.base_url());
            api.fetch_lesson(lesson_id).await?
        }
    };

    let completion: Arc<dyn CompletionSink> = if cli.offline {
        Arc::new(LoggedCompletion)
    } else {
        Arc::new(api)
    };

    let recognizer = Arc::new(TypedRecognizer::new(config.recognition_timeout));
    let adapters = Adapters {
        synthesizer: Arc::new(ConsoleSynthesizer::with_catalog_voices()),
        recognizer: recognizer.clone(),
        completion,
        notices: Arc::new(TerminalNotices::new()),
    };

    let session = LessonSession::new(lesson, config.settings.clone(), adapters)?;
    println!("{}", terminal::HELP);
    println!("{}", terminal::render_exercise(session.player()).trim_end());

    let input = tokio::spawn(terminal::read_input(session.handle(), recognizer));
    let outcome = session.run().await;
    input.abort();

    match outcome {
        SessionOutcome::Completed(summary) => {
            tracing::info!(
                experience = summary.experience,
                correct = summary.correct_answers,
                "session finished"
            );
        }
        SessionOutcome::Abandoned(summary) => {
            tracing::info!(
                correct = summary.correct_answers,
                total = summary.total_exercises,
                "lesson left before completion"
            );
        }
    }

    Ok(())
}

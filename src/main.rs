use std::sync::Arc;

use futures::StreamExt;
use tokio::io::BufReader;

use cardio_tour::config::TourAppConfig;
use cardio_tour::driver::{Driver, HELP, Outcome, input_lines};
use cardio_tour::error::Result;
use cardio_tour::narration::{CommandBackend, Narrator, SilentBackend, SpeechBackend};
use cardio_tour::store::{LibSqlSettings, SettingsStore};
use cardio_tour::tour::TourManager;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = TourAppConfig::from_env()?;

    let store: Arc<dyn SettingsStore> = match LibSqlSettings::new_local(&config.db_path).await {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(path = %config.db_path.display(), error = %e, "Failed to open settings");
            return Err(e.into());
        }
    };

    let backend: Arc<dyn SpeechBackend> = match config.tts_command.as_deref() {
        Some(program) => Arc::new(CommandBackend::new(program)),
        None => Arc::new(SilentBackend),
    };
    let narrator = Arc::new(Narrator::with_voice(backend, config.voice));
    let manager = Arc::new(TourManager::new(Arc::clone(&narrator), store));
    manager.set_role(&config.default_role).await;

    eprintln!("Cardio Tour v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Role: {}", config.default_role);
    eprintln!("   Settings: {}", config.db_path.display());
    eprintln!(
        "   Voice: {}",
        if narrator.is_available() {
            config.tts_command.as_deref().unwrap_or("none")
        } else {
            "unavailable (visual-only tour)"
        }
    );
    if manager.has_completed_tour().await {
        eprintln!("   A tour has already been completed on this profile.");
    }
    eprintln!("   {HELP}\n");

    let mut driver = Driver::new(Arc::clone(&manager)).await;
    let lines = input_lines(BufReader::new(tokio::io::stdin()));
    tokio::pin!(lines);

    eprint!("> ");
    while let Some(line) = lines.next().await {
        match driver.handle_line(&line).await {
            Outcome::Print(text) => println!("\n{text}\n"),
            Outcome::Quit => break,
        }
        eprint!("> ");
    }

    narrator.shutdown();
    Ok(())
}

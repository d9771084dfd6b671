#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use quit_habit::{
        AppConfig, HabitTracker, SqliteHabitStore,
        http_api::{self, AppState, SessionGate},
    };
    use tracing_subscriber::EnvFilter;

    let _ = dotenvy::dotenv();
    let config = AppConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .with_writer(std::io::stderr)
        .init();

    let store = SqliteHabitStore::new(&config.database_path)?;
    let tracker = HabitTracker::new(Arc::new(store));
    let state = AppState::new(tracker, SessionGate::from_config(&config));

    tracing::info!(
        database = %config.database_path.display(),
        password_required = config.password_required(),
        "quit-habit HTTP API starting on http://{}",
        config.http_addr
    );
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}

//! Session inspector
//!
//! Small operational entry point: lists the session namespaces under the
//! data directory, or reports one session's history, bookmarks and status.
//!
//! ```text
//! tilemark            # list sessions
//! tilemark <session>  # inspect one session
//! ```

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tilemark::config::Config;
use tilemark::session::SessionStatus;
use tilemark::store::{list_sessions, BookmarkIndex, SessionPaths, SnapshotStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tilemark=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!(
        data_dir = %config.storage.data_dir.display(),
        "tilemark inspector v{}",
        env!("CARGO_PKG_VERSION")
    );

    match std::env::args().nth(1) {
        Some(session_id) => inspect_session(&config, &session_id).await,
        None => {
            let sessions = list_sessions(&config.storage.data_dir)
                .await
                .context("listing sessions")?;
            if sessions.is_empty() {
                println!("no sessions under {}", config.storage.data_dir.display());
            }
            for session_id in sessions {
                println!("{session_id}");
            }
            Ok(())
        }
    }
}

async fn inspect_session(config: &Config, session_id: &str) -> anyhow::Result<()> {
    let paths = SessionPaths::new(&config.storage.data_dir, session_id);
    let store = SnapshotStore::open(&paths.live_dir)
        .await
        .with_context(|| format!("opening snapshot store for {session_id}"))?;
    let bookmarks = BookmarkIndex::open(&paths.bookmarks_file)
        .await
        .context("reading bookmarks")?;
    let status = SessionStatus::load(&paths.status_file)
        .await
        .context("reading status")?;

    println!("session:   {session_id}");
    println!("snapshots: {}", store.len());
    match store.latest() {
        Some(index) => {
            let snapshot = store.read(index).await?;
            println!(
                "latest:    #{index} ({} strokes, {})",
                snapshot.state.strokes.len(),
                snapshot.created_at.to_rfc3339()
            );
        }
        None => println!("latest:    none"),
    }
    println!("bookmarks: {:?}", bookmarks.indices());
    println!("done:      {}", status.done);

    Ok(())
}

//! Minilog - a small multi-user item catalog

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minilog::{
    config::Config,
    db::{self, seed},
    web::{self, AppState},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "minilog=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Terminal commands: `minilog initdb` and `minilog populatedb` set the
    // database up and exit without serving.
    match std::env::args().nth(1).as_deref() {
        Some("initdb") => {
            println!("Initialized the database.");
            return Ok(());
        }
        Some("populatedb") => {
            seed::populate(&pool).await?;
            println!("Mock data added to the database.");
            return Ok(());
        }
        Some(other) => {
            anyhow::bail!("Unknown command: {} (expected initdb or populatedb)", other);
        }
        None => {}
    }

    let templates = web::templates::TemplateEngine::new(web::templates::DEFAULT_TEMPLATE_GLOB)?;
    tracing::info!("Templates loaded");

    let state = AppState::build(&config, pool, templates)?;

    // Expired sessions are swept every hour
    {
        let sessions = state.sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match sessions.cleanup_expired().await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!("Removed {} expired session(s)", n),
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    let app = web::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use mailpost::config::Config;
use mailpost::services::blog_cache::BlogCache;
use mailpost::services::dispatch::Dispatcher;
use mailpost::services::scheduler::Scheduler;
use mailpost::smtp::{Mailer, SmtpMailer};
use mailpost::{app, db, AppState};

const BLOG_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,mailpost=debug")),
        )
        .init();

    let config = Config::from_env();

    let pool = db::connect(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let mailer: Arc<dyn Mailer> = Arc::new(SmtpMailer::from_config(&config)?);
    let dispatcher = Arc::new(Dispatcher::new(
        pool.clone(),
        mailer.clone(),
        config.retry_failed_after_secs,
    ));

    // Scheduler is owned here: started after setup, stopped before exit.
    let scheduler = Scheduler::start(
        dispatcher.clone(),
        Duration::from_secs(config.dispatch_interval_secs),
    );

    let state = AppState {
        pool,
        mailer,
        dispatcher,
        blog_cache: Arc::new(BlogCache::new(BLOG_CACHE_TTL)),
        public_base_url: config.public_base_url.clone(),
    };

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // Join the dispatch task even when serve itself failed.
    scheduler.stop().await;
    served?;
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };
    #[cfg(unix)]
    let term = async {
        if let Ok(mut s) = signal::unix::signal(signal::unix::SignalKind::terminate()) {
            s.recv().await;
        }
    };
    #[cfg(not(unix))]
    let term = std::future::pending::<()>();
    tokio::select! { _ = ctrl_c => {}, _ = term => {} }
}

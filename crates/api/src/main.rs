use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cinema_api::background::session_cleanup;
use cinema_api::config::{env_or, ServerConfig};
use cinema_api::payments::{MockPaymentProvider, PaymentProvider, StripeConfig, StripeProvider};
use cinema_api::router::build_app_router;
use cinema_api::state::AppState;
use cinema_db::DbPool;
use cinema_events::{BookingMailer, EmailConfig, EmailDelivery, EventBus, EventRecorder};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Loaded server configuration");

    let pool = connect_database().await?;
    let payments = payment_provider();
    let event_bus = Arc::new(EventBus::default());
    let background = BackgroundServices::start(&pool, &event_bus);

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&event_bus),
        payments,
    };
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped accepting connections");
    // The router held the other handles to the bus; this is the last one.
    drop(event_bus);
    background
        .stop(Duration::from_secs(config.shutdown_timeout_secs))
        .await;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// `RUST_LOG` filters (default `cinema_api=debug,cinema_events=info,tower_http=debug`);
/// `LOG_FORMAT=json` switches to one JSON object per line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cinema_api=debug,cinema_events=info,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect, verify and migrate.
async fn connect_database() -> Result<DbPool, BoxError> {
    let url = std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?;
    let max_connections = env_or("DB_MAX_CONNECTIONS", cinema_db::DEFAULT_MAX_CONNECTIONS);

    let pool = cinema_db::create_pool(&url, max_connections).await?;
    cinema_db::health_check(&pool).await?;
    cinema_db::run_migrations(&pool).await?;
    tracing::info!(max_connections, "Database ready, migrations applied");
    Ok(pool)
}

/// Stripe when `STRIPE_SECRET_KEY` is set, otherwise the in-memory mock.
fn payment_provider() -> Arc<dyn PaymentProvider> {
    let provider: Arc<dyn PaymentProvider> = match StripeConfig::from_env() {
        Some(stripe) => Arc::new(StripeProvider::new(stripe)),
        None => {
            tracing::warn!("STRIPE_SECRET_KEY not set, payments are simulated in memory");
            Arc::new(MockPaymentProvider::new())
        }
    };
    tracing::info!(provider = provider.name(), "Payment provider ready");
    provider
}

/// Tasks that run beside the HTTP server.
struct BackgroundServices {
    recorder: JoinHandle<()>,
    mailer: Option<JoinHandle<()>>,
    cleanup: JoinHandle<()>,
    cleanup_cancel: CancellationToken,
}

impl BackgroundServices {
    fn start(pool: &DbPool, bus: &EventBus) -> Self {
        let recorder = tokio::spawn(EventRecorder::run(pool.clone(), bus.subscribe()));

        let mailer = match EmailConfig::from_env().map(EmailDelivery::new) {
            Some(Ok(delivery)) => Some(tokio::spawn(BookingMailer::run(
                Arc::new(delivery),
                bus.subscribe(),
            ))),
            Some(Err(e)) => {
                tracing::error!(error = %e, "Invalid SMTP configuration, booking emails disabled");
                None
            }
            None => {
                tracing::info!("SMTP_HOST not set, booking emails disabled");
                None
            }
        };

        let cleanup_cancel = CancellationToken::new();
        let cleanup = tokio::spawn(session_cleanup::run(
            pool.clone(),
            session_cleanup::CLEANUP_INTERVAL,
            cleanup_cancel.clone(),
        ));

        tracing::info!(mailer = mailer.is_some(), "Background services started");
        Self {
            recorder,
            mailer,
            cleanup,
            cleanup_cancel,
        }
    }

    /// Must run after the event bus is dropped, so the event consumers see
    /// the channel close and drain.
    async fn stop(self, wait: Duration) {
        self.cleanup_cancel.cancel();

        let mut tasks = vec![("session-cleanup", self.cleanup), ("event-recorder", self.recorder)];
        if let Some(mailer) = self.mailer {
            tasks.push(("booking-mailer", mailer));
        }
        for (name, task) in tasks {
            match tokio::time::timeout(wait, task).await {
                Ok(Ok(())) => tracing::debug!(task = name, "Background task finished"),
                Ok(Err(e)) => tracing::error!(task = name, error = %e, "Background task panicked"),
                Err(_) => tracing::warn!(task = name, "Background task did not stop in time"),
            }
        }
    }
}

/// Resolves on SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

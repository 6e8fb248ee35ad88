//! E-Shikshan payments service entry point.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use eshikshan_payments::adapters::http::{app_router, WebhookAppState};
use eshikshan_payments::adapters::{
    LogNotificationSender, NotificationWorker, PostgresEnrollmentRepository,
    PostgresWebhookEventLog, QueuedNotificationDispatcher, ResendConfig, ResendEmailSender,
};
use eshikshan_payments::config::AppConfig;
use eshikshan_payments::domain::enrollment::WebhookSignatureVerifier;
use eshikshan_payments::ports::NotificationSender;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = config.database.connect().await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (dispatcher, queue) = QueuedNotificationDispatcher::new(config.email.queue_capacity);
    let sender: Arc<dyn NotificationSender> = match &config.email.resend_api_key {
        Some(key) if config.email.is_enabled() => {
            let resend = ResendConfig::new(key.clone(), config.email.from_header())
                .with_base_url(config.email.resend_base_url.clone())
                .with_timeout(config.email.send_timeout());
            Arc::new(ResendEmailSender::new(resend)?)
        }
        _ => {
            tracing::warn!("No Resend API key configured, notifications will only be logged");
            Arc::new(LogNotificationSender)
        }
    };
    let worker = tokio::spawn(NotificationWorker::new(queue, sender).run(shutdown_rx));

    let verifier = WebhookSignatureVerifier::new(config.payment.webhook_secret.clone())
        .with_max_age(config.payment.webhook_max_age_secs);

    let state = WebhookAppState {
        enrollment_repository: Arc::new(PostgresEnrollmentRepository::new(pool.clone())),
        webhook_event_log: Arc::new(PostgresWebhookEventLog::new(pool.clone())),
        notification_dispatcher: Arc::new(dispatcher),
        verifier: Arc::new(verifier),
    };

    let app = app_router(state, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Payments service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await?;

    // Deliver anything still queued before exiting
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Notification worker panicked");
    }
    pool.close().await;

    tracing::info!("Payments service stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    tracing::info!("Shutdown signal received");
}

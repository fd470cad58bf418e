//! ComicVault billing HTTP server.

use comicvault_billing::providers::{HttpPayPalClient, HttpPaystackClient};
use comicvault_billing::stores::postgres::migrate;
use comicvault_billing::stores::{PostgresDayPassStore, PostgresEntitlementStore};
use comicvault_billing::BillingEnvironment;
use comicvault_server::identity::HttpIdentityProvider;
use comicvault_server::{AppSettings, AppState, Config, PostgresBackend, build_router, metrics};
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "info,comicvault_server=debug,comicvault_billing=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ComicVault billing server");

    // Load configuration
    let config = Config::from_env();
    info!(
        app_url = %config.server.app_url,
        signature_policy = ?config.billing.signature_policy,
        day_pass_hours = config.billing.day_pass_hours,
        member_days = config.billing.member_days,
        "Configuration loaded"
    );

    if let Err(e) = metrics::install_exporter(&config.metrics_address()) {
        warn!(error = %e, "Metrics exporter not started");
    }

    // Database
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout())
        .connect(&config.postgres.url)
        .await?;
    info!("PostgreSQL connected");

    if config.postgres.run_migrations {
        migrate(&pool).await?;
        info!("Migrations applied");
    }

    // Billing services
    let env = BillingEnvironment::new(
        PostgresEntitlementStore::new(pool.clone()),
        PostgresDayPassStore::new(pool.clone()),
    )
    .with_config(config.billing.reconciler());

    let paystack = HttpPaystackClient::new(
        config.paystack.api_base.clone(),
        config.paystack.secret_key.clone(),
    );
    let paypal = HttpPayPalClient::new(
        config.paypal.api_base.clone(),
        config.paypal.client_id.clone(),
        config.paypal.client_secret.clone(),
        config.paypal.webhook_id.clone(),
    );
    if !paypal.is_configured() {
        warn!("PayPal credentials incomplete; PayPal webhook signatures cannot be verified");
    }
    if config.paystack.secret_key.is_empty() {
        warn!("PAYSTACK_SECRET_KEY not set; Paystack webhook signatures cannot be verified");
    }

    let identity = HttpIdentityProvider::new(
        config.identity.token_url.clone(),
        config.identity.user_url.clone(),
        config.identity.api_key.clone(),
    );

    let settings = AppSettings {
        paystack_secret: config.paystack.secret_key.clone(),
        signature_policy: config.billing.signature_policy,
        app_url: config.server.app_url.clone(),
        secure_cookies: config.server.secure_cookies,
    };

    let state = AppState::<PostgresBackend>::new(env, paystack, paypal, identity, settings)
        .with_pool(pool);
    let app = build_router(state);

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}

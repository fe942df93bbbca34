use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use forum_service::auth::JwtVerifier;
use forum_service::services::{HttpClassifier, ModerationGate, TextClassifier};
use forum_service::{db, handlers, metrics, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Probe the local health endpoint; used as the container healthcheck.
async fn run_healthcheck() -> anyhow::Result<()> {
    let port = std::env::var("FORUM_SERVICE_PORT").unwrap_or_else(|_| "8090".to_string());
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);

    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("healthcheck request failed")?;

    anyhow::ensure!(
        resp.status().is_success(),
        "healthcheck HTTP status: {}",
        resp.status()
    );
    Ok(())
}

/// Forum Service
///
/// # Routes
///
/// - `/api/v1/forum/posts/*` - Posts with tags, tallies and comment trees
/// - `/api/v1/forum/comments/*` - Threaded comments
/// - `/api/v1/forum/votes/*` - Toggle-style votes
/// - `/api/v1/forum/tags/*` - Tag registry
/// - `/api/v1/health*`, `/metrics` - Operations
///
/// Runs on port 8090 by default (`FORUM_SERVICE_PORT`).
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return run_healthcheck().await;
    }

    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("failed to load configuration")?;

    tracing::info!("Starting forum-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(env = %config.app.env, "environment");

    let db_pool = db::create_pool(&config.database)
        .await
        .context("failed to create database pool")?;
    db::run_migrations(&db_pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("database ready");

    let classifier: Arc<dyn TextClassifier> = Arc::new(HttpClassifier::new(&config.classifier)?);
    tracing::info!(
        endpoint = %config.classifier.endpoint,
        timeout_ms = config.classifier.timeout_ms,
        "classifier configured"
    );

    let pool_data = web::Data::new(db_pool);
    let moderation = web::Data::new(ModerationGate::new(classifier, &config.moderation));
    let verifier = web::Data::new(JwtVerifier::new(&config.auth));

    let bind_address = config.bind_address();
    let allowed_origins = config.cors.allowed_origins.clone();
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(pool_data.clone())
            .app_data(moderation.clone())
            .app_data(verifier.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::health::configure)
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .with_context(|| format!("failed to bind {}", bind_address))?
    .workers(config.app.workers)
    .shutdown_timeout(30)
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let mut server_task = tokio::spawn(server);

    tokio::select! {
        result = &mut server_task => {
            result
                .context("server task panicked")?
                .context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            server_task
                .await
                .context("server task panicked")?
                .context("HTTP server error")?;
        }
    }

    tracing::info!("forum-service shut down");
    Ok(())
}

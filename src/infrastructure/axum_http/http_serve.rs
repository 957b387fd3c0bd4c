use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::config::config_model::DotEnvyConfig;
use crate::infrastructure::ai::kie_client::KieClient;
use crate::infrastructure::axum_http::{default_routers, routers};
use crate::infrastructure::email::resend_client::ResendClient;
use crate::infrastructure::payments::stripe_client::StripeClient;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::storage::supabase_storage::{
    SupabaseStorageClient, SupabaseStorageConfig,
};

pub async fn start(config: Arc<DotEnvyConfig>, db_pool: Arc<PgPoolSquad>) -> Result<()> {
    let stripe_client = Arc::new(StripeClient::new(
        config.stripe.secret_key.clone(),
        config.stripe.webhook_secret.clone(),
        config.stripe.success_url.clone(),
        config.stripe.cancel_url.clone(),
    ));

    let kie_client = Arc::new(KieClient::new(
        config.kie.api_key.clone(),
        config.kie.base_url.clone(),
        config.kie.callback_url.clone(),
    ));

    let email_client = Arc::new(ResendClient::new(
        config.email.api_key.clone(),
        config.email.from_address.clone(),
    ));

    let asset_storage = Arc::new(
        SupabaseStorageClient::new(SupabaseStorageConfig {
            endpoint: config.supabase.s3_endpoint.clone(),
            region: config.supabase.s3_region.clone(),
            bucket: config.supabase.asset_bucket.clone(),
            access_key: config.supabase.s3_access_key.clone(),
            secret_key: config.supabase.s3_secret_key.clone(),
            project_url: config.supabase.project_url.clone(),
        })
        .await?,
    );

    let app = Router::new()
        .fallback(default_routers::not_found)
        .merge(routers::orders::routes(
            Arc::clone(&db_pool),
            Arc::clone(&stripe_client),
            &config,
        ))
        .merge(routers::intake::routes(
            Arc::clone(&db_pool),
            Arc::clone(&asset_storage),
            Arc::clone(&stripe_client),
            &config,
        ))
        .merge(routers::checkout::routes(
            Arc::clone(&db_pool),
            Arc::clone(&stripe_client),
        ))
        .merge(routers::stripe_webhook::routes(
            Arc::clone(&db_pool),
            Arc::clone(&stripe_client),
            Arc::clone(&email_client),
            &config,
        ))
        .merge(routers::generations::routes(
            Arc::clone(&db_pool),
            Arc::clone(&kie_client),
        ))
        .merge(routers::kie_webhook::routes(Arc::clone(&db_pool)))
        .merge(routers::admin_orders::routes(Arc::clone(&db_pool)))
        .merge(routers::view::routes(Arc::clone(&db_pool)))
        .merge(routers::support::routes(
            Arc::clone(&db_pool),
            Arc::clone(&email_client),
            &config,
        ))
        .route("/api/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(RequestBodyLimitLayer::new(
            (config.server.body_limit * 1024 * 1024).try_into()?,
        ))
        .layer(
            CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::PUT,
                    Method::DELETE,
                ])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

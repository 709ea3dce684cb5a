use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use critiq::notifier::{LogNotifier, MailerSendNotifier, Notifier};
use critiq::state::AppState;
use critiq::{api, config, db, seed, tmdb};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "critiq=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize database
    let db = db::init_db(&config.database_url)
        .await
        .expect("Failed to initialize database");

    // Check for seed flag
    if std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    // Batch import from TMDB. Never part of the request path.
    if std::env::var("IMPORT_TMDB").is_ok() {
        match &config.tmdb_api_token {
            Some(token) => match tmdb::TmdbClient::new(token.clone()) {
                Ok(client) => {
                    // 5 pages x ~20 movies per page
                    match tmdb::import_movies(&db, &client, 5).await {
                        Ok(count) => tracing::info!("Imported {} movies from TMDB", count),
                        Err(e) => tracing::error!("TMDB import failed: {}", e),
                    }
                }
                Err(e) => tracing::error!("Failed to build TMDB client: {}", e),
            },
            None => tracing::error!("IMPORT_TMDB is set but TMDB_API_TOKEN is missing"),
        }
    }

    // Outbound email: real delivery when a key is configured, logged codes
    // otherwise.
    let notifier: Arc<dyn Notifier> = match &config.mailersend_api_key {
        Some(key) => match MailerSendNotifier::new(key.clone()) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                tracing::error!("Failed to build MailerSend client: {}", e);
                return;
            }
        },
        None => {
            tracing::warn!("MAILERSEND_API_KEY not set, verification codes will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState::new(db, notifier);

    // Build API router
    let api_router = api::api_router(state);

    // Swagger UI
    use critiq::api_docs::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    // CORS configuration
    let cors = if config.cors_allowed_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors_allowed_origins {
            match origin.parse::<axum::http::HeaderValue>() {
                Ok(v) => origins.push(v),
                Err(e) => tracing::error!("Failed to parse CORS origin '{}': {}", origin, e),
            }
        }
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/api/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_router)
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Critiq server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

/// Server setup and initialization
///
/// Wires together all components: catalog, object store, delivery dispatcher,
/// and HTTP routes. Every collaborator is constructed here, once, so a
/// misconfiguration fails startup instead of the first request.

use crate::{
    api::{
        create_object_routes, create_shortcut_routes, create_webhook_routes, AppState,
        ObjectsState,
    },
    catalog::CatalogRegistry,
    config::Config,
    delivery::DeliveryDispatcher,
    storage::{FsObjectStore, ObjectStore},
};
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main Axum application with all routes and middleware
///
/// Builds the catalog and the filesystem object store, then hands them to the router.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("📚 Loading app catalog");
    let catalog = Arc::new(CatalogRegistry::builtin());
    tracing::debug!("📚 Catalog apps: {:?}", catalog.all_ids());

    tracing::info!("🗄️ Initializing object store at {}", config.storage.root_dir);
    let store = Arc::new(
        FsObjectStore::new(&config.storage)
            .map_err(|e| anyhow::anyhow!("Failed to initialize object store: {}", e))?,
    );

    tracing::info!("🏗️ Creating application state");
    let store_gateway: Arc<dyn ObjectStore> = store.clone();
    let app_state = AppState {
        catalog,
        dispatcher: DeliveryDispatcher::new(store_gateway),
        shortcuts: Arc::new(config.shortcuts.clone()),
    };

    tracing::info!(
        "🔗 Default webhook URL: {}",
        config.shortcuts.default_webhook_url()
    );

    let app = build_router(app_state, Some(ObjectsState { store }));

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Assemble the router from prepared state
///
/// Object download routes are only mounted when a filesystem store backs the
/// signed URLs.
pub fn build_router(app_state: AppState, objects: Option<ObjectsState>) -> Router {
    let api_routes = create_shortcut_routes()
        .merge(create_webhook_routes())
        .with_state(app_state);

    let mut app = Router::new()
        // Health check endpoints
        .route("/", get(service_status))
        .route("/healthz", get(health_check))
        // Shortcut and webhook API
        .nest("/api", api_routes);

    if let Some(objects_state) = objects {
        app = app.merge(create_object_routes().with_state(objects_state));
    }

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.layer(cors).layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and starts the Axum server on the configured address and port.
pub async fn start_server(config: Config) -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting Miivvy shortcut server...");

    // Create the application
    let app = create_app(config.clone()).await?;

    // Bind to the configured address
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    // Start the server
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Service status at the root path
async fn service_status() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Miivvy Backend API is running",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint handler
async fn health_check() -> &'static str {
    "ok"
}

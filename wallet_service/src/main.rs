use std::env;
use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use wallet_core::WalletCore;
use wallet_service::api::{
    http_routes::{routes, AppState},
    response::ApiResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        wallet_service::api::http_routes::top_up,
        wallet_service::api::http_routes::grant_bonus,
        wallet_service::api::http_routes::spend,
        wallet_service::api::http_routes::get_balance,
        wallet_service::api::http_routes::get_asset_type,
        wallet_service::api::http_routes::list_transactions,
    ),
    components(schemas(ApiResponse<serde_json::Value>))
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Cargar variables de entorno
    dotenv().ok();

    // 2. Configurar Logging/Tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Wallet Service...");

    // 3. Configurar Conexión a Base de Datos
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = PgPoolOptions::new()
        .max_connections(50)
        .connect(&database_url)
        .await?;

    info!("Connected to Database");

    // 4. Construir el núcleo transaccional (motor de ledger + superficie de consulta)
    let core = WalletCore::connect(pool).await?;

    // 5. Configurar Estado de la App Axum
    let app_state = Arc::new(AppState { core });

    // 6. Configurar Rutas y Servidor HTTP
    let app = routes(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{host}:{port}");

    info!("HTTP Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

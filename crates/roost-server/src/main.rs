use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use roost_api::auth::{self, AppState, AppStateInner};
use roost_api::checklists;
use roost_api::middleware::require_auth;
use roost_api::species;
use roost_api::stats;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roost=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("ROOST_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("ROOST_DB_PATH").unwrap_or_else(|_| "roost.db".into());
    let uploads_dir = std::env::var("ROOST_UPLOADS_DIR").unwrap_or_else(|_| "uploads".into());
    let host = std::env::var("ROOST_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("ROOST_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database, then load CSV fixtures before accepting traffic
    let db = roost_db::Database::open(&PathBuf::from(&db_path))?;
    roost_db::seed::run_all(&db, &PathBuf::from(&uploads_dir));

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/species", get(species::list_species))
        .route("/hotspots", get(stats::list_hotspots))
        .route("/get_bird_sightings", post(stats::get_bird_sightings))
        .route("/get_hotspot_details", post(stats::get_hotspot_details))
        .route("/get_region_statistics", get(stats::get_region_statistics))
        .route("/get_top_species", get(stats::get_top_species))
        .route("/get_top_contributors", get(stats::get_top_contributors))
        .route(
            "/get_top_species_by_duration",
            get(stats::get_top_species_by_duration),
        )
        .route(
            "/get_species_time_series",
            get(stats::get_species_time_series),
        )
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/checklists", get(checklists::list_checklists))
        .route("/my_checklists", get(checklists::list_my_checklists))
        .route("/submit_checklist", post(checklists::submit_checklist))
        .route(
            "/edit_checklist/{checklist_id}",
            post(checklists::edit_checklist),
        )
        .route(
            "/delete_checklist/{checklist_id}",
            delete(checklists::delete_checklist),
        )
        .route(
            "/get_user_bird_statistics",
            get(stats::get_user_bird_statistics),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Roost server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! The backend for the school's co-curricular activity hub

use anyhow::{Context as _, Result};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql::{Request, Response};
use axum::extract::Extension;
use axum::handler::Handler;
use axum::http::HeaderMap;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use cca_hub::config::Config;
use cca_hub::db::{connect_to_db, connect_to_store};
use cca_hub::error::{CcaError, CcaResult};
use cca_hub::graphql::{build_schema, CcaSchema};
use cca_hub::models::profile::Profile;

const CCA_TOKEN: &str = "cca-token";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_logging(&config.log_level)?;

    let pool = connect_to_db(&config).await?;
    let database = connect_to_store(&config).await?;
    let schema = build_schema(pool.clone(), database);

    let app = Router::new()
        .route("/", get(playground).post(query))
        .route("/health", get(health))
        .fallback(not_found.into_service())
        .layer(Extension(schema))
        .layer(Extension(pool))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    tracing::info!(address = %config.bind_address, "listening");

    axum::Server::bind(&config.bind_address)
        .serve(app.into_make_service())
        .await
        .context("Server failed")
}

fn init_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialize logging")
}

async fn query(
    Extension(schema): Extension<CcaSchema>,
    Extension(pool): Extension<PgPool>,
    headers: HeaderMap,
    Json(request): Json<Request>,
) -> CcaResult<Json<Response>> {
    let mut request = request;

    if let Some(token) = get_token(&headers)? {
        let profile = Profile::with_token_opt(token, &pool)
            .await
            .map_err(|err| {
                tracing::error!(error = %err.message, "failed to look up token");
                CcaError::Unauthorized
            })?
            .ok_or(CcaError::Unauthorized)?;

        tracing::debug!(user_id = %profile.id, role = ?profile.role, "authenticated request");
        request = request.data(profile.caller()).data(profile);
    }

    Ok(Json(schema.execute(request).await))
}

async fn playground(headers: HeaderMap) -> CcaResult<Html<String>> {
    let mut config = GraphQLPlaygroundConfig::new("/");
    if let Some(token) = get_token(&headers)? {
        config = config.with_header(CCA_TOKEN, token);
    }

    Ok(Html(playground_source(config)))
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found() -> CcaError {
    CcaError::NotFound
}

fn get_token(headers: &HeaderMap) -> CcaResult<Option<&str>> {
    headers
        .get(CCA_TOKEN)
        .map(|value| value.to_str().map_err(CcaError::InvalidTokenHeader))
        .transpose()
}

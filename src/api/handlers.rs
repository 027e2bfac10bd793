//! API Handlers
//!
//! HTTP request handlers for each cache endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::TieredCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// The tiers lock themselves, so the cache is shared behind a plain Arc.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<TieredCache<String, String>>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: TieredCache<String, String>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration, building both tiers.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = TieredCache::from_config(config.cache_config()?)?;
        Ok(Self::new(cache))
    }
}

/// Handler for PUT /set
///
/// Writes a key-value pair through to every configured tier.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.put(req.key.clone(), req.value).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Looks the key up in memory, then on disk (promoting disk hits).
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get_cached(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Removes the key from both tiers; 404 if neither held it.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.cache.remove(&key).await? {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.cache.clear().await?;
    Ok(Json(ClearResponse::new()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats().await?;
    Ok(Json(StatsResponse::from(stats)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

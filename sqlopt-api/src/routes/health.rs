/// Health check endpoint
///
/// Verifies that the server is running and the database answers.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "backend": "postgres",
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 },
///   "migrations": { "applied_migrations": 2, "latest_version": 20250201000000 }
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// "healthy" or "degraded"
    pub status: String,

    /// Application version
    pub version: String,

    /// "connected" or "disconnected"
    pub database: String,

    /// Store backend name
    pub backend: String,

    /// Connection pool usage
    pub pool: PoolInfo,

    /// Applied schema migrations, absent when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationInfo>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoolInfo {
    pub active_connections: usize,
    pub idle_connections: usize,
    pub total_connections: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationInfo {
    pub applied_migrations: usize,
    pub latest_version: Option<i64>,
}

/// Health check handler
///
/// Returns 200 when the database is reachable and 503 otherwise.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let connected = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    let migrations = if connected {
        match state.store.migration_status().await {
            Ok(status) => Some(MigrationInfo {
                applied_migrations: status.applied_migrations,
                latest_version: status.latest_version,
            }),
            Err(e) => {
                warn!(error = %e, "Failed to read migration status");
                None
            }
        }
    } else {
        None
    };

    let stats = state.store.pool_stats();
    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if connected { "healthy" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: if connected { "connected" } else { "disconnected" }.to_string(),
            backend: state.store.backend().to_string(),
            pool: PoolInfo {
                active_connections: stats.active_connections,
                idle_connections: stats.idle_connections,
                total_connections: stats.total_connections,
            },
            migrations,
        }),
    )
}

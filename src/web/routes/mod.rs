pub mod alert_routes;
pub mod metrics_routes;
pub mod monitor_routes;

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::web::error::AppError;
use crate::web::AppState;

/// Gate for batch-trigger endpoints: requires the shared cron secret in
/// the `x-cron-secret` header.
pub(crate) fn require_cron_secret(state: &Arc<AppState>, headers: &HeaderMap) -> Result<(), AppError> {
    let presented = headers
        .get("x-cron-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if presented != state.config.cron_secret {
        return Err(AppError::Unauthorized("Invalid cron secret".to_string()));
    }
    Ok(())
}

/// Extracts the bearer token from the Authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid authorization header".to_string())
        })
}

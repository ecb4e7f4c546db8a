//! HTTP handlers for connection endpoints.

use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequestParts, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::warn;

use crate::application::{
    AnalysisError, AnalyzeConnectionsCommand, AnalyzeConnectionsHandler, GetConnectionsHandler,
    GetConnectionsQuery,
};
use crate::domain::connections::AnalysisOptions;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};

use super::dto::{
    AnalyzeConnectionsRequest, AnalyzeConnectionsResponse, ConnectionListResponse, ErrorResponse,
};

/// Header carrying the caller's user id, set by the upstream gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Application state for connection endpoints.
#[derive(Clone)]
pub struct ConnectionsAppState {
    pub analyze_handler: Arc<AnalyzeConnectionsHandler>,
    pub get_handler: Arc<GetConnectionsHandler>,
    /// Options used for fields a request leaves out
    pub defaults: AnalysisOptions,
    /// Include internal failure detail in responses
    pub verbose_errors: bool,
}

// ════════════════════════════════════════════════════════════════════════════════
// User Context
// ════════════════════════════════════════════════════════════════════════════════

/// Caller identity taken from [`USER_ID_HEADER`].
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: UserId,
}

/// Rejection when the user header is missing or empty.
pub struct UserIdRequired;

impl IntoResponse for UserIdRequired {
    fn into_response(self) -> Response {
        let error = ErrorResponse::new(
            ErrorCode::Unauthorized.to_string(),
            format!("The {} header is required", USER_ID_HEADER),
        );
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = UserIdRequired;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| UserId::new(s.trim()).ok())
            .ok_or(UserIdRequired)?;

        Ok(UserContext { user_id })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/connections/analyze - Run analysis and replace stored connections
///
/// An empty body uses the configured defaults.
pub async fn analyze_connections(
    State(state): State<ConnectionsAppState>,
    user: UserContext,
    body: Bytes,
) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        AnalyzeConnectionsRequest::default()
    } else {
        match serde_json::from_slice::<AnalyzeConnectionsRequest>(&body) {
            Ok(request) => request,
            Err(e) => {
                let response = AnalyzeConnectionsResponse::failure(
                    ErrorCode::InvalidFormat.to_string(),
                    format!("invalid request body: {}", e),
                );
                return (StatusCode::BAD_REQUEST, Json(response)).into_response();
            }
        }
    };

    let cmd = AnalyzeConnectionsCommand {
        user_id: user.user_id,
        options: request.to_options(&state.defaults),
        as_of: request.as_of,
    };

    match state.analyze_handler.handle(cmd).await {
        Ok(result) => (StatusCode::OK, Json(AnalyzeConnectionsResponse::from(result))).into_response(),
        Err(err) => analysis_failure(&err, state.verbose_errors),
    }
}

/// GET /api/connections - List stored connections, strongest first
pub async fn list_connections(
    State(state): State<ConnectionsAppState>,
    user: UserContext,
) -> Response {
    let query = GetConnectionsQuery {
        user_id: user.user_id,
    };
    match state.get_handler.handle(query).await {
        Ok(connections) => {
            (StatusCode::OK, Json(ConnectionListResponse::from(connections))).into_response()
        }
        Err(err) => store_failure(&err, state.verbose_errors),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

fn analysis_failure(err: &AnalysisError, verbose: bool) -> Response {
    let status = match err {
        AnalysisError::InvalidOptions(_) => StatusCode::BAD_REQUEST,
        AnalysisError::DataSource(_) => StatusCode::SERVICE_UNAVAILABLE,
        AnalysisError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        AnalysisError::Persistence(_) | AnalysisError::Worker(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    // Client mistakes and timeouts are always safe to echo back.
    let reason = match err {
        AnalysisError::InvalidOptions(_) | AnalysisError::Timeout { .. } => err.to_string(),
        _ if verbose => err.to_string(),
        AnalysisError::DataSource(_) => "domain data is currently unavailable".to_string(),
        _ => "analysis failed".to_string(),
    };

    let response = AnalyzeConnectionsResponse::failure(err.code().to_string(), reason);
    (status, Json(response)).into_response()
}

fn store_failure(err: &DomainError, verbose: bool) -> Response {
    warn!(error = %err, "Failed to list connections");
    let message = if verbose {
        err.to_string()
    } else {
        "connections are currently unavailable".to_string()
    };
    let body = ErrorResponse::new(err.code.to_string(), message);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ValidationError;

    #[test]
    fn invalid_options_map_to_bad_request_with_detail() {
        let err = AnalysisError::InvalidOptions(ValidationError::out_of_range(
            "min_p_value",
            0.0,
            1.0,
            2.0,
        ));
        let response = analysis_failure(&err, false);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn timeouts_map_to_gateway_timeout() {
        let response = analysis_failure(&AnalysisError::Timeout { timeout_secs: 60 }, false);
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn data_source_outage_maps_to_service_unavailable() {
        let err = AnalysisError::DataSource(DomainError::new(
            ErrorCode::DataSourceUnavailable,
            "offline",
        ));
        assert_eq!(
            analysis_failure(&err, false).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}

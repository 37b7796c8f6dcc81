use crate::auth::{bearer_token, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::field::display;

pub async fn require_auth(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected request without bearer token");
            return ApiError::Unauthorized("Couldn't find JWT".to_string()).into_response();
        }
    };

    match state.verifier.validate(token) {
        Ok(user_id) => {
            tracing::Span::current().record("user_id", display(user_id));
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Rejected invalid bearer token");
            ApiError::Unauthorized("Couldn't validate JWT".to_string()).into_response()
        }
    }
}

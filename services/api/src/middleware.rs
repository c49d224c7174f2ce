//! Authentication middleware for the protected route tree.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::RequestIdentity;
use crate::error::ApiError;
use crate::state::AppState;

/// Resolve the acting user through the strategy chain and stash it in the
/// request extensions; reject the request when no strategy yields one.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = RequestIdentity::from_request(&req);
    let user = state
        .authenticator
        .resolve(&identity)
        .await?
        .ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

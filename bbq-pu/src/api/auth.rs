//! Access guard middleware
//!
//! Reads the caller identity forwarded by the identity gateway and rejects
//! the request before any handler (and any CSV parsing) runs. The accepted
//! [`Caller`] is stored in request extensions.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use bbq_common::api::{Caller, USER_ID_HEADER, USER_ROLE_HEADER};
use tracing::warn;

use crate::error::ApiError;
use crate::AppState;

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn caller_from_request(state: &AppState, request: &Request) -> Caller {
    if state.trust_all {
        return Caller::trusted();
    }
    let headers = request.headers();
    Caller::from_header_values(
        header_value(headers, USER_ID_HEADER),
        header_value(headers, USER_ROLE_HEADER),
    )
}

/// Any authenticated caller
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = caller_from_request(&state, &request);
    if let Err(e) = caller.require_user() {
        warn!(path = %request.uri().path(), "Rejected request: {}", e);
        return Err(e.into());
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

/// Authenticated caller with the admin role
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let caller = caller_from_request(&state, &request);
    if let Err(e) = caller.require_admin() {
        warn!(
            path = %request.uri().path(),
            user = caller.user_id.as_deref().unwrap_or("-"),
            "Rejected admin request: {}",
            e
        );
        return Err(e.into());
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

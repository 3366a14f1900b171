// SPDX-License-Identifier: MIT

//! Identity middleware.
//!
//! Authentication itself lives in an upstream gateway; by the time a
//! request reaches this service the authenticated user id arrives in the
//! `X-User-Id` header. This middleware only requires the header to be
//! present and well-formed and exposes it as an [`AuthUser`] extension.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};

const USER_ID_HEADER: &str = "x-user-id";
const MAX_USER_ID_LEN: usize = 128;

/// Authenticated user for the current request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Middleware that requires an authenticated user id on the request.
pub async fn require_user(mut request: Request, next: Next) -> Result<Response, StatusCode> {
    let user_id = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_USER_ID_LEN)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    request.extensions_mut().insert(AuthUser { user_id });
    Ok(next.run(request).await)
}

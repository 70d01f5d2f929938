use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    error::HttpError,
    models::usermodel::{AuthUser, UserRole},
    utils::token,
    AppState,
};

/// Resolve the caller from a `token` cookie or a Bearer header and stash an
/// AuthUser in the request extensions. Tokens are self-contained; no user
/// lookup happens here.
pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| {
                    auth_value
                        .strip_prefix("Bearer ")
                        .map(|value| value.to_owned())
                })
        })
        .ok_or_else(|| HttpError::unauthorized("You are not logged in, please provide a token"))?;

    let claims = token::decode_token(token, app_state.env.jwt_secret.as_bytes())
        .map_err(|_| HttpError::unauthorized("Authentication token is invalid or expired"))?;

    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| HttpError::unauthorized("Authentication token is invalid or expired"))?;

    let role = UserRole::from_str(&claims.role)
        .ok_or_else(|| HttpError::unauthorized("Authentication token is invalid or expired"))?;

    req.extensions_mut().insert(AuthUser { id: user_id, role });

    Ok(next.run(req).await)
}

/// Gate for the administrative routes; runs after `auth`.
pub async fn require_admin(req: Request, next: Next) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(|| HttpError::unauthorized("User not authenticated"))?;

    if user.role != UserRole::Admin {
        return Err(HttpError::forbidden("You are not allowed to perform this action"));
    }

    Ok(next.run(req).await)
}

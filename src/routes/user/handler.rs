use axum::{
    extract::{Json, State, rejection::JsonRejection},
    http::StatusCode,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{
    AppState,
    auth::{LoginRequest, SignupRequest},
    error::AppError,
};

use super::model::{LoginResponse, SignupResponse, VerifyTokenResponse};

#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Unreadable signup body: {}", e);
        AppError::Validation
    })?;

    let user = state.auth.signup(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully",
            user,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("Unreadable login body: {}", e);
        AppError::Validation
    })?;

    let token = state.auth.login(req).await?;

    Ok(Json(LoginResponse {
        message: "Login successful",
        token,
    }))
}

/// Checks a `Bearer` token. Invalid tokens get a structured `isValid: false` body.
#[axum::debug_handler]
pub async fn verify_token(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Json<VerifyTokenResponse>, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.map_err(|_| AppError::MissingToken)?;
    let token = bearer.token();
    if token.is_empty() {
        return Err(AppError::MissingToken);
    }

    let claims = state.auth.verify_token(token)?;

    Ok(Json(VerifyTokenResponse {
        is_valid: true,
        user_id: claims.user_id,
        email: claims.email,
    }))
}

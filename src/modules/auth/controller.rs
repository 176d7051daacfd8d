use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use validator::Validate;

use crate::AppState;
use crate::modules::auth::{
    interface::{ServiceError, ServiceErrorType},
    schema::{
        ErrorResponse, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
        RegistrationVerifyRequest, RegistrationVerifyResponse,
    },
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn service_error(err: ServiceError) -> ApiError {
    (err.status_code(), Json(ErrorResponse::from(&err)))
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    if let Err(e) = req.validate() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::with_message(
                ServiceErrorType::ValidationFailed.as_str(),
                e.to_string(),
            )),
        ));
    }

    let user = state.user_service.register(req).await.map_err(service_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user: user.into() }),
    ))
}

pub async fn register_verify(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegistrationVerifyRequest>,
) -> Result<(StatusCode, Json<RegistrationVerifyResponse>), ApiError> {
    let user = state
        .user_service
        .register_verify(req)
        .await
        .map_err(service_error)?;

    Ok((
        StatusCode::OK,
        Json(RegistrationVerifyResponse {
            message: "Email verified",
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), ApiError> {
    let result = state.user_service.login(req).await.map_err(service_error)?;

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            access_token: result.tokens.access_token,
            refresh_token: result.tokens.refresh_token,
            token_type: "Bearer",
            expires_in: result.tokens.expires_in,
        }),
    ))
}

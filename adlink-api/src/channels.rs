use adlink_channel::{VerificationState, VerificationTicket};
use adlink_shared::{Channel, NewChannel};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath};
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfirmVerificationRequest {
    pub code: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/channels", get(list_my_channels).post(register_channel))
        .route("/api/channels/{id}", get(get_channel))
        .route(
            "/api/channels/{id}/verification",
            get(verification_state).post(request_verification),
        )
        .route("/api/channels/{id}/verification/confirm", post(confirm_verification))
}

async fn list_my_channels(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> Result<Json<Vec<Channel>>, AppError> {
    Ok(Json(state.channels.list_channels(caller.user_id).await?))
}

async fn register_channel(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(payload): ApiJson<NewChannel>,
) -> Result<(StatusCode, Json<Channel>), AppError> {
    let channel = state.channels.register_channel(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}

async fn get_channel(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Channel>, AppError> {
    Ok(Json(state.channels.get_channel(id).await?))
}

async fn verification_state(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<VerificationState>, AppError> {
    Ok(Json(state.channels.verification_state(&caller, id).await?))
}

async fn request_verification(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<VerificationTicket>, AppError> {
    Ok(Json(state.channels.request_verification(&caller, id).await?))
}

async fn confirm_verification(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ConfirmVerificationRequest>,
) -> Result<Json<Channel>, AppError> {
    Ok(Json(state.channels.confirm_verification(&caller, id, &payload.code).await?))
}

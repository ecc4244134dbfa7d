use adlink_channel::Recommendation;
use adlink_shared::{NewOffer, Offer, OfferFilter};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::error::AppError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/offers", get(list_offers).post(create_offer))
        .route("/api/offers/{id}", get(get_offer))
        .route("/api/offers/{id}/publish", post(publish_offer))
        .route("/api/offers/{id}/cancel", post(cancel_offer))
        .route("/api/offers/{id}/recommended-channels", get(recommended_channels))
}

async fn list_offers(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<OfferFilter>,
) -> Result<Json<Vec<Offer>>, AppError> {
    let offers = state.offers.list_offers(&filter).await?;
    Ok(Json(offers))
}

async fn create_offer(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiJson(payload): ApiJson<NewOffer>,
) -> Result<(StatusCode, Json<Offer>), AppError> {
    let offer = state.offers.create_offer(&caller, payload).await?;
    Ok((StatusCode::CREATED, Json(offer)))
}

async fn get_offer(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.offers.get_offer(id).await?))
}

async fn publish_offer(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.offers.publish_offer(&caller, id).await?))
}

async fn cancel_offer(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Offer>, AppError> {
    Ok(Json(state.offers.cancel_offer(&caller, id).await?))
}

async fn recommended_channels(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    Ok(Json(state.recommendations.recommend(id).await?))
}

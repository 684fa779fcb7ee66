use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::models::NutrientFacts;
use crate::service::api::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ImagePayload {
    /// Base64 image, optionally as a `data:` URL.
    pub image: String,
}

/// `POST /api/foodi/getNutrients`
pub async fn get_nutrients(
    State(state): State<AppState>,
    Json(payload): Json<ImagePayload>,
) -> ApiResult<Json<NutrientFacts>> {
    let facts = state.food.scan(&payload.image).await?;
    Ok(Json(facts))
}

use axum::extract::{Json, State};

use crate::{AppState, cache::keys::NEPALESE_CHART_KEY, charts::TrackSummary, error::AppError};

#[axum::debug_handler]
pub async fn nepalese_chart(
    State(state): State<AppState>,
) -> Result<Json<Vec<TrackSummary>>, AppError> {
    let tracks = state.charts.get_or_fetch(NEPALESE_CHART_KEY).await?;
    Ok(Json(tracks))
}

//! Help-desk chat and weather widget routes.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::services::weather::WeatherReport;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/v1/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = state.chat.reply(&request.message).await;
    Json(ChatResponse { reply })
}

/// GET /api/v1/weather/today
pub async fn weather_today(State(state): State<AppState>) -> Json<WeatherReport> {
    Json(state.weather.today().await)
}

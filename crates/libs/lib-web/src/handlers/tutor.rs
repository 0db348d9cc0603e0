//! # Tutor Handler
//!
//! Proxy endpoint that turns a math topic into a short student-level
//! explanation via the Gemini API. The API key never reaches the client;
//! without one the endpoint answers 503.

use axum::extract::{Json, State};
use lib_core::dto::{ExplainRequest, ExplainResponse};
use lib_core::{AppError, Config, Result};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

/// Explanation handler for `POST /api/explain-math`.
pub async fn explain_math(
    State(config): State<Config>,
    Json(req): Json<ExplainRequest>,
) -> Result<Json<ExplainResponse>> {
    info!("[TUTOR] Explanation request");

    let Some(api_key) = config.gemini_api_key.as_deref() else {
        return Err(AppError::Unavailable(
            "Explanations are not available right now".to_string(),
        ));
    };

    let topic = req.topic.trim();
    if topic.is_empty() {
        return Err(AppError::InvalidInput("Topic is required".to_string()));
    }

    debug!("[TUTOR] Topic: {}", topic);

    let body = json!({
        "contents": [{
            "parts": [{ "text": build_prompt(topic) }]
        }]
    });

    let client = reqwest::Client::new();
    let response = client
        .post(GEMINI_URL)
        .query(&[("key", api_key)])
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            warn!("[TUTOR] Upstream request failed: {}", e);
            AppError::Upstream(format!("Explanation request failed: {}", e))
        })?;

    if !response.status().is_success() {
        warn!("[TUTOR] Upstream answered {}", response.status());
        return Err(AppError::Upstream(format!(
            "Explanation service answered {}",
            response.status()
        )));
    }

    let payload: Value = response.json().await.map_err(|e| {
        warn!("[TUTOR] Unparseable upstream response: {}", e);
        AppError::Upstream("Unparseable explanation response".to_string())
    })?;

    let explanation = extract_text(&payload).ok_or_else(|| {
        warn!("[TUTOR] Upstream response missing text");
        AppError::Upstream("Empty explanation response".to_string())
    })?;

    Ok(Json(ExplainResponse { explanation }))
}

/// Prompt sent to the model for a topic.
fn build_prompt(topic: &str) -> String {
    format!(
        "Explain the math topic \"{}\" to a middle-school student in a few \
         short paragraphs, with one worked example.",
        topic
    )
}

/// Pull the first candidate's text out of a Gemini generateContent response.
fn extract_text(payload: &Value) -> Option<String> {
    payload["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .map(str::to_string)
}

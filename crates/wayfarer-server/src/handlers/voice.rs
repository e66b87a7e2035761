//! Voice input: raw audio in, transcribed text out.
//!
//! The audio arrives as the request body and is handed to the speech
//! backend directly; nothing touches disk.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use wayfarer_core::error::Error;

use crate::app::{AppError, AppState, CurrentUser};

fn default_sample_rate() -> u32 {
    16000
}

fn default_language() -> String {
    "zh".to_owned()
}

#[derive(Debug, Deserialize)]
pub struct TranscribeParams {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_language")]
    pub language: String,
}

/// Transcribe PCM audio posted as the request body.
pub async fn transcribe(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<TranscribeParams>,
    audio: Bytes,
) -> Result<Json<Value>, AppError> {
    if audio.is_empty() {
        return Err(Error::validation("audio body must not be empty").into());
    }

    let text = state
        .transcriber
        .transcribe(&audio, params.sample_rate, &params.language)
        .await?;
    Ok(Json(json!({ "text": text })))
}

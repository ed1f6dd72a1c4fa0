//! Transcribe+Score endpoint client.
//!
//! Uploads a recorded clip together with the target phrase; the endpoint
//! transcribes the clip and scores it against the target.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::progress::SubscriptionTier;

use super::{http_client, map_error_status, resolve_api_key, GatewayError};

/// Result of a scoring call. Optional fields reflect the loosely-typed
/// upstream JSON; normalization happens in the feedback evaluator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoreReply {
    pub score: Option<u32>,
    pub passed: Option<bool>,
    pub feedback: String,
    #[serde(rename = "missedWords")]
    pub missed_words: Vec<String>,
    pub transcript: Option<String>,
}

/// Submit a recorded clip for transcription and scoring against
/// `target_text`.
pub async fn submit(
    base_url: &str,
    audio_path: &Path,
    target_text: &str,
    tier: SubscriptionTier,
    key_override: Option<&str>,
) -> Result<ScoreReply, GatewayError> {
    let user_key = resolve_api_key(tier, key_override)?;

    let file_bytes = tokio::fs::read(audio_path)
        .await
        .map_err(|e| GatewayError::FileRead(e.to_string()))?;

    let filename = audio_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.webm")
        .to_string();

    log::info!(
        "Score: uploading {} ({} bytes) against {:?} chars of target",
        filename,
        file_bytes.len(),
        target_text.len()
    );

    let file_part = Part::bytes(file_bytes)
        .file_name(filename)
        .mime_str("audio/webm")
        .map_err(|e| GatewayError::Parse(e.to_string()))?;

    let mut form = Form::new()
        .part("audio", file_part)
        .text("originalText", target_text.to_string())
        .text("tier", tier.wire_name());
    if let Some(key) = user_key {
        form = form.text("userApiKey", key);
    }

    let response = http_client()
        .post(format!("{}/api/score", base_url))
        .multipart(form)
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        let reply: ScoreReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        log::info!(
            "Score: got score={:?} passed={:?}",
            reply.score,
            reply.passed
        );
        Ok(reply)
    } else {
        let body = response.text().await.unwrap_or_default();
        let err = map_error_status(status.as_u16(), &body);
        log::warn!("Score: endpoint error ({}): {}", status.as_u16(), err);
        Err(err)
    }
}

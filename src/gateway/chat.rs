//! Transcribe+Chat endpoint client for roleplay and teacher-chat turns.
//!
//! Uploads the recorded utterance with the scenario metadata and the running
//! conversation history; the endpoint transcribes, replies in character, and
//! scores the turn. The session duration budget is enforced here before any
//! upload: an expired session never reaches the wire.

use std::path::Path;

use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::progress::SubscriptionTier;

use super::{http_client, map_error_status, resolve_api_key, GatewayError};

/// One turn of roleplay conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Scenario metadata forwarded with every chat turn.
#[derive(Debug, Clone)]
pub struct ChatScenario {
    pub scenario: String,
    pub user_role: String,
    pub ai_role: String,
    pub leader_mode: String,
}

/// Result of a chat turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatReply {
    #[serde(rename = "userText")]
    pub user_text: String,
    #[serde(rename = "aiResponse")]
    pub ai_response: String,
    pub score: Option<u32>,
    pub passed: Option<bool>,
    pub feedback: String,
    #[serde(rename = "missedWords")]
    pub missed_words: Vec<String>,
}

#[allow(clippy::too_many_arguments)]
pub async fn submit(
    base_url: &str,
    audio_path: &Path,
    scenario: &ChatScenario,
    history: &[ChatTurn],
    started_at: DateTime<Utc>,
    session_minutes: u32,
    tier: SubscriptionTier,
    key_override: Option<&str>,
) -> Result<ChatReply, GatewayError> {
    // Policy check, not a scheduler: reject the turn locally once the
    // wall-clock budget is spent.
    let elapsed_minutes = (Utc::now() - started_at).num_minutes();
    if elapsed_minutes >= session_minutes as i64 {
        log::info!(
            "Chat: session budget exhausted ({}min elapsed, {}min allowed)",
            elapsed_minutes,
            session_minutes
        );
        return Err(GatewayError::SessionExpired);
    }

    let user_key = resolve_api_key(tier, key_override)?;

    let file_bytes = tokio::fs::read(audio_path)
        .await
        .map_err(|e| GatewayError::FileRead(e.to_string()))?;

    let filename = audio_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio.webm")
        .to_string();

    let history_json =
        serde_json::to_string(history).map_err(|e| GatewayError::Parse(e.to_string()))?;

    log::info!(
        "Chat: uploading {} ({} bytes), {} history turns",
        filename,
        file_bytes.len(),
        history.len()
    );

    let file_part = Part::bytes(file_bytes)
        .file_name(filename)
        .mime_str("audio/webm")
        .map_err(|e| GatewayError::Parse(e.to_string()))?;

    let mut form = Form::new()
        .part("audio", file_part)
        .text("scenario", scenario.scenario.clone())
        .text("history", history_json)
        .text("userRole", scenario.user_role.clone())
        .text("aiRole", scenario.ai_role.clone())
        .text("leaderMode", scenario.leader_mode.clone())
        .text("startTime", started_at.timestamp_millis().to_string())
        .text("duration", session_minutes.to_string())
        .text("tier", tier.wire_name());
    if let Some(key) = user_key {
        form = form.text("userApiKey", key);
    }

    let response = http_client()
        .post(format!("{}/api/chat", base_url))
        .multipart(form)
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        log::info!(
            "Chat: turn scored {:?}, reply {} chars",
            reply.score,
            reply.ai_response.len()
        );
        Ok(reply)
    } else {
        let body = response.text().await.unwrap_or_default();
        let err = map_error_status(status.as_u16(), &body);
        log::warn!("Chat: endpoint error ({}): {}", status.as_u16(), err);
        Err(err)
    }
}

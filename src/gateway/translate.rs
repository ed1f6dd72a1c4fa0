//! Translation endpoint client. Best effort: a failure is surfaced as an
//! error string and never blocks the practice session.

use serde::Deserialize;

use super::{http_client, map_error_status, GatewayError};

#[derive(Debug, Deserialize)]
struct TranslateReply {
    translation: String,
}

/// Look up a dictionary-style translation of `word` into the target
/// language (`"my"`, `"zh"`, `"ja"`).
pub async fn lookup(base_url: &str, word: &str, lang: &str) -> Result<String, GatewayError> {
    let response = http_client()
        .post(format!("{}/api/translate", base_url))
        .json(&serde_json::json!({ "word": word, "lang": lang }))
        .send()
        .await
        .map_err(|e| GatewayError::Network(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        let reply: TranslateReply = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        Ok(reply.translation)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(map_error_status(status.as_u16(), &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_is_a_network_error() {
        let result = lookup("http://127.0.0.1:9", "hello", "my").await;
        assert!(matches!(result, Err(GatewayError::Network(_))));
    }
}

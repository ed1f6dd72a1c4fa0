//! External AI gateway clients.
//!
//! Thin HTTP clients for the serverless endpoints that proxy speech
//! transcription+scoring, roleplay chat, and translation to the AI provider,
//! plus the premium-code store. The core never talks to the provider
//! directly; these are the collaborator contracts it consumes.

pub mod chat;
pub mod codes;
pub mod score;
pub mod translate;

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;

use crate::api_key;
use crate::progress::SubscriptionTier;

pub use chat::{ChatReply, ChatScenario, ChatTurn};
pub use codes::{CodeStore, Redemption, SENTINEL_CODE};
pub use score::ScoreReply;

/// Shared HTTP client (avoids per-request TLS handshake overhead).
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

pub(crate) fn http_client() -> &'static Client {
    HTTP_CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client")
    })
}

/// Errors surfaced by gateway calls.
#[derive(Debug)]
pub enum GatewayError {
    /// Pay-per-use tier with no caller-supplied provider key configured.
    MissingApiKey,
    /// The upstream rejected the supplied credential.
    Unauthorized(String),
    /// Chat turn attempted after the session duration budget ran out.
    SessionExpired,
    /// Redemption code unknown or already redeemed.
    InvalidOrUsedCode,
    /// Admin secret mismatch when generating codes.
    AdminSecretMismatch,
    /// Upstream call errored.
    ServiceUnavailable(String),
    /// Failed to read the recorded audio file.
    FileRead(String),
    /// Network/HTTP failure before a response arrived.
    Network(String),
    /// Response did not match the expected shape.
    Parse(String),
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayError::MissingApiKey => write!(
                f,
                "Provider API key required. Configure one for the API License tier."
            ),
            GatewayError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            GatewayError::SessionExpired => write!(f, "Session time limit reached."),
            GatewayError::InvalidOrUsedCode => write!(f, "Invalid or used code"),
            GatewayError::AdminSecretMismatch => write!(f, "Admin secret mismatch"),
            GatewayError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            GatewayError::FileRead(msg) => write!(f, "Failed to read audio file: {}", msg),
            GatewayError::Network(msg) => write!(f, "Network error: {}", msg),
            GatewayError::Parse(msg) => write!(f, "Failed to parse gateway response: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl GatewayError {
    /// Whether the user should be offered a retry for this failure.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::ServiceUnavailable(_) | GatewayError::Network(_)
        )
    }
}

/// Error body shape returned by every endpoint.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct ErrorReply {
    pub error: String,
}

/// Resolve the provider key to attach to a call. The pay-per-use tier
/// requires a caller-supplied key (explicit override first, then the
/// keyring); other tiers use the server-held key and send none.
pub(crate) fn resolve_api_key(
    tier: SubscriptionTier,
    key_override: Option<&str>,
) -> Result<Option<String>, GatewayError> {
    if tier != SubscriptionTier::ApiLicense {
        return Ok(None);
    }
    let key = key_override
        .map(|k| k.to_string())
        .filter(|k| !k.trim().is_empty())
        .or_else(api_key::get_provider_api_key);
    match key {
        Some(k) => Ok(Some(k)),
        None => Err(GatewayError::MissingApiKey),
    }
}

/// Map a non-success HTTP status plus body to a `GatewayError`.
pub(crate) fn map_error_status(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorReply>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());
    match status {
        401 => GatewayError::Unauthorized(message),
        403 => GatewayError::SessionExpired,
        _ => GatewayError::ServiceUnavailable(message),
    }
}

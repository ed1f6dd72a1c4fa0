//! Secure storage for the user's provider API key using the system keyring.
//!
//! The pay-per-use (API License) tier requires a caller-supplied provider
//! key on every gateway call. It is stored in the OS's native secret
//! storage:
//! - Linux: libsecret (GNOME Keyring/KDE Wallet)
//! - macOS: Keychain
//! - Windows: Credential Manager
//!
//! Security notes:
//! - Never log the key value
//! - Always use masked display in UI
//! - Key is encrypted at rest by OS

use keyring::Entry;

const SERVICE_NAME: &str = "errorparrot";
const PROVIDER_KEY_NAME: &str = "provider-api-key";

/// Retrieve the stored provider API key, if any.
/// Returns None if not configured or on error (errors are logged).
pub fn get_provider_api_key() -> Option<String> {
    let entry = match Entry::new(SERVICE_NAME, PROVIDER_KEY_NAME) {
        Ok(e) => e,
        Err(e) => {
            log::warn!("ApiKey: failed to create keyring entry: {}", e);
            return None;
        }
    };

    match entry.get_password() {
        Ok(key) => {
            if key.is_empty() {
                None
            } else {
                Some(key)
            }
        }
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            log::warn!("ApiKey: failed to retrieve key: {}", e);
            None
        }
    }
}

/// Store the provider API key in the system keyring.
/// Pass None to delete the key.
pub fn set_provider_api_key(key: Option<&str>) -> Result<(), String> {
    let entry = Entry::new(SERVICE_NAME, PROVIDER_KEY_NAME)
        .map_err(|e| format!("Failed to create keyring entry: {}", e))?;

    match key {
        Some(k) if !k.is_empty() => {
            entry
                .set_password(k)
                .map_err(|e| format!("Failed to store provider key: {}", e))?;
            // Log action without the key value
            log::info!("ApiKey: stored new provider API key");
        }
        _ => {
            match entry.delete_credential() {
                Ok(()) => log::info!("ApiKey: deleted provider API key"),
                Err(keyring::Error::NoEntry) => {
                    // Already deleted, that's fine
                }
                Err(e) => return Err(format!("Failed to delete provider key: {}", e)),
            }
        }
    }

    Ok(())
}

/// Returns whether a provider API key is currently configured.
pub fn is_provider_key_configured() -> bool {
    get_provider_api_key().is_some()
}

/// Returns a masked version of the key for display (e.g., "gsk...abc123")
pub fn get_masked_provider_key() -> Option<String> {
    get_provider_api_key().map(|key| {
        if key.len() <= 8 {
            "*".repeat(key.len())
        } else {
            format!("{}...{}", &key[..3], &key[key.len() - 6..])
        }
    })
}

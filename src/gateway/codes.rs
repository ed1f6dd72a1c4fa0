//! Premium redemption codes.
//!
//! A flat keyed map persisted as JSON: `code -> {tier, redeemed}`. Redemption
//! is at-most-once per code; a second attempt fails with
//! `InvalidOrUsedCode`. One reserved sentinel code always succeeds
//! regardless of store state. Generation is gated by an admin secret.

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::progress::SubscriptionTier;

use super::GatewayError;

const CODES_FILE_NAME: &str = "premium_codes.json";

/// Reserved code that always redeems to full access.
pub const SENTINEL_CODE: &str = "ADMIN-FREE-ACCESS";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CodeRecord {
    tier: SubscriptionTier,
    redeemed: bool,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

/// Successful redemption result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    pub tier: SubscriptionTier,
    pub expiry: Option<DateTime<Utc>>,
}

/// Flat-file store of premium codes.
pub struct CodeStore {
    path: PathBuf,
    admin_secret: String,
}

impl CodeStore {
    /// Open the store at the default data location.
    pub fn at_default_location(admin_secret: String) -> Self {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("errorparrot");
        Self::open(dir.join(CODES_FILE_NAME), admin_secret)
    }

    pub fn open(path: PathBuf, admin_secret: String) -> Self {
        Self { path, admin_secret }
    }

    /// Generate a fresh one-shot code for `tier`. Requires the admin secret.
    pub fn generate(
        &self,
        tier: SubscriptionTier,
        secret: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<String, GatewayError> {
        if secret != self.admin_secret {
            log::warn!("Codes: generate rejected, admin secret mismatch");
            return Err(GatewayError::AdminSecretMismatch);
        }

        let suffix = Uuid::new_v4().simple().to_string().to_uppercase();
        let code = format!("EP-{}", &suffix[..9]);

        let mut codes = self.load();
        codes.insert(
            code.clone(),
            CodeRecord {
                tier,
                redeemed: false,
                expiry,
            },
        );
        self.save(&codes);
        log::info!("Codes: generated {} code {}", tier, code);
        Ok(code)
    }

    /// Redeem a code. At most once per code; the sentinel always succeeds.
    pub fn redeem(&self, code: &str) -> Result<Redemption, GatewayError> {
        if code == SENTINEL_CODE {
            return Ok(Redemption {
                tier: SubscriptionTier::ProAccess,
                expiry: None,
            });
        }

        let mut codes = self.load();
        match codes.get_mut(code) {
            Some(record) if !record.redeemed => {
                record.redeemed = true;
                let redemption = Redemption {
                    tier: record.tier,
                    expiry: record.expiry,
                };
                self.save(&codes);
                log::info!("Codes: redeemed {}", code);
                Ok(redemption)
            }
            _ => Err(GatewayError::InvalidOrUsedCode),
        }
    }

    fn load(&self) -> HashMap<String, CodeRecord> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Codes: failed to parse {:?}: {}", self.path, e);
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        }
    }

    fn save(&self, codes: &HashMap<String, CodeRecord>) {
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(codes)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            std::fs::write(&self.path, contents)
        };
        if let Err(e) = write() {
            log::warn!("Codes: failed to save {:?}: {}", self.path, e);
        }
    }
}

/// Admin secret from the environment, with the development default.
pub fn admin_secret_from_env() -> String {
    std::env::var("ERRORPARROT_ADMIN_SECRET").unwrap_or_else(|_| "admin123".to_string())
}

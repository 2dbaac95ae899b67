use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::config::PASSKEY_AAGUID_JSON;
use crate::passkey::errors::PasskeyError;

use super::credential::AttestationCredential;
use super::uuid_codec::{parse_uuid, stringify_uuid};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct AuthenticatorInfo {
    pub name: String,
    #[serde(default)]
    pub icon_dark: Option<String>,
    #[serde(default)]
    pub icon_light: Option<String>,
}

impl Default for AuthenticatorInfo {
    fn default() -> Self {
        Self {
            name: "Unknown Authenticator".to_string(),
            icon_dark: None,
            icon_light: None,
        }
    }
}

const AAGUID_JSON: &str = include_str!("../../../assets/aaguid.json");

/// Community-maintained dataset with the same shape as the bundled one
pub const AAGUID_URL: &str = "https://raw.githubusercontent.com/passkeydeveloper/passkey-authenticator-aaguids/refs/heads/main/combined_aaguid.json";

/// Anything an AAGUID can be read from
pub trait AaguidKey {
    /// Lowercase canonical UUID string, or None when no AAGUID can be derived
    fn aaguid_key(&self) -> Option<String>;
}

impl AaguidKey for str {
    fn aaguid_key(&self) -> Option<String> {
        let bytes = parse_uuid(self).ok()?;
        stringify_uuid(&bytes).ok()
    }
}

impl AaguidKey for String {
    fn aaguid_key(&self) -> Option<String> {
        self.as_str().aaguid_key()
    }
}

impl AaguidKey for [u8] {
    fn aaguid_key(&self) -> Option<String> {
        stringify_uuid(self).ok()
    }
}

impl AaguidKey for [u8; 16] {
    fn aaguid_key(&self) -> Option<String> {
        self.as_slice().aaguid_key()
    }
}

impl AaguidKey for AttestationCredential {
    fn aaguid_key(&self) -> Option<String> {
        match self.aaguid() {
            Ok(aaguid) => aaguid.aaguid_key(),
            Err(e) => {
                tracing::debug!("Credential has no AAGUID: {}", e);
                None
            }
        }
    }
}

/// Immutable AAGUID to authenticator model mapping.
///
/// Changes produce a new registry; a registry shared between threads is never
/// written to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AaguidRegistry {
    entries: HashMap<String, AuthenticatorInfo>,
}

impl AaguidRegistry {
    /// Build a registry from a JSON object keyed by UUID string
    pub fn from_json(json: &str) -> Result<Self, PasskeyError> {
        let raw: HashMap<String, AuthenticatorInfo> = serde_json::from_str(json).map_err(|e| {
            tracing::error!("Failed to parse AAGUID JSON: {}", e);
            PasskeyError::Registry(e.to_string())
        })?;

        let mut entries = HashMap::with_capacity(raw.len());
        for (aaguid, info) in raw {
            match aaguid.as_str().aaguid_key() {
                Some(key) => {
                    entries.insert(key, info);
                }
                None => tracing::warn!("Skipping invalid AAGUID entry: {}", aaguid),
            }
        }

        Ok(Self { entries })
    }

    pub fn get<K: AaguidKey + ?Sized>(&self, key: &K) -> Option<&AuthenticatorInfo> {
        let key = key.aaguid_key()?;
        let info = self.entries.get(&key);
        if info.is_none() {
            tracing::debug!("AAGUID {} not in registry", key);
        }
        info
    }

    pub fn has<K: AaguidKey + ?Sized>(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// New registry with the entries of `other` added, replacing existing ones
    pub fn extend(&self, other: &AaguidRegistry) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(
            other
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        Self { entries }
    }

    /// New registry with one entry added or replaced
    pub fn with<K: AaguidKey + ?Sized>(
        &self,
        key: &K,
        info: AuthenticatorInfo,
    ) -> Result<Self, PasskeyError> {
        let key = key
            .aaguid_key()
            .ok_or_else(|| PasskeyError::Registry("Invalid AAGUID".to_string()))?;
        let mut entries = self.entries.clone();
        entries.insert(key, info);
        Ok(Self { entries })
    }

    /// New registry without the given entry
    pub fn without<K: AaguidKey + ?Sized>(&self, key: &K) -> Self {
        let mut entries = self.entries.clone();
        if let Some(key) = key.aaguid_key() {
            entries.remove(&key);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static AAGUID_REGISTRY: LazyLock<AaguidRegistry> = LazyLock::new(|| {
    let bundled = AaguidRegistry::from_json(AAGUID_JSON).unwrap_or_else(|e| {
        tracing::error!("Bundled AAGUID dataset unusable: {}", e);
        AaguidRegistry::default()
    });
    load_registry(bundled, PASSKEY_AAGUID_JSON.as_deref())
});

fn load_registry(bundled: AaguidRegistry, extra_path: Option<&str>) -> AaguidRegistry {
    let Some(path) = extra_path else {
        tracing::info!("Loaded {} bundled AAGUID mappings", bundled.len());
        return bundled;
    };

    let extra = std::fs::read_to_string(path)
        .map_err(|e| PasskeyError::Registry(format!("{path}: {e}")))
        .and_then(|json| AaguidRegistry::from_json(&json));

    match extra {
        Ok(extra) => {
            let merged = bundled.extend(&extra);
            tracing::info!(
                "Loaded {} AAGUID mappings ({} from {})",
                merged.len(),
                extra.len(),
                path
            );
            merged
        }
        Err(e) => {
            tracing::error!("Failed to load AAGUID dataset, using bundled one: {}", e);
            bundled
        }
    }
}

/// The process-wide registry: the bundled dataset plus `PASSKEY_AAGUID_JSON`
pub fn aaguid_registry() -> &'static AaguidRegistry {
    &AAGUID_REGISTRY
}

/// Download an AAGUID dataset, typically from [`AAGUID_URL`].
///
/// The result is meant to be merged with [`AaguidRegistry::extend`].
pub async fn fetch_aaguid_registry(url: &str) -> Result<AaguidRegistry, PasskeyError> {
    tracing::info!("Fetching AAGUID mappings from {}", url);
    let response = reqwest::get(url)
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| PasskeyError::Registry(e.to_string()))?;
    let json = response
        .text()
        .await
        .map_err(|e| PasskeyError::Registry(e.to_string()))?;

    AaguidRegistry::from_json(&json)
}

//! Serde-friendly configuration and persistence shapes (§4.7, §6.3, §6.4).
//!
//! The core performs no I/O itself; these types only give the opaque wire
//! shapes named in the spec a concrete, checked representation so a host can
//! serialize/deserialize them with whatever store or transport it owns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::IdentityKey;

/// The `{identity_key, counter, last_seen}` shape a host persists between
/// restarts and hands back to [`crate::BeaconTracker::from_persisted`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedState {
    /// Hex-encoded 16-byte identity key.
    pub identity_key: String,
    pub counter: u32,
    pub last_seen: Option<DateTime<Utc>>,
}

impl PersistedState {
    pub fn new(identity_key: &IdentityKey, counter: u32, last_seen: Option<DateTime<Utc>>) -> Self {
        Self {
            identity_key: hex::encode(identity_key),
            counter,
            last_seen,
        }
    }

    /// Decode the hex identity key into raw bytes.
    pub fn identity_key_bytes(&self) -> Result<IdentityKey, ConfigError> {
        let bytes =
            hex::decode(&self.identity_key).map_err(|_| ConfigError::InvalidKeyLength(0))?;
        let len = bytes.len();
        bytes
            .try_into()
            .map_err(|_| ConfigError::InvalidKeyLength(len))
    }
}

/// A read-only snapshot of a tracker's current telemetry, for hosts that want
/// one atomic copy instead of several separate accessor calls (§6.3).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub name: String,
    pub counter: u32,
    pub last_seen: Option<DateTime<Utc>>,
    pub temperature: f32,
    pub battery_mv: u16,
    pub advertising_count: u32,
    pub uptime_s: u32,
    pub signal_strength_dbm: i16,
    pub new_data_available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_state_round_trips_identity_key() {
        let key: IdentityKey = [0xAB; 16];
        let state = PersistedState::new(&key, 42, None);
        assert_eq!(state.identity_key_bytes().unwrap(), key);
    }

    #[test]
    fn persisted_state_serializes_as_json() {
        let key: IdentityKey = [0x01; 16];
        let state = PersistedState::new(&key, 7, None);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"counter\":7"));
    }

    #[test]
    fn invalid_hex_identity_key_is_rejected() {
        let state = PersistedState {
            identity_key: "not-hex".to_string(),
            counter: 0,
            last_seen: None,
        };
        assert!(state.identity_key_bytes().is_err());
    }

    #[test]
    fn wrong_length_identity_key_is_rejected() {
        let state = PersistedState {
            identity_key: hex::encode([0u8; 8]),
            counter: 0,
            last_seen: None,
        };
        assert!(matches!(
            state.identity_key_bytes(),
            Err(ConfigError::InvalidKeyLength(8))
        ));
    }
}

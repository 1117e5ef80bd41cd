//! Receiver-side tracking core for Eddystone-EID beacons.
//!
//! Given a beacon's 16-byte identity key, [`BeaconTracker`] recognizes that
//! beacon through its rotating 8-byte EID, maintains a sliding window of
//! plausible identifiers across clock drift and power loss, and decrypts
//! companion ETLM telemetry packets.
//!
//! This crate is deliberately narrow: it has no BLE scanning, no persistence,
//! and no background scheduling. An embedding host feeds it
//! [`AdvertisingFrame`]s as they arrive and reads telemetry back out through
//! [`BeaconTracker::snapshot`].

pub mod clock;
pub mod config;
pub mod eid;
pub mod error;
pub mod etlm;
pub mod frame;
pub mod key;
pub mod tracker;
pub mod window;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PersistedState, TelemetrySnapshot};
pub use error::ConfigError;
pub use frame::{AdvertisingFrame, FrameKind};
pub use tracker::BeaconTracker;

/// A beacon's 128-bit AES identity key, shared out of band between beacon and receiver.
pub type IdentityKey = [u8; 16];

/// An 8-byte rotating Eddystone identifier.
pub type Eid = [u8; 8];

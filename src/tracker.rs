//! Per-device beacon state machine (§4.4).

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::config::{PersistedState, TelemetrySnapshot};
use crate::error::ConfigError;
use crate::etlm;
use crate::frame::{AdvertisingFrame, EidFrame, EtlmFrame, FrameKind};
use crate::window::{low_bits_mask, Window};
use crate::IdentityKey;

/// Tracks a single Eddystone-EID beacon: its active and resync windows, last
/// seen address/time, and decrypted telemetry.
///
/// Generic over [`Clock`] so tests can freeze time; production code uses
/// [`crate::clock::SystemClock`].
pub struct BeaconTracker<C: Clock> {
    name: String,
    identity_key: IdentityKey,
    exponent: u8,
    window_size: usize,

    counter: u32,
    window: Window,
    resync_window: Option<Window>,
    last_seen: Option<DateTime<Utc>>,
    address: Option<String>,

    temperature: f32,
    battery_mv: u16,
    advertising_count: u32,
    uptime_s: u32,
    signal_strength_dbm: i16,
    new_data_available: bool,

    clock: C,
}

impl<C: Clock> BeaconTracker<C> {
    /// Construct a tracker. `identity_key` must be exactly 16 bytes,
    /// `exponent` must be `0..=15`, and `window_size` must be `>= 1`; any
    /// violation is a [`ConfigError`], never a panic. `counter`'s low
    /// `exponent` bits are silently masked off rather than rejected (§7).
    pub fn new(
        name: impl Into<String>,
        identity_key: &[u8],
        exponent: u8,
        counter: u32,
        window_size: usize,
        last_seen: Option<DateTime<Utc>>,
        clock: C,
    ) -> Result<Self, ConfigError> {
        if exponent > 15 {
            return Err(ConfigError::InvalidExponent(exponent));
        }
        if window_size < 1 {
            return Err(ConfigError::InvalidWindowSize(window_size));
        }
        let key_len = identity_key.len();
        let identity_key: IdentityKey = identity_key
            .try_into()
            .map_err(|_| ConfigError::InvalidKeyLength(key_len))?;

        let masked_counter = counter & !low_bits_mask(exponent);
        let window = Window::build(&identity_key, exponent, window_size, masked_counter);

        Ok(Self {
            name: name.into(),
            identity_key,
            exponent,
            window_size,
            counter: masked_counter,
            window,
            resync_window: None,
            last_seen,
            address: None,
            temperature: 0.0,
            battery_mv: 0,
            advertising_count: 0,
            uptime_s: 0,
            signal_strength_dbm: 0,
            new_data_available: false,
            clock,
        })
    }

    /// Construct a tracker from a host's persisted `{identity_key, counter,
    /// last_seen}` state (§4.7, §6.4).
    pub fn from_persisted(
        name: impl Into<String>,
        state: &PersistedState,
        exponent: u8,
        window_size: usize,
        clock: C,
    ) -> Result<Self, ConfigError> {
        let identity_key = state.identity_key_bytes()?;
        Self::new(
            name,
            &identity_key,
            exponent,
            state.counter,
            window_size,
            state.last_seen,
            clock,
        )
    }

    /// Process one advertising frame. Infallible: malformed or unrecognized
    /// packets are dropped and logged, never surfaced as an error (§7).
    pub fn process_packet(&mut self, frame: &AdvertisingFrame) {
        match frame.kind() {
            Some(FrameKind::Eid) => self.process_eid(frame),
            Some(FrameKind::Tlm { encrypted }) => {
                if encrypted && self.address.as_deref() == Some(frame.address.as_str()) {
                    self.process_etlm(frame);
                }
            }
            Some(FrameKind::Uid) | Some(FrameKind::Url) | Some(FrameKind::Unknown(_)) | None => {}
        }
    }

    fn process_eid(&mut self, frame: &AdvertisingFrame) {
        let Some(data) = frame.data() else {
            return;
        };
        let Some(eid_frame) = EidFrame::parse(data) else {
            tracing::debug!(name = %self.name, len = data.len(), "dropped malformed EID frame");
            return;
        };

        self.check_stale();

        if let Some(index) = self.window.find(&eid_frame.eid) {
            self.resync_window = None;
            self.handle_match(index, &frame.address);
            return;
        }

        if let Some(resync) = self.resync_window.take() {
            if let Some(index) = resync.find(&eid_frame.eid) {
                self.window = resync;
                self.handle_match(index, &frame.address);
            } else {
                self.resync_window = Some(resync);
            }
        }
    }

    /// Build (or rebuild) a resync window if the active window is presumed
    /// stale — i.e. more time has plausibly passed than the window covers.
    fn check_stale(&mut self) {
        let Some(last_seen) = self.last_seen else {
            return;
        };
        let now = self.clock.now();
        let elapsed = (now - last_seen).num_seconds();
        let mask = low_bits_mask(self.exponent);
        let expected = self
            .window
            .center_counter()
            .wrapping_add(elapsed as u32)
            & !mask;

        if expected > self.window.last_counter() {
            let needs_rebuild = match &self.resync_window {
                None => true,
                Some(resync) => resync.center_counter() != expected,
            };
            if needs_rebuild {
                tracing::debug!(name = %self.name, expected, "building resync window");
                self.resync_window = Some(Window::build(
                    &self.identity_key,
                    self.exponent,
                    self.window_size,
                    expected,
                ));
            }
        }
    }

    fn handle_match(&mut self, index: usize, address: &str) {
        self.window.recentre(&self.identity_key, self.exponent, index);
        self.counter = self.window.center_counter();
        self.last_seen = Some(self.clock.now());
        self.address = Some(address.to_string());
        tracing::debug!(name = %self.name, counter = self.counter, "EID match");
    }

    fn process_etlm(&mut self, frame: &AdvertisingFrame) {
        let Some(data) = frame.data() else {
            return;
        };
        let Some(etlm_frame) = EtlmFrame::parse(data) else {
            tracing::debug!(name = %self.name, len = data.len(), "dropped malformed ETLM frame");
            return;
        };

        match etlm::decrypt_and_verify(
            &self.identity_key,
            self.counter,
            &etlm_frame.ciphertext,
            &etlm_frame.salt,
            &etlm_frame.tag,
        ) {
            Some(telemetry) => {
                self.temperature = telemetry.temperature_c;
                self.battery_mv = telemetry.battery_mv;
                self.advertising_count = telemetry.advertising_count;
                self.uptime_s = telemetry.uptime_s;
                self.signal_strength_dbm = frame.rssi;
                self.new_data_available = true;
                tracing::debug!(name = %self.name, counter = self.counter, "ETLM verified");
            }
            None => {
                tracing::info!(name = %self.name, counter = self.counter, "ETLM verification failed");
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        self.last_seen
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn battery_mv(&self) -> u16 {
        self.battery_mv
    }

    pub fn advertising_count(&self) -> u32 {
        self.advertising_count
    }

    pub fn uptime_s(&self) -> u32 {
        self.uptime_s
    }

    pub fn signal_strength_dbm(&self) -> i16 {
        self.signal_strength_dbm
    }

    pub fn new_data_available(&self) -> bool {
        self.new_data_available
    }

    /// Clear the "new data available" flag, for hosts that treat it as
    /// edge-triggered (§6.3: the consumer is expected to clear or ignore it).
    pub fn clear_new_data_available(&mut self) {
        self.new_data_available = false;
    }

    /// One atomic read of all telemetry fields (§6.3).
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            name: self.name.clone(),
            counter: self.counter,
            last_seen: self.last_seen,
            temperature: self.temperature,
            battery_mv: self.battery_mv,
            advertising_count: self.advertising_count,
            uptime_s: self.uptime_s,
            signal_strength_dbm: self.signal_strength_dbm,
            new_data_available: self.new_data_available,
        }
    }

    /// The host's persisted-state shape for this tracker (§6.4), for saving
    /// back to whatever store the host owns.
    pub fn persisted_state(&self) -> PersistedState {
        PersistedState::new(&self.identity_key, self.counter, self.last_seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    const IDENTITY_KEY_1: [u8; 16] = [
        0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90,
        0x12,
    ];
    const EDDYSTONE_UUID: &str = crate::frame::EDDYSTONE_SERVICE_UUID;

    fn eid_frame(eid: &[u8; 8], address: &str) -> AdvertisingFrame {
        let mut data = vec![0x30, 0x00];
        data.extend_from_slice(eid);
        AdvertisingFrame::new(address, -63).with_service_data(EDDYSTONE_UUID, data)
    }

    #[test]
    fn new_rejects_out_of_range_exponent() {
        let clock = FixedClock::new(Utc::now());
        let err = BeaconTracker::new("d", &IDENTITY_KEY_1, 16, 0, 3, None, clock).unwrap_err();
        assert_eq!(err, ConfigError::InvalidExponent(16));
    }

    #[test]
    fn new_rejects_zero_window_size() {
        let clock = FixedClock::new(Utc::now());
        let err = BeaconTracker::new("d", &IDENTITY_KEY_1, 15, 0, 0, None, clock).unwrap_err();
        assert_eq!(err, ConfigError::InvalidWindowSize(0));
    }

    #[test]
    fn new_rejects_wrong_key_length() {
        let clock = FixedClock::new(Utc::now());
        let err = BeaconTracker::new("d", &[0u8; 15], 15, 0, 3, None, clock).unwrap_err();
        assert_eq!(err, ConfigError::InvalidKeyLength(15));
    }

    #[test]
    fn fresh_match_at_center_sets_last_seen() {
        let t1 = Utc.with_ymd_and_hms(2022, 12, 31, 11, 59, 30).unwrap();
        let clock = FixedClock::new(t1);
        let mut tracker =
            BeaconTracker::new("d", &IDENTITY_KEY_1, 15, 0, 3, None, clock).unwrap();
        let eid = [0xB1, 0xDC, 0x36, 0x0A, 0x2D, 0xD3, 0xDF, 0x22];
        tracker.process_packet(&eid_frame(&eid, "00:11:22:33:44:55"));
        assert_eq!(tracker.last_seen(), Some(t1));
        assert_eq!(tracker.counter(), 0);
    }

    #[test]
    fn outside_window_does_not_match() {
        let t1 = Utc.with_ymd_and_hms(2022, 12, 31, 11, 59, 30).unwrap();
        let clock = FixedClock::new(t1);
        let mut tracker =
            BeaconTracker::new("d", &IDENTITY_KEY_1, 15, 0x0002_0000, 3, None, clock).unwrap();
        let eid = [0xB1, 0xDC, 0x36, 0x0A, 0x2D, 0xD3, 0xDF, 0x22];
        tracker.process_packet(&eid_frame(&eid, "00:11:22:33:44:55"));
        assert_eq!(tracker.last_seen(), None);
    }
}

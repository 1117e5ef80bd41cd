//! Advertising-frame wire formats and the finite frame-type dispatch (§6.1, §9).

use std::collections::HashMap;

/// Eddystone service UUID that `service_data` is keyed by.
pub const EDDYSTONE_SERVICE_UUID: &str = "0000feaa-0000-1000-8000-00805f9b34fb";

const FRAME_TYPE_UID: u8 = 0x00;
const FRAME_TYPE_URL: u8 = 0x10;
const FRAME_TYPE_TLM: u8 = 0x20;
const FRAME_TYPE_EID: u8 = 0x30;
const TLM_VERSION_ENCRYPTED: u8 = 0x01;

/// A raw BLE advertising packet, as delivered by the (out-of-scope) scanning
/// layer: an address, an RSSI, and service-data bytes keyed by UUID.
#[derive(Clone, Debug)]
pub struct AdvertisingFrame {
    pub address: String,
    pub rssi: i16,
    pub service_data: HashMap<String, Vec<u8>>,
}

impl AdvertisingFrame {
    pub fn new(address: impl Into<String>, rssi: i16) -> Self {
        Self {
            address: address.into(),
            rssi,
            service_data: HashMap::new(),
        }
    }

    pub fn with_service_data(mut self, uuid: impl Into<String>, data: Vec<u8>) -> Self {
        self.service_data.insert(uuid.into(), data);
        self
    }

    fn eddystone_data(&self) -> Option<&[u8]> {
        self.service_data
            .get(EDDYSTONE_SERVICE_UUID)
            .map(|v| v.as_slice())
    }

    /// Classify this frame's Eddystone service data into a finite dispatch tag,
    /// per §9's "prefer an exhaustive match over virtual dispatch" guidance.
    pub fn kind(&self) -> Option<FrameKind> {
        let data = self.eddystone_data()?;
        let frame_type = *data.first()?;
        Some(match frame_type {
            FRAME_TYPE_UID => FrameKind::Uid,
            FRAME_TYPE_URL => FrameKind::Url,
            FRAME_TYPE_TLM => FrameKind::Tlm {
                encrypted: data.get(1) == Some(&TLM_VERSION_ENCRYPTED),
            },
            FRAME_TYPE_EID => FrameKind::Eid,
            other => FrameKind::Unknown(other),
        })
    }

    /// The raw Eddystone service-data bytes, for frame-specific parsing.
    pub fn data(&self) -> Option<&[u8]> {
        self.eddystone_data()
    }
}

/// The finite set of Eddystone frame types this core recognizes at the
/// dispatch level. UID/URL/unrecognized frames carry no further payload the
/// core acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    Uid,
    Url,
    Tlm { encrypted: bool },
    Eid,
    Unknown(u8),
}

/// A parsed (not yet matched) EID frame: 8 bytes at offset 2 of a 10-byte payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EidFrame {
    pub eid: [u8; 8],
}

impl EidFrame {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != 10 {
            return None;
        }
        let mut eid = [0u8; 8];
        eid.copy_from_slice(&data[2..10]);
        Some(Self { eid })
    }
}

/// A parsed (not yet decrypted) ETLM frame: 12 bytes ciphertext, 2 bytes salt,
/// 2 bytes truncated tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EtlmFrame {
    pub ciphertext: [u8; 12],
    pub salt: [u8; 2],
    pub tag: [u8; 2],
}

impl EtlmFrame {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() != 18 {
            return None;
        }
        let mut ciphertext = [0u8; 12];
        ciphertext.copy_from_slice(&data[2..14]);
        let mut salt = [0u8; 2];
        salt.copy_from_slice(&data[14..16]);
        let mut tag = [0u8; 2];
        tag.copy_from_slice(&data[16..18]);
        Some(Self {
            ciphertext,
            salt,
            tag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_classifies_eid_frame() {
        let frame = AdvertisingFrame::new("addr", -63).with_service_data(
            EDDYSTONE_SERVICE_UUID,
            vec![0x30, 0x00, 1, 2, 3, 4, 5, 6, 7, 8],
        );
        assert_eq!(frame.kind(), Some(FrameKind::Eid));
    }

    #[test]
    fn kind_classifies_encrypted_tlm() {
        let frame = AdvertisingFrame::new("addr", -63)
            .with_service_data(EDDYSTONE_SERVICE_UUID, vec![0x20, 0x01]);
        assert_eq!(frame.kind(), Some(FrameKind::Tlm { encrypted: true }));
    }

    #[test]
    fn kind_classifies_unencrypted_tlm_as_not_encrypted() {
        let frame = AdvertisingFrame::new("addr", -63)
            .with_service_data(EDDYSTONE_SERVICE_UUID, vec![0x20, 0x00]);
        assert_eq!(frame.kind(), Some(FrameKind::Tlm { encrypted: false }));
    }

    #[test]
    fn kind_is_none_without_eddystone_service_data() {
        let frame = AdvertisingFrame::new("addr", -63);
        assert_eq!(frame.kind(), None);
    }

    #[test]
    fn eid_frame_requires_exact_length() {
        assert!(EidFrame::parse(&[0x30, 0x00, 1, 2, 3, 4, 5, 6, 7]).is_none());
        assert!(EidFrame::parse(&[0x30, 0x00, 1, 2, 3, 4, 5, 6, 7, 8]).is_some());
    }

    #[test]
    fn etlm_frame_requires_exact_length() {
        let mut data = vec![0x20, 0x01];
        data.extend_from_slice(&[0u8; 12]); // ciphertext
        data.extend_from_slice(&[0u8; 2]); // salt
        data.extend_from_slice(&[0u8; 2]); // tag
        assert_eq!(data.len(), 18);
        assert!(EtlmFrame::parse(&data).is_some());
        assert!(EtlmFrame::parse(&data[..17]).is_none());
    }
}

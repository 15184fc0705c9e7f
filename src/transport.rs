//! Unsegmented upper-transport encryption: a model-layer payload is sealed
//! with AES-CCM (32-bit MIC) under either an application key or the
//! provisioner's device key.
//!
//! The unsegmented AKF/AID transport header octet is *not* prefixed here; the
//! network layer frames the bare cipher text. Conformant mesh receivers
//! expect that octet, so closing the gap means prefixing
//! `SecurityMaterials::akf()`/`AppKey::aid()` before network encryption.
use crate::crypto::aes::{AESCipher, MicSize};
use crate::crypto::key::{AppKey, DevKey, Key};
use crate::crypto::nonce::{AppNonce, DeviceNonce, Nonce};
use crate::crypto::AKF;
use crate::mesh::MIC;

/// Network MTU available to one unsegmented lower-transport PDU.
pub const UNSEGMENTED_PDU_MAX_LEN: usize = 15;
/// Model payload limit once the 32-bit transport MIC is accounted for.
pub const APP_PAYLOAD_MAX_LEN: usize = UNSEGMENTED_PDU_MAX_LEN - MIC::small_size();

/// Unencrypted model-layer payload (opcode + parameters), 1..=11 bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct AppPayload<'a>(&'a [u8]);

impl<'a> AppPayload<'a> {
    /// Returns `None` for an empty payload or one that would need
    /// segmentation.
    #[must_use]
    pub fn new(model_message: &'a [u8]) -> Option<AppPayload<'a>> {
        if model_message.is_empty() || model_message.len() > APP_PAYLOAD_MAX_LEN {
            None
        } else {
            Some(AppPayload(model_message))
        }
    }
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        self.0
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Key and nonce pairing for the upper-transport CCM. The variant decides the
/// nonce type byte (0x01 application, 0x02 device) and the AKF.
pub enum SecurityMaterials<'a> {
    App(AppNonce, &'a AppKey),
    Device(DeviceNonce, &'a DevKey),
}
impl SecurityMaterials<'_> {
    #[must_use]
    fn unpack(&self) -> (&'_ Nonce, Key) {
        match &self {
            SecurityMaterials::App(n, k) => (n.as_ref(), k.key()),
            SecurityMaterials::Device(n, k) => (n.as_ref(), k.key()),
        }
    }
    #[must_use]
    pub fn akf(&self) -> AKF {
        match self {
            SecurityMaterials::App(..) => AppKey::akf(),
            SecurityMaterials::Device(..) => DevKey::akf(),
        }
    }
    /// Encrypts `payload` in-place and returns the 32-bit MIC.
    #[must_use]
    pub fn encrypt(&self, payload: &mut [u8]) -> MIC {
        let (nonce, key) = self.unpack();
        AESCipher::new(key).ccm_encrypt(nonce, b"", payload, MicSize::Small)
    }
}

/// Encrypted unsegmented transport PDU: cipher text followed by the 32-bit
/// MIC, at most 15 bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct UnsegmentedTransportPdu {
    buf: [u8; UNSEGMENTED_PDU_MAX_LEN],
    len: u8,
}

impl UnsegmentedTransportPdu {
    /// Seals `payload` under `sm`.
    #[must_use]
    pub fn seal(payload: &AppPayload, sm: &SecurityMaterials) -> UnsegmentedTransportPdu {
        let payload_len = payload.len();
        let mut buf = [0_u8; UNSEGMENTED_PDU_MAX_LEN];
        buf[..payload_len].copy_from_slice(payload.payload());
        let mic = sm.encrypt(&mut buf[..payload_len]);
        mic.be_pack_into(&mut buf[payload_len..payload_len + MIC::small_size()]);
        UnsegmentedTransportPdu {
            buf,
            len: (payload_len + MIC::small_size()) as u8,
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
impl AsRef<[u8]> for UnsegmentedTransportPdu {
    #[must_use]
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{Address, UnicastAddress};
    use crate::crypto::nonce::{AppNonceParts, DeviceNonceParts, NonceType};
    use crate::mesh::{IVIndex, SequenceNumber, U24};
    use core::convert::TryFrom;

    fn app_key() -> AppKey {
        AppKey::from_hex("63964771734fbd76e3b40519d1d94a48").unwrap()
    }
    fn dev_key() -> DevKey {
        DevKey::from_hex("9d6dd0e96eb25dc19a40ed9914f8f03f").unwrap()
    }
    fn app_nonce() -> AppNonce {
        AppNonceParts {
            aszmic: false,
            seq: SequenceNumber(U24::new(37)),
            src: UnicastAddress::try_from(0x7F16).unwrap(),
            dst: Address::from(0x000C),
            iv_index: IVIndex(0x1234_5678),
        }
        .to_nonce()
    }
    fn device_nonce() -> DeviceNonce {
        DeviceNonceParts {
            aszmic: false,
            seq: SequenceNumber(U24::new(37)),
            src: UnicastAddress::try_from(0x7F16).unwrap(),
            dst: Address::from(0x000C),
            iv_index: IVIndex(0x1234_5678),
        }
        .to_nonce()
    }

    #[test]
    fn test_app_payload_bounds() {
        assert!(AppPayload::new(b"").is_none());
        assert!(AppPayload::new(&[0_u8; 1]).is_some());
        assert!(AppPayload::new(&[0_u8; 11]).is_some());
        assert!(AppPayload::new(&[0_u8; 12]).is_none());
    }
    #[test]
    fn test_seal_length_is_payload_plus_mic() {
        let model = [0x59, 0x00, 0x06, 0x00, 0xe0, 0x01];
        let payload = AppPayload::new(&model).unwrap();
        let pdu = UnsegmentedTransportPdu::seal(
            &payload,
            &SecurityMaterials::App(app_nonce(), &app_key()),
        );
        assert_eq!(pdu.len(), model.len() + 4);
    }
    #[test]
    fn test_device_key_produces_different_cipher() {
        let model = [0x59, 0x00, 0x06, 0x00, 0xe0, 0x01];
        let payload = AppPayload::new(&model).unwrap();
        let with_app = UnsegmentedTransportPdu::seal(
            &payload,
            &SecurityMaterials::App(app_nonce(), &app_key()),
        );
        let with_dev = UnsegmentedTransportPdu::seal(
            &payload,
            &SecurityMaterials::Device(device_nonce(), &dev_key()),
        );
        assert_eq!(with_app.len(), with_dev.len());
        assert_ne!(with_app.as_ref(), with_dev.as_ref());
    }
    #[test]
    fn test_device_nonce_type_byte() {
        // The device branch must run CCM under nonce type 0x02.
        assert_eq!(
            device_nonce().as_ref().as_ref()[0],
            NonceType::Device.as_u8()
        );
        assert_eq!(
            app_nonce().as_ref().as_ref()[0],
            NonceType::Application.as_u8()
        );
    }
    #[test]
    fn test_akf() {
        assert_eq!(
            SecurityMaterials::App(app_nonce(), &app_key()).akf(),
            AppKey::akf()
        );
        assert_eq!(
            SecurityMaterials::Device(device_nonce(), &dev_key()).akf(),
            DevKey::akf()
        );
    }
}

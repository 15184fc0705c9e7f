//! Access layer entry point: resolves key material from a `MeshNetwork`,
//! then chains transport and network encryption into one obfuscated PDU.
use crate::address::{Address, UnicastAddress};
use crate::crypto::materials::NetworkKeys;
use crate::crypto::nonce::{AppNonceParts, DeviceNonceParts};
use crate::mesh::{AppKeyIndex, IVIndex, KeyIndex, SequenceNumber, CTL, TTL, U24};
use crate::net::{self, DeobfuscatedHeader, NetworkPdu, PrivacyRandomLayout};
use crate::network::MeshNetwork;
use crate::transport::{AppPayload, SecurityMaterials, UnsegmentedTransportPdu};
use core::convert::TryFrom;
use core::fmt::{Display, Error, Formatter};

/// Sentinel `app_idx` meaning "encrypt with the provisioner's device key".
/// Never a valid stored application key index.
pub const APP_IDX_DEV: u16 = 0x7FFF;

/// Which key secures the upper transport layer of an outbound message.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum KeySelector {
    /// Application key at this position in the network's app key list.
    App(AppKeyIndex),
    /// The provisioner's device key.
    Device,
}
impl KeySelector {
    /// Maps a raw `app_idx` onto the selector. `APP_IDX_DEV` selects the
    /// device key; anything else must be a valid 12-bit key index.
    pub fn from_raw(app_idx: u16) -> Result<KeySelector, PduBuildError> {
        if app_idx == APP_IDX_DEV {
            Ok(KeySelector::Device)
        } else {
            KeyIndex::try_from(app_idx)
                .map(|i| KeySelector::App(AppKeyIndex(i)))
                .map_err(|_| PduBuildError::UnknownKey)
        }
    }
    #[must_use]
    pub fn to_raw(self) -> u16 {
        match self {
            KeySelector::App(i) => (i.0).into(),
            KeySelector::Device => APP_IDX_DEV,
        }
    }
}

/// Everything that can go wrong while building an outbound PDU. All failures
/// surface synchronously to the caller; nothing is retried or partially
/// emitted.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum PduBuildError {
    /// `app_idx` names no stored app key, or the network has no net keys.
    UnknownKey,
    /// The model message is empty or needs segmentation.
    PayloadTooLarge,
    /// `src` is not a unicast address or `ttl > 127`.
    InvalidAddress,
    /// A key in the network document is not exactly 16 bytes.
    InvalidKeyMaterial,
    /// The sequence number space (24 bits) is spent; the IV index must be
    /// refreshed before any more PDUs can be minted.
    SequenceExhausted,
}
impl Display for PduBuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            PduBuildError::UnknownKey => write!(f, "unknown key"),
            PduBuildError::PayloadTooLarge => write!(f, "payload too large"),
            PduBuildError::InvalidAddress => write!(f, "invalid address"),
            PduBuildError::InvalidKeyMaterial => write!(f, "invalid key material"),
            PduBuildError::SequenceExhausted => write!(f, "sequence numbers exhausted"),
        }
    }
}

/// Builds a fully encrypted and obfuscated network PDU for an unsegmented
/// access message, using the Mesh Core v1.0 PECB layout.
///
/// `seq` must be unique per `(iv_index, src)` and is supplied by the caller;
/// see [`MeshNetwork::next_seq`] for atomic acquisition.
pub fn build_network_pdu(
    model_message: &[u8],
    network: &MeshNetwork,
    app_idx: u16,
    seq: u32,
    src: u16,
    dst: u16,
    ttl: u8,
) -> Result<NetworkPdu, PduBuildError> {
    build_network_pdu_with_layout(
        model_message,
        network,
        app_idx,
        seq,
        src,
        dst,
        ttl,
        PrivacyRandomLayout::default(),
    )
}

/// As [`build_network_pdu`] but with an explicit privacy-random layout, for
/// talking to receivers that deobfuscate with the zero-padded PECB input.
#[allow(clippy::too_many_arguments)]
pub fn build_network_pdu_with_layout(
    model_message: &[u8],
    network: &MeshNetwork,
    app_idx: u16,
    seq: u32,
    src: u16,
    dst: u16,
    ttl: u8,
    layout: PrivacyRandomLayout,
) -> Result<NetworkPdu, PduBuildError> {
    let payload = AppPayload::new(model_message).ok_or(PduBuildError::PayloadTooLarge)?;
    let src = UnicastAddress::try_from(src).map_err(|_| PduBuildError::InvalidAddress)?;
    let ttl = TTL::try_from(ttl).map_err(|_| PduBuildError::InvalidAddress)?;
    let seq = U24::try_from(seq)
        .map(SequenceNumber)
        .map_err(|_| PduBuildError::SequenceExhausted)?;
    let dst = Address::from(dst);
    let iv_index = network.iv_index();

    let (net_key, sm) = resolve_keys(network, app_idx, seq, src, dst, iv_index)?;
    let keys = NetworkKeys::from(net_key);

    let transport_pdu = UnsegmentedTransportPdu::seal(&payload, &sm);
    let header = DeobfuscatedHeader::new(CTL(false), ttl, seq, src);
    Ok(net::seal(&transport_pdu, &keys, header, iv_index, layout))
}

/// Picks `(net_key, transport security materials)` for `app_idx`. The device
/// key rides on the network's primary (first) net key; app keys ride on the
/// net key they are bound to.
fn resolve_keys<'a>(
    network: &'a MeshNetwork,
    app_idx: u16,
    seq: SequenceNumber,
    src: UnicastAddress,
    dst: Address,
    iv_index: IVIndex,
) -> Result<(&'a crate::crypto::key::NetKey, SecurityMaterials<'a>), PduBuildError> {
    match KeySelector::from_raw(app_idx)? {
        KeySelector::Device => {
            let net_key = network
                .net_keys()
                .first()
                .ok_or(PduBuildError::UnknownKey)?;
            let nonce = DeviceNonceParts {
                aszmic: false,
                seq,
                src,
                dst,
                iv_index,
            }
            .to_nonce();
            Ok((
                net_key.key(),
                SecurityMaterials::Device(nonce, network.dev_key()),
            ))
        }
        KeySelector::App(index) => {
            let app_key = network
                .app_key(usize::from(u16::from(index.0)))
                .ok_or(PduBuildError::UnknownKey)?;
            let net_key = network
                .net_key_by_index(app_key.bound_net_key())
                .ok_or(PduBuildError::UnknownKey)?;
            let nonce = AppNonceParts {
                aszmic: false,
                seq,
                src,
                dst,
                iv_index,
            }
            .to_nonce();
            Ok((net_key.key(), SecurityMaterials::App(nonce, app_key.key())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key;
    use crate::mesh::NID;
    use crate::network::{AppKey, NetKey};
    use alloc::string::ToString;

    /// Mesh Core v1.0 sample keys in a two-app-key network.
    fn sample_network() -> MeshNetwork {
        let mut network = MeshNetwork::new(
            "7cdc1f52-35e8-4b85-9a85-32f6ecbbbbb9".to_string(),
            "sample".to_string(),
            key::DevKey::from_hex("9d6dd0e96eb25dc19a40ed9914f8f03f").unwrap(),
        );
        network.set_iv_index(IVIndex(0x1234_5678));
        network.add_net_key(NetKey::new(
            0,
            key::NetKey::from_hex("7dd7364cd842ad18c17c2b820c84c3d6").unwrap(),
        ));
        network
            .add_app_key(AppKey::new(
                0,
                key::AppKey::from_hex("63964771734fbd76e3b40519d1d94a48").unwrap(),
                0,
            ))
            .unwrap();
        network
            .add_app_key(AppKey::new(
                1,
                key::AppKey::from_hex("3216d1509884b533248541792b877f98").unwrap(),
                0,
            ))
            .unwrap();
        network
    }
    const MODEL: &[u8] = &[0x59, 0x00, 0x06, 0x00, 0xe0, 0x01];

    fn build(network: &MeshNetwork, app_idx: u16, seq: u32) -> Result<NetworkPdu, PduBuildError> {
        build_network_pdu(MODEL, network, app_idx, seq, 0x7F16, 0x000C, 7)
    }

    #[test]
    fn test_app_key_path() {
        let network = sample_network();
        let pdu = build(&network, 0, 37).unwrap();
        assert_eq!(pdu.len(), 19 + MODEL.len());
        let expected_nid = NetworkKeys::from(network.net_keys()[0].key()).nid();
        assert_eq!(expected_nid, NID::new(0x68));
        assert_eq!(pdu.as_ref()[0] & 0x7F, 0x68);
        assert_eq!(pdu.as_ref()[0] & 0x80, 0x00);
    }
    #[test]
    fn test_device_key_path_differs() {
        let network = sample_network();
        let with_app = build(&network, 0, 37).unwrap();
        let with_dev = build(&network, APP_IDX_DEV, 37).unwrap();
        assert_eq!(with_dev.len(), 25);
        // Same net key, so the header byte agrees, but the transport cipher
        // (and with it the whole payload) must not.
        assert_eq!(with_app.as_ref()[0], with_dev.as_ref()[0]);
        assert_ne!(with_app.as_ref()[7..], with_dev.as_ref()[7..]);
    }
    #[test]
    fn test_determinism() {
        let network = sample_network();
        assert_eq!(build(&network, 0, 37).unwrap(), build(&network, 0, 37).unwrap());
    }
    #[test]
    fn test_seq_changes_header_and_payload() {
        let network = sample_network();
        let seq_37 = build(&network, 0, 37).unwrap();
        let seq_38 = build(&network, 0, 38).unwrap();
        assert_ne!(seq_37.as_ref()[1..7], seq_38.as_ref()[1..7]);
        assert_ne!(seq_37.as_ref()[7..], seq_38.as_ref()[7..]);
    }
    #[test]
    fn test_payload_bounds() {
        let network = sample_network();
        assert_eq!(
            build_network_pdu(b"", &network, 0, 37, 0x7F16, 0x000C, 7),
            Err(PduBuildError::PayloadTooLarge)
        );
        assert_eq!(
            build_network_pdu(&[0_u8; 12], &network, 0, 37, 0x7F16, 0x000C, 7),
            Err(PduBuildError::PayloadTooLarge)
        );
    }
    #[test]
    fn test_unknown_app_idx() {
        let network = sample_network();
        assert_eq!(build(&network, 2, 37), Err(PduBuildError::UnknownKey));
        // 0x7FFF is the device key sentinel but nearby out-of-range indexes
        // are plain unknown keys.
        assert_eq!(build(&network, 0x7FFE, 37), Err(PduBuildError::UnknownKey));
    }
    #[test]
    fn test_no_net_keys() {
        let network = MeshNetwork::new(
            "5f9a0a7c-91ae-4bd8-8012-cdd2371fbbe9".to_string(),
            "empty".to_string(),
            key::DevKey::new(key::ZERO_KEY),
        );
        assert_eq!(
            build(&network, APP_IDX_DEV, 37),
            Err(PduBuildError::UnknownKey)
        );
    }
    #[test]
    fn test_invalid_src_and_ttl() {
        let network = sample_network();
        assert_eq!(
            build_network_pdu(MODEL, &network, 0, 37, 0x0000, 0x000C, 7),
            Err(PduBuildError::InvalidAddress)
        );
        assert_eq!(
            build_network_pdu(MODEL, &network, 0, 37, 0x8001, 0x000C, 7),
            Err(PduBuildError::InvalidAddress)
        );
        assert_eq!(
            build_network_pdu(MODEL, &network, 0, 37, 0x7F16, 0x000C, 128),
            Err(PduBuildError::InvalidAddress)
        );
    }
    #[test]
    fn test_seq_exhausted() {
        let network = sample_network();
        assert!(build(&network, 0, 0x00FF_FFFF).is_ok());
        assert_eq!(
            build(&network, 0, 0x0100_0000),
            Err(PduBuildError::SequenceExhausted)
        );
    }
    #[test]
    fn test_key_selector_raw_round_trip() {
        assert_eq!(KeySelector::from_raw(APP_IDX_DEV), Ok(KeySelector::Device));
        assert_eq!(
            KeySelector::from_raw(3).map(KeySelector::to_raw),
            Ok(3)
        );
        assert_eq!(
            KeySelector::from_raw(0x7FFE),
            Err(PduBuildError::UnknownKey)
        );
    }
    #[test]
    fn test_layout_variant_changes_obfuscation_only() {
        let network = sample_network();
        let default = build(&network, 0, 37).unwrap();
        let legacy = build_network_pdu_with_layout(
            MODEL,
            &network,
            0,
            37,
            0x7F16,
            0x000C,
            7,
            PrivacyRandomLayout::ZeroPadded,
        )
        .unwrap();
        assert_eq!(default.as_ref()[0], legacy.as_ref()[0]);
        assert_eq!(default.as_ref()[7..], legacy.as_ref()[7..]);
        assert_ne!(default.as_ref()[1..7], legacy.as_ref()[1..7]);
    }
}

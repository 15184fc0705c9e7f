//! Network layer for the outbound access path. Big Endian throughout.
//!
//! The transport PDU is sealed with AES-CCM under the `k2` encryption key
//! (64-bit NetMIC), then header bytes 1..6 are XORed with a PECB block
//! derived from the privacy key and the first bytes of the cipher text:
//!
//! | Field Name    | Bits  | Notes                                        |
//! |---------------|-------|----------------------------------------------|
//! | IVI           | 1     | Least significant bit of the IV Index        |
//! | NID           | 7     | Derived from the NetKey encrypting this PDU  |
//! | CTL           | 1     | Network control (0 on this path), obfuscated |
//! | TTL           | 7     | Time to live, obfuscated                     |
//! | SEQ           | 24    | Sequence number, obfuscated                  |
//! | SRC           | 16    | Source unicast address, obfuscated           |
//! | Transport PDU | 40-120| Encrypted unsegmented transport PDU          |
//! | NetMIC        | 64    | Message integrity check of the payload       |
use crate::address::UnicastAddress;
use crate::crypto::aes::{AESCipher, MicSize};
use crate::crypto::key::PrivacyKey;
use crate::crypto::materials::NetworkKeys;
use crate::crypto::nonce::{NetworkNonce, NetworkNonceParts};
use crate::mesh::{IVIndex, SequenceNumber, CTL, IVI, MIC, NID, TTL};
use crate::transport::{UnsegmentedTransportPdu, UNSEGMENTED_PDU_MAX_LEN};
use core::convert::TryFrom;

const OBFUSCATED_LEN: usize = 6;
// (IVI | NID) (1) + (CTL | TTL) (1) + SEQ (3) + SRC (2)
const PDU_HEADER_LEN: usize = 1 + OBFUSCATED_LEN;
const ENCRYPTED_PAYLOAD_MAX_LEN: usize = UNSEGMENTED_PDU_MAX_LEN + MIC::big_size();
pub const NETWORK_PDU_MAX_LEN: usize = PDU_HEADER_LEN + ENCRYPTED_PAYLOAD_MAX_LEN;

/// Cleartext header fields that end up obfuscated on the wire.
#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub struct DeobfuscatedHeader {
    ctl: CTL,
    ttl: TTL,
    seq: SequenceNumber,
    src: UnicastAddress,
}
impl DeobfuscatedHeader {
    #[must_use]
    pub fn new(ctl: CTL, ttl: TTL, seq: SequenceNumber, src: UnicastAddress) -> Self {
        Self { ctl, ttl, seq, src }
    }
    #[must_use]
    pub fn ctl(&self) -> CTL {
        self.ctl
    }
    #[must_use]
    pub fn ttl(&self) -> TTL {
        self.ttl
    }
    #[must_use]
    pub fn seq(&self) -> SequenceNumber {
        self.seq
    }
    #[must_use]
    pub fn src(&self) -> UnicastAddress {
        self.src
    }
    /// Packs the cleartext header bytes 1..6 of the PDU.
    #[must_use]
    pub fn pack(&self) -> [u8; OBFUSCATED_LEN] {
        let seq = self.seq.to_bytes_be();
        let src = self.src.to_bytes_be();
        [
            self.ttl.with_flag(self.ctl.0),
            seq[0],
            seq[1],
            seq[2],
            src[0],
            src[1],
        ]
    }
    /// Will return `None` if the src bytes are not a unicast address.
    #[must_use]
    pub fn unpack(bytes: &[u8; OBFUSCATED_LEN]) -> Option<DeobfuscatedHeader> {
        let (ttl, ctl) = TTL::new_with_flag(bytes[0]);
        let seq = u32::from(bytes[1]) << 16 | u32::from(bytes[2]) << 8 | u32::from(bytes[3]);
        let src =
            UnicastAddress::try_from(u16::from(bytes[4]) << 8 | u16::from(bytes[5])).ok()?;
        Some(DeobfuscatedHeader::new(
            CTL(ctl),
            ttl,
            SequenceNumber(crate::mesh::U24::new(seq)),
            src,
        ))
    }
    #[must_use]
    pub fn obfuscate(&self, pecb: PECB) -> ObfuscatedHeader {
        let mut out = self.pack();
        pecb.xor(out.as_mut());
        ObfuscatedHeader(out)
    }
    #[must_use]
    pub fn nonce(&self, iv_index: IVIndex) -> NetworkNonce {
        NetworkNonceParts::new(self.ctl, self.ttl, self.src, self.seq, iv_index).to_nonce()
    }
}

#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub struct ObfuscatedHeader([u8; OBFUSCATED_LEN]);
impl ObfuscatedHeader {
    /// Undoes the obfuscation. Returns `None` if the recovered src is not a
    /// unicast address (wrong PECB or corrupt header).
    #[must_use]
    pub fn deobfuscate(mut self, pecb: PECB) -> Option<DeobfuscatedHeader> {
        pecb.xor(&mut self.0);
        DeobfuscatedHeader::unpack(&self.0)
    }
    /// # Panics
    /// Panics if `buffer.len() < 6`.
    pub fn pack_into(&self, buffer: &mut [u8]) {
        buffer[..OBFUSCATED_LEN].copy_from_slice(&self.0[..]);
    }
    #[must_use]
    pub const fn len() -> usize {
        OBFUSCATED_LEN
    }
}

const PECB_LEN: usize = 6;
/// First 6 bytes of `AES-ECB(privacy_key, PackedPrivacy)`.
#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub struct PECB([u8; PECB_LEN]);
impl PECB {
    #[must_use]
    pub const fn new_bytes(bytes: [u8; PECB_LEN]) -> Self {
        Self(bytes)
    }
    /// XORs PECB with `bytes` in-place.
    /// # Panics
    /// Panics if `bytes.len() != 6`.
    pub fn xor(&self, bytes: &mut [u8]) {
        assert_eq!(bytes.len(), PECB_LEN);
        for (b1, b2) in bytes.iter_mut().zip(self.0.as_ref()) {
            *b1 ^= *b2
        }
    }
}
impl AsRef<[u8]> for PECB {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Where the 16-byte PECB input puts the IV index.
///
/// `WithIvIndex` is the Mesh Core v1.0 §3.8.7.3 layout and what conformant
/// receivers deobfuscate with. `ZeroPadded` fills the tail with zeros instead
/// of packing the IV index; it reproduces deployments that shipped that
/// layout and is interoperable only with them.
#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub enum PrivacyRandomLayout {
    /// `0x00^5 || iv_index || privacy_random`
    WithIvIndex,
    /// `0x00^5 || privacy_random || 0x00^4`
    ZeroPadded,
}
impl Default for PrivacyRandomLayout {
    fn default() -> Self {
        PrivacyRandomLayout::WithIvIndex
    }
}

const PRIVACY_RANDOM_LEN: usize = 7;
/// First 7 bytes of the encrypted payload (cipher text || NetMIC).
#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub struct PrivacyRandom([u8; PRIVACY_RANDOM_LEN]);
impl PrivacyRandom {
    /// Takes the leading 7 bytes of `encrypted_payload`, zero-padded if it is
    /// shorter.
    #[must_use]
    pub fn from_payload(encrypted_payload: &[u8]) -> PrivacyRandom {
        let mut out = [0_u8; PRIVACY_RANDOM_LEN];
        let l = encrypted_payload.len().min(PRIVACY_RANDOM_LEN);
        out[..l].copy_from_slice(&encrypted_payload[..l]);
        PrivacyRandom(out)
    }
    #[must_use]
    pub fn pack(&self, layout: PrivacyRandomLayout, iv_index: IVIndex) -> PackedPrivacy {
        let mut out = [0_u8; PACKED_PRIVACY_LEN];
        match layout {
            PrivacyRandomLayout::WithIvIndex => {
                out[5..9].copy_from_slice(&iv_index.to_bytes_be());
                out[9..].copy_from_slice(&self.0);
            }
            PrivacyRandomLayout::ZeroPadded => {
                out[5..5 + PRIVACY_RANDOM_LEN].copy_from_slice(&self.0);
            }
        }
        PackedPrivacy(out)
    }
}

const PACKED_PRIVACY_LEN: usize = 16;
/// Full 16-byte PECB input block.
#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Hash, Debug)]
pub struct PackedPrivacy([u8; PACKED_PRIVACY_LEN]);
impl PackedPrivacy {
    #[must_use]
    pub const fn new_bytes(bytes: [u8; PACKED_PRIVACY_LEN]) -> Self {
        Self(bytes)
    }
    #[must_use]
    pub fn encrypt_with(mut self, key: &PrivacyKey) -> PECB {
        AESCipher::new(key.key()).ecb_encrypt(&mut self.0[..]);
        let mut out = [0_u8; PECB_LEN];
        out.copy_from_slice(&self.0[..PECB_LEN]);
        PECB(out)
    }
}
impl AsRef<[u8]> for PackedPrivacy {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}

/// Encrypted transport PDU followed by the 64-bit NetMIC.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct EncryptedPayload {
    buf: [u8; ENCRYPTED_PAYLOAD_MAX_LEN],
    len: u8,
}
impl EncryptedPayload {
    /// Seals `transport_pdu` under the network encryption key.
    #[must_use]
    pub fn seal(
        transport_pdu: &UnsegmentedTransportPdu,
        nonce: &NetworkNonce,
        keys: &NetworkKeys,
    ) -> EncryptedPayload {
        let transport_len = transport_pdu.len();
        let mut buf = [0_u8; ENCRYPTED_PAYLOAD_MAX_LEN];
        buf[..transport_len].copy_from_slice(transport_pdu.as_ref());
        let mic = AESCipher::new(keys.encryption_key().key()).ccm_encrypt(
            nonce.as_ref(),
            b"",
            &mut buf[..transport_len],
            MicSize::Big,
        );
        mic.be_pack_into(&mut buf[transport_len..transport_len + MIC::big_size()]);
        EncryptedPayload {
            buf,
            len: (transport_len + MIC::big_size()) as u8,
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
    #[must_use]
    pub fn privacy_random(&self) -> PrivacyRandom {
        PrivacyRandom::from_payload(self.as_ref())
    }
}
impl AsRef<[u8]> for EncryptedPayload {
    #[must_use]
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len()]
    }
}

/// Finished obfuscated network PDU, ready for a Mesh Proxy wrapper.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct NetworkPdu {
    buf: [u8; NETWORK_PDU_MAX_LEN],
    len: u8,
}
impl NetworkPdu {
    #[must_use]
    pub fn new_parts(
        ivi: IVI,
        nid: NID,
        obfuscated: &ObfuscatedHeader,
        payload: &EncryptedPayload,
    ) -> NetworkPdu {
        let mut buf = [0_u8; NETWORK_PDU_MAX_LEN];
        buf[0] = nid.with_flag(ivi.into());
        obfuscated.pack_into(&mut buf[1..1 + ObfuscatedHeader::len()]);
        buf[PDU_HEADER_LEN..PDU_HEADER_LEN + payload.len()].copy_from_slice(payload.as_ref());
        NetworkPdu {
            buf,
            len: (PDU_HEADER_LEN + payload.len()) as u8,
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
    #[must_use]
    pub fn nid(&self) -> NID {
        NID::from_masked_u8(self.buf[0])
    }
    #[must_use]
    pub fn ivi(&self) -> IVI {
        IVI(self.buf[0] & 0x80 != 0)
    }
}
impl AsRef<[u8]> for NetworkPdu {
    #[must_use]
    fn as_ref(&self) -> &[u8] {
        &self.buf[..self.len()]
    }
}

/// Runs the full network-layer encode: CCM seal, PECB derivation and header
/// obfuscation, PDU assembly.
#[must_use]
pub fn seal(
    transport_pdu: &UnsegmentedTransportPdu,
    keys: &NetworkKeys,
    header: DeobfuscatedHeader,
    iv_index: IVIndex,
    layout: PrivacyRandomLayout,
) -> NetworkPdu {
    let payload = EncryptedPayload::seal(transport_pdu, &header.nonce(iv_index), keys);
    let pecb = payload
        .privacy_random()
        .pack(layout, iv_index)
        .encrypt_with(keys.privacy_key());
    NetworkPdu::new_parts(iv_index.ivi(), keys.nid(), &header.obfuscate(pecb), &payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::NetKey;
    use crate::mesh::U24;
    use crate::transport::{AppPayload, SecurityMaterials};
    use core::convert::TryFrom;

    fn network_keys() -> NetworkKeys {
        NetworkKeys::from(&NetKey::from_hex("7dd7364cd842ad18c17c2b820c84c3d6").unwrap())
    }
    fn header() -> DeobfuscatedHeader {
        DeobfuscatedHeader::new(
            CTL(false),
            TTL::new(7),
            SequenceNumber(U24::new(37)),
            UnicastAddress::try_from(0x7F16).unwrap(),
        )
    }
    fn transport_pdu() -> UnsegmentedTransportPdu {
        let app_key = crate::crypto::key::AppKey::from_hex("63964771734fbd76e3b40519d1d94a48")
            .unwrap();
        let nonce = crate::crypto::nonce::AppNonceParts {
            aszmic: false,
            seq: SequenceNumber(U24::new(37)),
            src: UnicastAddress::try_from(0x7F16).unwrap(),
            dst: crate::address::Address::from(0x000C),
            iv_index: IVIndex(0x1234_5678),
        }
        .to_nonce();
        UnsegmentedTransportPdu::seal(
            &AppPayload::new(&[0x59, 0x00, 0x06, 0x00, 0xe0, 0x01]).unwrap(),
            &SecurityMaterials::App(nonce, &app_key),
        )
    }

    #[test]
    fn test_header_pack_layout() {
        assert_eq!(header().pack(), [0x07, 0x00, 0x00, 0x25, 0x7F, 0x16]);
        let ctl_set = DeobfuscatedHeader::new(
            CTL(true),
            TTL::new(7),
            SequenceNumber(U24::new(37)),
            UnicastAddress::try_from(0x7F16).unwrap(),
        );
        assert_eq!(ctl_set.pack()[0], 0x87);
    }
    #[test]
    fn test_obfuscate_round_trip() {
        let pecb = PECB::new_bytes([0xDE, 0xAD, 0xBE, 0xEF, 0x12, 0x34]);
        let obfuscated = header().obfuscate(pecb);
        assert_eq!(obfuscated.deobfuscate(pecb), Some(header()));
    }
    #[test]
    fn test_packed_privacy_layouts() {
        let pr = PrivacyRandom::from_payload(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let iv = IVIndex(0x1234_5678);
        assert_eq!(
            pr.pack(PrivacyRandomLayout::WithIvIndex, iv).as_ref(),
            &[0, 0, 0, 0, 0, 0x12, 0x34, 0x56, 0x78, 1, 2, 3, 4, 5, 6, 7][..]
        );
        assert_eq!(
            pr.pack(PrivacyRandomLayout::ZeroPadded, iv).as_ref(),
            &[0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 6, 7, 0, 0, 0, 0][..]
        );
    }
    #[test]
    fn test_seal_length_and_first_byte() {
        let keys = network_keys();
        let transport = transport_pdu();
        let pdu = seal(
            &transport,
            &keys,
            header(),
            IVIndex(0x1234_5678),
            PrivacyRandomLayout::default(),
        );
        assert_eq!(pdu.len(), 7 + transport.len() + 8);
        assert_eq!(pdu.nid(), keys.nid());
        assert_eq!(pdu.ivi(), IVI(false));
        assert_eq!(pdu.as_ref()[0], keys.nid().with_flag(false));
    }
    #[test]
    fn test_sealed_header_deobfuscates() {
        // Recompute the PECB from the emitted payload bytes and undo the
        // obfuscation; the cleartext header fields must come back bit-exact.
        for &layout in &[
            PrivacyRandomLayout::WithIvIndex,
            PrivacyRandomLayout::ZeroPadded,
        ] {
            let keys = network_keys();
            let iv_index = IVIndex(0x1234_5678);
            let pdu = seal(&transport_pdu(), &keys, header(), iv_index, layout);
            let pecb = PrivacyRandom::from_payload(&pdu.as_ref()[7..])
                .pack(layout, iv_index)
                .encrypt_with(keys.privacy_key());
            let mut obfuscated = [0_u8; 6];
            obfuscated.copy_from_slice(&pdu.as_ref()[1..7]);
            let mut recovered = obfuscated;
            pecb.xor(&mut recovered);
            assert_eq!(recovered, header().pack());
        }
    }
    #[test]
    fn test_layouts_disagree_on_wire() {
        let keys = network_keys();
        let with_iv = seal(
            &transport_pdu(),
            &keys,
            header(),
            IVIndex(0x1234_5678),
            PrivacyRandomLayout::WithIvIndex,
        );
        let zero_padded = seal(
            &transport_pdu(),
            &keys,
            header(),
            IVIndex(0x1234_5678),
            PrivacyRandomLayout::ZeroPadded,
        );
        // Same payload bytes, different obfuscated header bytes.
        assert_eq!(with_iv.as_ref()[7..], zero_padded.as_ref()[7..]);
        assert_ne!(with_iv.as_ref()[1..7], zero_padded.as_ref()[1..7]);
    }
}

//! Mesh Core v1.0 key derivation functions used by the outbound pipeline:
//! `s1` salts, `k2` network credentials and `k4` application key identifiers.
use crate::crypto::aes::AESCipher;
use crate::crypto::key::{AppKey, EncryptionKey, Key, PrivacyKey, ZERO_KEY};
use crate::crypto::{Salt, AID};
use crate::mesh::NID;
use zeroize::Zeroize;

/// Derives the network credentials `(NID, EncryptionKey, PrivacyKey)` from a
/// NetKey. Master credentials use `p = [0x00]`.
pub fn k2(key: &Key, p: impl AsRef<[u8]>) -> (NID, EncryptionKey, PrivacyKey) {
    k2_bytes(key, p.as_ref())
}
/// # Panics
/// Panics if `p` is empty.
#[must_use]
pub fn k2_bytes(n: &Key, p: &[u8]) -> (NID, EncryptionKey, PrivacyKey) {
    assert!(!p.is_empty(), "p must have at least one byte");
    let mut t = AESCipher::from(SMK2).cmac(n.as_ref());
    let cipher = AESCipher::from(t);
    t.zeroize();
    let mut t_1 = cipher.cmac_slice(&[p, &[0x01]]);
    let t_2 = cipher.cmac_slice(&[t_1.as_ref(), p, &[0x02]]);
    let t_3 = cipher.cmac_slice(&[t_2.as_ref(), p, &[0x03]]);
    let nid = NID::new(t_1.as_ref()[15] & 0x7F);
    t_1.zeroize();

    (nid, EncryptionKey::new(t_2), PrivacyKey::new(t_3))
}
/// Derives the 6-bit AID that identifies `key` on the wire.
#[must_use]
pub fn k4(key: &AppKey) -> AID {
    let mut t = AESCipher::from(SMK4).cmac(key.key().as_ref());
    let aid = AID::new(AESCipher::from(t).cmac(b"id6\x01").as_ref()[15] & 0x3F);
    t.zeroize();
    aid
}

/// Calculates Bluetooth Mesh's `s1` on bytes. Common values are precomputed
/// and hardcoded to avoid recalculating `s1` unneededly.
#[must_use]
pub fn s1(m: impl AsRef<[u8]>) -> Salt {
    s1_bytes(m.as_ref())
}
#[must_use]
pub fn s1_bytes(m: &[u8]) -> Salt {
    AESCipher::new(ZERO_KEY).cmac(m).as_salt()
}
/// `SMK2 == s1("smk2")`
pub const SMK2: Salt = Salt([
    0x4f, 0x90, 0x48, 0xc, 0x18, 0x71, 0xbf, 0xbf, 0xfd, 0x16, 0x97, 0x1f, 0x4d, 0x8d, 0x10, 0xb1,
]);
/// `SMK4 == s1("smk4")`
pub const SMK4: Salt = Salt([
    0xe, 0x9a, 0xc1, 0xb7, 0xce, 0xfa, 0x66, 0x87, 0x4c, 0x97, 0xee, 0x54, 0xac, 0x5f, 0x49, 0xbe,
]);

/// Tests based on Mesh Core v1.0 Sample Data.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::key::NetKey;

    fn sample_net_key() -> NetKey {
        NetKey::from_hex("7dd7364cd842ad18c17c2b820c84c3d6").unwrap()
    }

    #[test]
    fn test_s1() {
        assert_eq!(
            s1("test"),
            Salt::from_hex("b73cefbd641ef2ea598c2b6efb62f79c").unwrap()
        );
    }
    #[test]
    fn test_s1_precomputed() {
        assert_eq!(s1("smk2"), SMK2);
        assert_eq!(s1("smk4"), SMK4);
    }
    #[test]
    fn test_k2_master() {
        let (nid, encryption_key, privacy_key) = k2(&sample_net_key().key(), b"\x00");
        assert_eq!(nid, NID::new(0x68));
        assert_eq!(
            encryption_key,
            EncryptionKey::from_hex("0953fa93e7caac9638f58820220a398e").unwrap()
        );
        assert_eq!(
            privacy_key,
            PrivacyKey::from_hex("8b84eedec100067d670971dd2aa700cf").unwrap()
        );
    }
    #[test]
    #[should_panic]
    fn test_k2_empty_p() {
        k2(&sample_net_key().key(), b"");
    }
    #[test]
    fn test_k4() {
        let app_key = AppKey::from_hex("3216d1509884b533248541792b877f98").unwrap();
        assert_eq!(u8::from(k4(&app_key)), 0x38);
    }
}

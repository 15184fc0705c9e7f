//! 128-bit key newtypes. Long-lived key material (`NetKey`, `AppKey`,
//! `DevKey`) is owned by the network document; the `k2`-derived
//! `EncryptionKey`/`PrivacyKey` wipe themselves on drop.
use crate::crypto::k_funcs::k4;
use crate::crypto::{hex_16_to_array, Salt, AID, AKF};
use core::convert::{TryFrom, TryInto};
use core::fmt;
use zeroize::Zeroize;

const KEY_LEN: usize = 16;

/// 128-bit AES key.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct Key([u8; KEY_LEN]);

pub const ZERO_KEY: Key = Key([0_u8; KEY_LEN]);

impl Key {
    #[must_use]
    pub const fn new(key_bytes: [u8; KEY_LEN]) -> Key {
        Key(key_bytes)
    }
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<Key> {
        Some(Key(hex_16_to_array(hex)?))
    }
    #[must_use]
    pub fn as_salt(&self) -> Salt {
        Salt::new(self.0)
    }
}
impl TryFrom<&[u8]> for Key {
    type Error = core::array::TryFromSliceError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Ok(Key::new(value.try_into()?))
    }
}
impl AsRef<[u8]> for Key {
    #[must_use]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
impl Zeroize for Key {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}
#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct NetKey(Key);

impl NetKey {
    #[must_use]
    pub const fn new(key: Key) -> NetKey {
        NetKey(key)
    }
    #[must_use]
    pub const fn new_bytes(key_bytes: [u8; KEY_LEN]) -> NetKey {
        NetKey(Key(key_bytes))
    }
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<NetKey> {
        Some(NetKey(Key::from_hex(hex)?))
    }
    #[must_use]
    pub const fn key(&self) -> Key {
        self.0
    }
}
impl From<Key> for NetKey {
    fn from(k: Key) -> Self {
        Self(k)
    }
}
#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct AppKey(Key);

impl AppKey {
    #[must_use]
    pub const fn new(key: Key) -> AppKey {
        AppKey(key)
    }
    #[must_use]
    pub const fn new_bytes(key_bytes: [u8; KEY_LEN]) -> AppKey {
        AppKey(Key(key_bytes))
    }
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<AppKey> {
        Some(AppKey(Key::from_hex(hex)?))
    }
    #[must_use]
    pub const fn key(&self) -> Key {
        self.0
    }
    /// 6-bit application key identifier (`k4`).
    #[must_use]
    pub fn aid(&self) -> AID {
        k4(self)
    }
    #[must_use]
    pub const fn akf() -> AKF {
        AKF(true)
    }
}
impl From<Key> for AppKey {
    fn from(k: Key) -> Self {
        Self(k)
    }
}
#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct DevKey(Key);

impl DevKey {
    #[must_use]
    pub const fn new(key: Key) -> DevKey {
        DevKey(key)
    }
    #[must_use]
    pub const fn new_bytes(key_bytes: [u8; KEY_LEN]) -> DevKey {
        DevKey(Key(key_bytes))
    }
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<DevKey> {
        Some(DevKey(Key::from_hex(hex)?))
    }
    #[must_use]
    pub const fn key(&self) -> Key {
        self.0
    }
    #[must_use]
    pub const fn akf() -> AKF {
        AKF(false)
    }
}
impl From<Key> for DevKey {
    fn from(k: Key) -> Self {
        Self(k)
    }
}
/// Network-layer payload encryption key (`T2` of `k2`). Zeroed on drop; the
/// Debug impl never prints key bytes.
#[derive(Clone, Eq, PartialEq)]
pub struct EncryptionKey(Key);

impl EncryptionKey {
    #[must_use]
    pub const fn new(key: Key) -> EncryptionKey {
        EncryptionKey(key)
    }
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<EncryptionKey> {
        Some(EncryptionKey(Key::from_hex(hex)?))
    }
    #[must_use]
    pub const fn key(&self) -> Key {
        self.0
    }
}
impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey(..)")
    }
}
impl Zeroize for EncryptionKey {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}
impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.zeroize()
    }
}
/// Header obfuscation key (`T3` of `k2`). Zeroed on drop.
#[derive(Clone, Eq, PartialEq)]
pub struct PrivacyKey(Key);

impl PrivacyKey {
    #[must_use]
    pub const fn new(key: Key) -> PrivacyKey {
        PrivacyKey(key)
    }
    #[must_use]
    pub fn from_hex(hex: &str) -> Option<PrivacyKey> {
        Some(PrivacyKey(Key::from_hex(hex)?))
    }
    #[must_use]
    pub const fn key(&self) -> Key {
        self.0
    }
}
impl fmt::Debug for PrivacyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivacyKey(..)")
    }
}
impl Zeroize for PrivacyKey {
    fn zeroize(&mut self) {
        self.0.zeroize()
    }
}
impl Drop for PrivacyKey {
    fn drop(&mut self) {
        self.zeroize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_hex() {
        let key = Key::from_hex("63964771734fbd76e3b40519d1d94a48").unwrap();
        assert_eq!(
            key.as_ref(),
            &[
                0x63, 0x96, 0x47, 0x71, 0x73, 0x4f, 0xbd, 0x76, 0xe3, 0xb4, 0x05, 0x19, 0xd1,
                0xd9, 0x4a, 0x48
            ][..]
        );
        assert_eq!(Key::from_hex("63964771"), None);
    }
    #[test]
    fn test_derived_keys_zeroize() {
        let mut key = EncryptionKey::from_hex("0953fa93e7caac9638f58820220a398e").unwrap();
        key.zeroize();
        assert_eq!(key.key(), ZERO_KEY);
    }
}

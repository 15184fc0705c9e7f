//! Derived security materials. `NetworkKeys` bundles the `k2` master
//! credentials of one NetKey; derive once per NetKey and reuse.
use crate::crypto::k_funcs::k2;
use crate::crypto::key::{EncryptionKey, NetKey, PrivacyKey};
use crate::mesh::NID;

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct NetworkKeys {
    nid: NID,
    encryption: EncryptionKey,
    privacy: PrivacyKey,
}

impl NetworkKeys {
    #[must_use]
    pub fn new(nid: NID, encryption: EncryptionKey, privacy: PrivacyKey) -> Self {
        Self {
            nid,
            encryption,
            privacy,
        }
    }
    #[must_use]
    pub fn nid(&self) -> NID {
        self.nid
    }
    #[must_use]
    pub fn encryption_key(&self) -> &EncryptionKey {
        &self.encryption
    }
    #[must_use]
    pub fn privacy_key(&self) -> &PrivacyKey {
        &self.privacy
    }
}
impl From<&NetKey> for NetworkKeys {
    fn from(k: &NetKey) -> Self {
        let (nid, encryption, privacy) = k2(&k.key(), b"\x00");
        Self::new(nid, encryption, privacy)
    }
}

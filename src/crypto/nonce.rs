//! 13-byte AES-CCM nonces. All three variants share the layout
//! `type || flags || seq || src || <2 variant bytes> || iv_index`, so one
//! builder produces them and the typed wrappers keep them from being mixed up.
use crate::address::{Address, UnicastAddress};
use crate::mesh::{IVIndex, SequenceNumber, CTL, TTL};

const NONCE_LEN: usize = 13;

#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct Nonce([u8; NONCE_LEN]);
impl Nonce {
    #[must_use]
    pub const fn new(bytes: [u8; NONCE_LEN]) -> Nonce {
        Nonce(bytes)
    }
}
impl AsRef<[u8]> for Nonce {
    fn as_ref(&self) -> &[u8] {
        &self.0[..]
    }
}
/// Nonce type discriminator (first nonce byte). 0x03 (proxy) and up are not
/// used by this crate.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Hash)]
#[repr(u8)]
pub enum NonceType {
    Network = 0x00,
    Application = 0x01,
    Device = 0x02,
}
impl NonceType {
    #[must_use]
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
/// Shared 13-byte layout; `bytes_7_8` is the only field that differs between
/// variants (DST for application/device, zero padding for network).
fn build_nonce(
    nonce_type: NonceType,
    flags: u8,
    seq: SequenceNumber,
    src: UnicastAddress,
    bytes_7_8: [u8; 2],
    iv_index: IVIndex,
) -> Nonce {
    let seq = seq.to_bytes_be();
    let src = src.to_bytes_be();
    let iv = iv_index.to_bytes_be();
    Nonce([
        nonce_type.as_u8(),
        flags,
        seq[0],
        seq[1],
        seq[2],
        src[0],
        src[1],
        bytes_7_8[0],
        bytes_7_8[1],
        iv[0],
        iv[1],
        iv[2],
        iv[3],
    ])
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct NetworkNonce(Nonce);
impl NetworkNonce {
    #[must_use]
    pub const fn new_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(Nonce(bytes))
    }
}
impl AsRef<Nonce> for NetworkNonce {
    fn as_ref(&self) -> &Nonce {
        &self.0
    }
}
#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct AppNonce(Nonce);
impl AppNonce {
    #[must_use]
    pub const fn new_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(Nonce(bytes))
    }
}
impl AsRef<Nonce> for AppNonce {
    fn as_ref(&self) -> &Nonce {
        &self.0
    }
}
#[derive(Clone, Copy, Debug, Hash, Eq, PartialOrd, PartialEq, Ord)]
pub struct DeviceNonce(Nonce);
impl DeviceNonce {
    #[must_use]
    pub const fn new_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self(Nonce(bytes))
    }
}
impl AsRef<Nonce> for DeviceNonce {
    fn as_ref(&self) -> &Nonce {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct NetworkNonceParts {
    ctl: CTL,
    ttl: TTL,
    src: UnicastAddress,
    seq: SequenceNumber,
    iv_index: IVIndex,
}
impl NetworkNonceParts {
    #[must_use]
    pub fn new(
        ctl: CTL,
        ttl: TTL,
        src: UnicastAddress,
        seq: SequenceNumber,
        iv_index: IVIndex,
    ) -> Self {
        Self {
            ctl,
            ttl,
            src,
            seq,
            iv_index,
        }
    }
    #[must_use]
    pub fn to_nonce(&self) -> NetworkNonce {
        // DST is not part of the network nonce; bytes 7..8 stay zero.
        NetworkNonce(build_nonce(
            NonceType::Network,
            self.ttl.with_flag(self.ctl.0),
            self.seq,
            self.src,
            [0x00, 0x00],
            self.iv_index,
        ))
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct AppNonceParts {
    pub aszmic: bool,
    pub seq: SequenceNumber,
    pub src: UnicastAddress,
    pub dst: Address,
    pub iv_index: IVIndex,
}
impl AppNonceParts {
    #[must_use]
    pub fn to_nonce(&self) -> AppNonce {
        AppNonce(build_nonce(
            NonceType::Application,
            (self.aszmic as u8) << 7,
            self.seq,
            self.src,
            self.dst.to_bytes_be(),
            self.iv_index,
        ))
    }
}

#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct DeviceNonceParts {
    pub aszmic: bool,
    pub seq: SequenceNumber,
    pub src: UnicastAddress,
    pub dst: Address,
    pub iv_index: IVIndex,
}
impl DeviceNonceParts {
    #[must_use]
    pub fn to_nonce(&self) -> DeviceNonce {
        DeviceNonce(build_nonce(
            NonceType::Device,
            (self.aszmic as u8) << 7,
            self.seq,
            self.src,
            self.dst.to_bytes_be(),
            self.iv_index,
        ))
    }
}

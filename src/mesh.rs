//! Scalar protocol types shared by every layer. All multi-byte fields on the
//! wire are Big Endian.
use core::convert::TryFrom;
use core::fmt::{Display, Error, Formatter};

/// Least significant bit of the IV Index, carried in the top bit of the first
/// network PDU octet.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct IVI(pub bool);
impl From<IVI> for bool {
    #[must_use]
    fn from(i: IVI) -> Self {
        i.0
    }
}
impl From<bool> for IVI {
    #[must_use]
    fn from(b: bool) -> Self {
        IVI(b)
    }
}
/// Network control flag. Always `false` on the outbound access path.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct CTL(pub bool);
impl From<CTL> for bool {
    #[must_use]
    fn from(c: CTL) -> Self {
        c.0
    }
}
impl From<bool> for CTL {
    #[must_use]
    fn from(b: bool) -> Self {
        CTL(b)
    }
}
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct TTL(u8);

const TTL_MASK: u8 = 127;

impl TTL {
    /// # Panics
    /// Panics if `v > 127`.
    #[must_use]
    pub fn new(v: u8) -> TTL {
        assert!(
            v <= TTL_MASK,
            "TTL {} is bigger than max TTL {}",
            v,
            TTL_MASK
        );
        TTL(v)
    }
    /// Returns u8 with the 7 lower bits being TTL and the highest bit being a flag.
    #[must_use]
    pub const fn with_flag(self, flag: bool) -> u8 {
        self.0 | ((flag as u8) << 7)
    }
    /// Splits an 8-bit uint into a 7-bit TTL and the flag bit.
    #[must_use]
    pub const fn new_with_flag(v: u8) -> (TTL, bool) {
        (TTL(v & TTL_MASK), v & !TTL_MASK != 0)
    }
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}
impl TryFrom<u8> for TTL {
    type Error = ();

    fn try_from(v: u8) -> Result<TTL, Self::Error> {
        if v > TTL_MASK {
            Err(())
        } else {
            Ok(TTL(v))
        }
    }
}
impl Display for TTL {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "TTL({})", self.0)
    }
}
/// 7-bit network identifier derived from a NetKey by `k2`. Lets receivers
/// preselect which NetKey a PDU was encrypted under.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct NID(u8);

const NID_MASK: u8 = 127;

impl NID {
    /// # Panics
    /// Panics if `v > 127`.
    #[must_use]
    pub fn new(v: u8) -> NID {
        assert!(
            v <= NID_MASK,
            "NID {} is bigger than max NID {}",
            v,
            NID_MASK
        );
        NID(v)
    }
    #[must_use]
    pub const fn with_flag(self, flag: bool) -> u8 {
        self.0 | ((flag as u8) << 7)
    }
    /// Creates a 7-bit NID by masking out the 8th bit of a u8.
    #[must_use]
    pub const fn from_masked_u8(v: u8) -> NID {
        NID(v & NID_MASK)
    }
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}
impl Display for NID {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "NID({})", self.0)
    }
}
/// 24-bit unsigned int.
#[derive(Default, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct U24(u32);

const U24_MAX: u32 = (1_u32 << 24) - 1;

impl U24 {
    /// # Panics
    /// Panics if `v > U24::max_value()`.
    #[must_use]
    pub fn new(v: u32) -> U24 {
        assert!(v <= U24_MAX, "number {} is bigger than max U24 {}", v, U24_MAX);
        U24(v)
    }
    /// Creates a U24 by masking out the 4th byte of `v`.
    #[must_use]
    pub const fn new_masked(v: u32) -> U24 {
        U24(v & U24_MAX)
    }
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
    #[must_use]
    pub const fn max_value() -> U24 {
        U24(U24_MAX)
    }
    #[must_use]
    pub fn to_bytes_be(self) -> [u8; 3] {
        let b = self.0.to_be_bytes();
        [b[1], b[2], b[3]]
    }
}
impl TryFrom<u32> for U24 {
    type Error = ();

    fn try_from(v: u32) -> Result<U24, Self::Error> {
        if v > U24_MAX {
            Err(())
        } else {
            Ok(U24(v))
        }
    }
}
impl Display for U24 {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "U24({})", self.0)
    }
}
/// 32-bit counter driving nonce uniqueness across the whole network. Rotated
/// externally; only its low bit (`IVI`) ends up in the PDU header.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct IVIndex(pub u32);
impl IVIndex {
    /// Bit 0 of the IV Index.
    #[must_use]
    pub const fn ivi(self) -> IVI {
        IVI(self.0 & 1 == 1)
    }
    #[must_use]
    pub fn to_bytes_be(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}
impl Display for IVIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "IVIndex({})", self.0)
    }
}
/// 24-bit per-source monotonic counter. Paired with the IV Index for replay
/// defense; a `(iv_index, seq, src)` triple must never repeat.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Default)]
pub struct SequenceNumber(pub U24);
impl SequenceNumber {
    #[must_use]
    pub fn to_bytes_be(self) -> [u8; 3] {
        self.0.to_bytes_be()
    }
}
impl Display for SequenceNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "SequenceNumber({})", (self.0).value())
    }
}
/// Message integrity check. 32-bit on the upper transport layer, 64-bit on
/// the network layer of the outbound access path.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum MIC {
    Big(u64),
    Small(u32),
}
const BIG_MIC_SIZE: usize = 8;
const SMALL_MIC_SIZE: usize = 4;
impl MIC {
    #[must_use]
    pub fn mic(&self) -> u64 {
        match self {
            MIC::Big(b) => *b,
            MIC::Small(s) => u64::from(*s),
        }
    }
    #[must_use]
    pub fn is_big(&self) -> bool {
        match self {
            MIC::Big(_) => true,
            MIC::Small(_) => false,
        }
    }
    #[must_use]
    pub fn byte_size(&self) -> usize {
        if self.is_big() {
            BIG_MIC_SIZE
        } else {
            SMALL_MIC_SIZE
        }
    }
    #[must_use]
    pub const fn small_size() -> usize {
        SMALL_MIC_SIZE
    }
    #[must_use]
    pub const fn big_size() -> usize {
        BIG_MIC_SIZE
    }
    #[must_use]
    pub const fn max_size() -> usize {
        BIG_MIC_SIZE
    }
    /// Packs the MIC big-endian into `buffer`.
    /// # Panics
    /// Panics if `buffer.len() != self.byte_size()`.
    pub fn be_pack_into(&self, buffer: &mut [u8]) {
        assert_eq!(buffer.len(), self.byte_size());
        match self {
            MIC::Big(b) => buffer.copy_from_slice(&b.to_be_bytes()),
            MIC::Small(s) => buffer.copy_from_slice(&s.to_be_bytes()),
        }
    }
}
impl Display for MIC {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let (name, value) = match self {
            MIC::Big(b) => ("Big", *b),
            MIC::Small(s) => ("Small", u64::from(*s)),
        };
        write!(f, "{}({})", name, value)
    }
}
/// 12-bit global key index (NetKey or AppKey lists are capped at 4096 keys).
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct KeyIndex(u16);

const KEY_INDEX_MAX: u16 = 4095;

impl KeyIndex {
    /// # Panics
    /// Panics if `v > 4095`.
    #[must_use]
    pub fn new(v: u16) -> KeyIndex {
        assert!(
            v <= KEY_INDEX_MAX,
            "key index {} is bigger than max key index {}",
            v,
            KEY_INDEX_MAX
        );
        KeyIndex(v)
    }
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}
impl TryFrom<u16> for KeyIndex {
    type Error = ();

    fn try_from(v: u16) -> Result<KeyIndex, Self::Error> {
        if v > KEY_INDEX_MAX {
            Err(())
        } else {
            Ok(KeyIndex(v))
        }
    }
}
impl From<KeyIndex> for u16 {
    #[must_use]
    fn from(i: KeyIndex) -> Self {
        i.0
    }
}
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct NetKeyIndex(pub KeyIndex);
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct AppKeyIndex(pub KeyIndex);

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::TryFrom;

    #[test]
    fn test_ttl_flag_packing() {
        assert_eq!(TTL::new(0x7F).with_flag(false), 0x7F);
        assert_eq!(TTL::new(0x7F).with_flag(true), 0xFF);
        assert_eq!(TTL::new(10).with_flag(true), 0x8A);
        assert_eq!(TTL::new_with_flag(0x8A), (TTL::new(10), true));
    }
    #[test]
    #[should_panic]
    fn test_ttl_out_of_range() {
        TTL::new(128);
    }
    #[test]
    fn test_u24_bytes() {
        assert_eq!(U24::new(0x000001).to_bytes_be(), [0x00, 0x00, 0x01]);
        assert_eq!(U24::new(0x123456).to_bytes_be(), [0x12, 0x34, 0x56]);
        assert!(U24::try_from(0x0100_0000).is_err());
        assert_eq!(U24::try_from(0x00FF_FFFF), Ok(U24::max_value()));
    }
    #[test]
    fn test_ivi_is_bit_zero() {
        assert_eq!(IVIndex(0x1234_5678).ivi(), IVI(false));
        assert_eq!(IVIndex(0x1234_5677).ivi(), IVI(true));
        // The top byte has no say in IVI.
        assert_eq!(IVIndex(0x0100_0000).ivi(), IVI(false));
    }
    #[test]
    fn test_mic_pack() {
        let mut small = [0_u8; 4];
        MIC::Small(0x16CA_48A0).be_pack_into(&mut small);
        assert_eq!(small, [0x16, 0xCA, 0x48, 0xA0]);
        let mut big = [0_u8; 8];
        MIC::Big(0x0102_0304_0506_0708).be_pack_into(&mut big);
        assert_eq!(big, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08]);
    }
    #[test]
    fn test_key_index_bound() {
        assert!(KeyIndex::try_from(4095).is_ok());
        assert!(KeyIndex::try_from(4096).is_err());
    }
}

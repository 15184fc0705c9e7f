//! AES-CCM encryption with the 13-byte nonce Bluetooth Mesh mandates. Only
//! the two mesh tag sizes (32- and 64-bit) are instantiable; the inbound
//! (decrypt) half is intentionally absent from this crate.
use crate::crypto::nonce::Nonce;
use aes::cipher::generic_array::typenum::{U4, U8};
use aes::cipher::generic_array::{ArrayLength, GenericArray};
use aes::cipher::BlockCipher;
use aes::Aes128;
use core::marker::PhantomData;

const AES_BLOCK_SIZE: usize = 16;
// Max additional authenticated data size in bytes: 2^16 - 2^8
const CCM_AAD_MAX_BYTES: usize = 0xFF00;
// Max message size in bytes: 2^(8L) = 2^16
const CCM_PAYLOAD_MAX_BYTES: usize = 0x10000;

/// Marker trait for the CCM MAC tag sizes Bluetooth Mesh uses.
pub trait CcmTagSize: ArrayLength<u8> {}

impl CcmTagSize for U4 {}
impl CcmTagSize for U8 {}

/// Returned when the payload or associated data exceed CCM's length fields.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LengthError(());

pub struct AesCcm<TagSize>
where
    TagSize: CcmTagSize,
{
    cipher: Aes128,
    tag_size: PhantomData<TagSize>,
}
/// Building from an existing cipher avoids recalculating the AES key schedule.
impl<TagSize: CcmTagSize> From<&Aes128> for AesCcm<TagSize> {
    fn from(cipher: &Aes128) -> Self {
        AesCcm {
            cipher: cipher.clone(),
            tag_size: PhantomData,
        }
    }
}
impl<TagSize: CcmTagSize> From<Aes128> for AesCcm<TagSize> {
    fn from(cipher: Aes128) -> Self {
        AesCcm {
            cipher,
            tag_size: PhantomData,
        }
    }
}

impl<TagSize> AesCcm<TagSize>
where
    TagSize: CcmTagSize,
{
    /// In-place CCM encryption of `payload`, returning the detached
    /// authentication tag. Pass `b""` for no associated data.
    pub fn encrypt_in_place_detached(
        &self,
        nonce: &Nonce,
        associated_data: &[u8],
        payload: &mut [u8],
    ) -> Result<GenericArray<u8, TagSize>, LengthError> {
        let alen = associated_data.len();
        let plen = payload.len();
        let tlen = TagSize::to_usize();

        if alen >= CCM_AAD_MAX_BYTES || plen >= CCM_PAYLOAD_MAX_BYTES {
            return Err(LengthError(()));
        }

        // The sequence b is [ FLAGS (1) | nonce (13) | counter (2) ]. For
        // authentication the FLAGS byte carries Adata, (tlen-2)/2 and q-1=1;
        // the counter field holds the payload length.
        let mut b = [0_u8; AES_BLOCK_SIZE];
        let mut tag = [0_u8; AES_BLOCK_SIZE];

        b[0] = if alen > 0 { 0x40 } else { 0 } | ((tlen as u8 - 2) / 2) << 3 | 1;
        b[1..14].copy_from_slice(nonce.as_ref());
        b[14] = (plen >> 8) as u8;
        b[15] = plen as u8;

        // CBC-MAC over the length block, associated data, then payload.
        tag.copy_from_slice(&b);
        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(&mut tag));
        if alen > 0 {
            ccm_cbc_mac(&mut tag, associated_data, true, &self.cipher);
        }
        if plen > 0 {
            ccm_cbc_mac(&mut tag, payload, false, &self.cipher);
        }

        // CTR keystream over the payload, block counter starting at 1.
        b[0] = 1;
        b[14] = 0;
        b[15] = 0;
        ccm_ctr_mode(payload, &mut b, &self.cipher);

        // Block 0 of the keystream whitens the tag.
        b[14] = 0;
        b[15] = 0;
        self.cipher
            .encrypt_block(GenericArray::from_mut_slice(&mut b));
        let mut t = GenericArray::default();
        for i in 0..tlen {
            t[i] = tag[i] ^ b[i];
        }

        Ok(t)
    }
}

/// Variation of CBC-MAC used by CCM. With `flag` set, the 16-bit data length
/// is folded into the running tag first (associated data blocks).
fn ccm_cbc_mac(t: &mut [u8; 16], data: &[u8], flag: bool, cipher: &Aes128) {
    let mut dlen = data.len();

    let mut i = if flag {
        t[0] ^= (dlen >> 8) as u8;
        t[1] ^= dlen as u8;
        dlen += 2;
        2
    } else {
        0
    };
    let dlen = dlen;
    let mut data = data.iter();
    while i < dlen {
        t[i % AES_BLOCK_SIZE] ^= data.next().expect("dlen bounds the data iterator");
        i += 1;
        if i % AES_BLOCK_SIZE == 0 || dlen == i {
            cipher.encrypt_block(GenericArray::from_mut_slice(t));
        }
    }
}

/// Variation of CTR used by CCM: the counter lives in the last 2 bytes of the
/// block and is incremented before encryption, not after.
fn ccm_ctr_mode(payload: &mut [u8], ctr: &mut [u8], cipher: &Aes128) {
    let plen = payload.len();

    let mut buffer = [0_u8; AES_BLOCK_SIZE];
    let mut nonce = [0_u8; AES_BLOCK_SIZE];
    nonce.copy_from_slice(ctr);

    let mut block_num = u16::from(nonce[14]) << 8 | u16::from(nonce[15]);
    for i in 0..plen {
        if i % AES_BLOCK_SIZE == 0 {
            block_num += 1;
            nonce[14] = (block_num >> 8) as u8;
            nonce[15] = block_num as u8;
            buffer.copy_from_slice(&nonce);
            cipher.encrypt_block(GenericArray::from_mut_slice(&mut buffer));
        }
        payload[i] ^= buffer[i % AES_BLOCK_SIZE];
    }

    ctr[14] = nonce[14];
    ctr[15] = nonce[15];
}

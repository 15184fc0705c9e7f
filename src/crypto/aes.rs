//! Thin wrapper around the 3rd-party AES-128 implementation so the rest of
//! the crate never touches cipher traits directly. One `AESCipher` holds one
//! key schedule and hands out the ECB/CMAC/CCM modes built from it.
use crate::crypto::aes_cmac::Cmac;
use crate::crypto::key::Key;
use crate::crypto::nonce::Nonce;
use crate::crypto::Salt;
use crate::mesh::MIC;
use aes::cipher::generic_array::typenum::{U4, U8};
use aes::cipher::{generic_array::GenericArray, NewBlockCipher};
use aes::Aes128;
use block_modes::block_padding::ZeroPadding;
use block_modes::BlockMode;
use core::convert::TryInto;
use core::slice;

const AES_BLOCK_LEN: usize = 16;
type AesBlock = [u8; AES_BLOCK_LEN];
const ZERO_BLOCK: AesBlock = [0_u8; AES_BLOCK_LEN];

type AesEcb = block_modes::Ecb<Aes128, ZeroPadding>;
type AesCcmBigMic = crate::crypto::aes_ccm::AesCcm<U8>;
type AesCcmSmallMic = crate::crypto::aes_ccm::AesCcm<U4>;

#[derive(Ord, PartialOrd, Eq, PartialEq, Copy, Clone, Debug, Hash)]
pub enum MicSize {
    Big,
    Small,
}
impl MicSize {
    #[must_use]
    pub fn byte_size(self) -> usize {
        match self {
            MicSize::Big => MIC::big_size(),
            MicSize::Small => MIC::small_size(),
        }
    }
    #[must_use]
    pub fn is_big(self) -> bool {
        match self {
            MicSize::Big => true,
            MicSize::Small => false,
        }
    }
}
pub struct AESCipher(Aes128);
impl AESCipher {
    #[must_use]
    pub fn new(key: Key) -> AESCipher {
        AESCipher(Aes128::new(GenericArray::from_slice(key.as_ref())))
    }
    #[must_use]
    fn cipher(&self) -> &Aes128 {
        &self.0
    }
    #[must_use]
    fn ecb_cipher(&self) -> AesEcb {
        AesEcb::new(self.cipher().clone(), &Default::default())
    }
    #[must_use]
    fn cmac_cipher(&self) -> Cmac<Aes128> {
        Cmac::from_cipher(self.cipher().clone())
    }
    #[must_use]
    fn ccm_big_mic_cipher(&self) -> AesCcmBigMic {
        self.cipher().into()
    }
    #[must_use]
    fn ccm_small_mic_cipher(&self) -> AesCcmSmallMic {
        self.cipher().into()
    }
    /// Encrypts `input` in-place with AES-ECB. Whole blocks are encrypted
    /// where they sit; a partial tail block is zero-padded into a scratch
    /// block and the matching prefix copied back.
    pub fn ecb_encrypt(&self, input: &mut [u8]) {
        let input_len = input.len();
        let mut ecb_cipher = self.ecb_cipher();
        {
            let chunks = input.chunks_exact_mut(AES_BLOCK_LEN);
            for block_u8s in chunks {
                let block_ga = GenericArray::from_mut_slice(block_u8s);
                ecb_cipher.encrypt_blocks(slice::from_mut(block_ga));
            }
        }
        let aligned_len = (input_len / AES_BLOCK_LEN) * AES_BLOCK_LEN;
        let rest = &mut input[aligned_len..];
        if !rest.is_empty() {
            let l = rest.len();
            let mut block_buf = ZERO_BLOCK;
            block_buf[..l].copy_from_slice(rest);
            ecb_cipher.encrypt_blocks(slice::from_mut(GenericArray::from_mut_slice(
                &mut block_buf[..],
            )));
            rest.copy_from_slice(&block_buf[..l]);
        }
    }
    #[must_use]
    pub fn cmac(&self, m: &[u8]) -> Key {
        self.cmac_slice(&[m])
    }
    /// CMAC over the concatenation of `ms` without allocating the
    /// concatenation.
    #[must_use]
    pub fn cmac_slice(&self, ms: &[&[u8]]) -> Key {
        let mut cmac_context = self.cmac_cipher();
        for m in ms {
            if !m.is_empty() {
                cmac_context.input(m);
            }
        }
        cmac_context
            .result()
            .as_slice()
            .try_into()
            .expect("cmac tag is always one 16 byte block")
    }
    /// AES-CCM encryption of `payload` in-place; the detached MIC is
    /// returned. To supply no associated data pass an empty slice (`b""`).
    pub fn ccm_encrypt(
        &self,
        nonce: &Nonce,
        associated_data: &[u8],
        payload: &mut [u8],
        mic_size: MicSize,
    ) -> MIC {
        match mic_size {
            MicSize::Big => {
                let tag = self
                    .ccm_big_mic_cipher()
                    .encrypt_in_place_detached(nonce, associated_data, payload)
                    .expect("payload or associated data too big");
                let mut bytes = [0_u8; 8];
                bytes.copy_from_slice(tag.as_slice());
                MIC::Big(u64::from_be_bytes(bytes))
            }
            MicSize::Small => {
                let tag = self
                    .ccm_small_mic_cipher()
                    .encrypt_in_place_detached(nonce, associated_data, payload)
                    .expect("payload or associated data too big");
                let mut bytes = [0_u8; 4];
                bytes.copy_from_slice(tag.as_slice());
                MIC::Small(u32::from_be_bytes(bytes))
            }
        }
    }
}

impl From<Key> for AESCipher {
    fn from(k: Key) -> Self {
        Self::new(k)
    }
}
impl From<Salt> for AESCipher {
    fn from(s: Salt) -> Self {
        s.as_key().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hex_16_to_array;

    /// FIPS-197 appendix C.1 style check via the NIST AESAVS zero-key vector:
    /// AES-128(key=0, plaintext=0) = 66e94bd4ef8a2c3b884cfa59ca342b2e.
    #[test]
    fn test_ecb_single_block() {
        let mut block = [0_u8; 16];
        AESCipher::new(Key::new([0_u8; 16])).ecb_encrypt(&mut block);
        assert_eq!(
            block,
            hex_16_to_array("66e94bd4ef8a2c3b884cfa59ca342b2e").unwrap()
        );
    }
    /// A partial tail block is zero-padded, so encrypting a 16-byte zero
    /// block and a 7-byte zero prefix must agree on the first 7 bytes.
    #[test]
    fn test_ecb_partial_tail_matches_padded_block() {
        let cipher = AESCipher::new(Key::new([0_u8; 16]));
        let mut full = [0_u8; 16];
        cipher.ecb_encrypt(&mut full);
        let mut partial = [0_u8; 7];
        cipher.ecb_encrypt(&mut partial);
        assert_eq!(partial, full[..7]);
    }
    #[test]
    fn test_cmac_slice_matches_contiguous() {
        let cipher = AESCipher::new(Key::from_hex("2b7e151628aed2a6abf7158809cf4f3c").unwrap());
        let msg = hex_16_to_array("6bc1bee22e409f96e93d7e117393172a").unwrap();
        assert_eq!(
            cipher.cmac(&msg),
            cipher.cmac_slice(&[&msg[..3], b"", &msg[3..]])
        );
    }
    #[test]
    fn test_ccm_mic_sizes() {
        let cipher = AESCipher::new(Key::new([1_u8; 16]));
        let nonce = Nonce::new([2_u8; 13]);
        let mut payload = *b"model";
        let small = cipher.ccm_encrypt(&nonce, b"", &mut payload, MicSize::Small);
        assert_eq!(small.byte_size(), 4);
        let mut payload = *b"model";
        let big = cipher.ccm_encrypt(&nonce, b"", &mut payload, MicSize::Big);
        assert_eq!(big.byte_size(), 8);
    }
}

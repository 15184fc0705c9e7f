//! AES-CMAC (NIST SP 800-38B) over a reusable block cipher. The published
//! `cmac` crate hides its `from_cipher` constructor, so the mode lives here;
//! `AESCipher` needs it to reuse one AES key schedule across many MACs.
use aes::cipher::generic_array::{typenum::Unsigned, ArrayLength, GenericArray};
use aes::cipher::BlockCipher;
use core::fmt;
use dbl::Dbl;

type Block<N> = GenericArray<u8, N>;

#[derive(Clone)]
pub struct Cmac<C>
where
    C: BlockCipher + Clone,
    Block<C::BlockSize>: Dbl,
{
    cipher: C,
    key1: Block<C::BlockSize>,
    key2: Block<C::BlockSize>,
    buffer: Block<C::BlockSize>,
    pos: usize,
}

#[inline(always)]
fn xor<L: ArrayLength<u8>>(buf: &mut Block<L>, data: &Block<L>) {
    for i in 0..L::to_usize() {
        buf[i] ^= data[i];
    }
}

impl<C> Cmac<C>
where
    C: BlockCipher + Clone,
    Block<C::BlockSize>: Dbl,
{
    pub fn from_cipher(cipher: C) -> Self {
        let mut subkey = GenericArray::default();
        cipher.encrypt_block(&mut subkey);

        let key1 = subkey.dbl();
        let key2 = key1.clone().dbl();

        Cmac {
            cipher,
            key1,
            key2,
            buffer: Default::default(),
            pos: 0,
        }
    }

    /// Feeds `data` into the MAC. May be called any number of times; empty
    /// slices are a no-op.
    #[inline]
    pub fn input(&mut self, mut data: &[u8]) {
        let n = C::BlockSize::to_usize();

        let rem = n - self.pos;
        if data.len() >= rem {
            let (l, r) = data.split_at(rem);
            data = r;
            for (a, b) in self.buffer[self.pos..].iter_mut().zip(l) {
                *a ^= *b;
            }
            self.pos = n;
        } else {
            for (a, b) in self.buffer[self.pos..].iter_mut().zip(data) {
                *a ^= *b;
            }
            self.pos += data.len();
            return;
        }

        while data.len() >= n {
            self.cipher.encrypt_block(&mut self.buffer);

            let (l, r) = data.split_at(n);
            data = r;
            for (a, b) in self.buffer.iter_mut().zip(l) {
                *a ^= *b;
            }
        }

        if !data.is_empty() {
            self.cipher.encrypt_block(&mut self.buffer);
            for (a, b) in self.buffer.iter_mut().zip(data) {
                *a ^= *b;
            }
            self.pos = data.len();
        }
    }

    /// Finishes the MAC and returns the full-block tag.
    #[inline]
    pub fn result(mut self) -> Block<C::BlockSize> {
        let n = C::BlockSize::to_usize();
        let mut buf = self.buffer.clone();
        if self.pos == n {
            xor(&mut buf, &self.key1);
        } else {
            xor(&mut buf, &self.key2);
            buf[self.pos] ^= 0x80;
        }
        self.cipher.encrypt_block(&mut buf);
        self.buffer = Default::default();
        self.pos = 0;
        buf
    }
}

impl<C> fmt::Debug for Cmac<C>
where
    C: BlockCipher + fmt::Debug + Clone,
    Block<C::BlockSize>: Dbl,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "Cmac-{:?}", self.cipher)
    }
}

/// RFC 4493 test vectors.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hex_16_to_array;
    use aes::cipher::NewBlockCipher;
    use aes::Aes128;

    fn subject() -> Cmac<Aes128> {
        let key = hex_16_to_array("2b7e151628aed2a6abf7158809cf4f3c").unwrap();
        Cmac::from_cipher(Aes128::new(GenericArray::from_slice(&key)))
    }

    #[test]
    fn test_rfc4493_example_1_empty_message() {
        let expected = hex_16_to_array("bb1d6929e95937287fa37d129b756746").unwrap();
        assert_eq!(subject().result().as_slice(), &expected[..]);
    }
    #[test]
    fn test_rfc4493_example_2_one_block() {
        let msg = hex_16_to_array("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let expected = hex_16_to_array("070a16b46b4d4144f79bdd9dd04a287c").unwrap();
        let mut cmac = subject();
        cmac.input(&msg);
        assert_eq!(cmac.result().as_slice(), &expected[..]);
    }
    #[test]
    fn test_rfc4493_example_3_streamed_input() {
        let block1 = hex_16_to_array("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let block2 = hex_16_to_array("ae2d8a571e03ac9c9eb76fac45af8e51").unwrap();
        let tail = [0x30, 0xc8, 0x1c, 0x46, 0xa3, 0x5c, 0xe4, 0x11];
        let expected = hex_16_to_array("dfa66747de9ae63030ca32611497c827").unwrap();
        // Split across uneven input() calls to exercise buffering.
        let mut cmac = subject();
        cmac.input(&block1[..5]);
        cmac.input(&block1[5..]);
        cmac.input(&block2);
        cmac.input(&tail);
        assert_eq!(cmac.result().as_slice(), &expected[..]);
    }
}

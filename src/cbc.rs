//! A minimal CBC-mode wrapper over [`Blowfish`], scoped to exactly what the
//! mixing kernel needs: an all-zero initial IV and a chain that persists
//! across calls to [`CbcEncrypter::encrypt_blocks`] until the encrypter
//! itself is dropped. There is no decrypt side and no IV reconfiguration —
//! this is not a general-purpose CBC mode.

use crate::blowfish::{Blowfish, BLOCK_SIZE};

pub struct CbcEncrypter<'a> {
    cipher: &'a Blowfish,
    prev: [u8; BLOCK_SIZE],
}

impl<'a> CbcEncrypter<'a> {
    pub fn new(cipher: &'a Blowfish) -> Self {
        CbcEncrypter {
            cipher,
            prev: [0_u8; BLOCK_SIZE],
        }
    }

    /// Encrypts `buf` in place, which must be an exact multiple of
    /// [`BLOCK_SIZE`]. The ciphertext of the last block becomes the
    /// chaining value used by the next call.
    pub fn encrypt_blocks(&mut self, buf: &mut [u8]) {
        debug_assert_eq!(buf.len() % BLOCK_SIZE, 0);

        for chunk in buf.chunks_exact_mut(BLOCK_SIZE) {
            for (b, p) in chunk.iter_mut().zip(self.prev.iter()) {
                *b ^= p;
            }

            let block: &mut [u8; BLOCK_SIZE] = chunk.try_into().unwrap();
            self.cipher.encrypt_block(block);
            self.prev.copy_from_slice(block);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_across_calls() {
        let bf = Blowfish::new(b"some key material").unwrap();

        let mut one_shot = [0_u8; 16];
        let mut cbc = CbcEncrypter::new(&bf);
        cbc.encrypt_blocks(&mut one_shot);

        let mut split = [0_u8; 16];
        let mut cbc_split = CbcEncrypter::new(&bf);
        cbc_split.encrypt_blocks(&mut split[..8]);
        cbc_split.encrypt_blocks(&mut split[8..]);

        assert_eq!(one_shot, split);
    }

    #[test]
    fn differs_from_ecb_after_first_block() {
        let bf = Blowfish::new(b"some key material").unwrap();

        let mut cbc_buf = [0_u8; 16];
        CbcEncrypter::new(&bf).encrypt_blocks(&mut cbc_buf);

        let mut ecb_buf = [0_u8; 16];
        let mut block0: [u8; 8] = ecb_buf[..8].try_into().unwrap();
        bf.encrypt_block(&mut block0);
        ecb_buf[..8].copy_from_slice(&block0);
        let mut block1: [u8; 8] = ecb_buf[8..].try_into().unwrap();
        bf.encrypt_block(&mut block1);
        ecb_buf[8..].copy_from_slice(&block1);

        assert_ne!(cbc_buf[8..], ecb_buf[8..]);
    }
}

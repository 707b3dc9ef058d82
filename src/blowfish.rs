//! The Blowfish block cipher: key schedule and single-block encipher.
//!
//! Adapted from a from-scratch Blowfish implementation, generalized with an
//! in-place [`Blowfish::rekey`] so callers that need a fresh key per
//! invocation (as the mixing kernel does) don't need to reallocate the
//! P-box/S-box tables each time.

use crate::blowfish_consts::{PBOX, SBOX0, SBOX1, SBOX2, SBOX3};

pub const BLOCK_SIZE: usize = 8;
const MIN_KEY_LEN: usize = 1;
const MAX_KEY_LEN: usize = 56;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BlowfishError {
    #[error("blowfish: key must be between {MIN_KEY_LEN} and {MAX_KEY_LEN} bytes")]
    KeySize,
}

pub struct Blowfish {
    pbox: [u32; 18],
    sbox: [[u32; 256]; 4],
}

impl Blowfish {
    pub fn new(key: &[u8]) -> Result<Self, BlowfishError> {
        let mut bf = Blowfish {
            pbox: PBOX,
            sbox: [SBOX0, SBOX1, SBOX2, SBOX3],
        };
        bf.rekey(key)?;
        Ok(bf)
    }

    /// Resets the cipher state to the initial P-box/S-box tables and
    /// re-runs the key schedule in place, avoiding a fresh heap allocation.
    pub fn rekey(&mut self, key: &[u8]) -> Result<(), BlowfishError> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(BlowfishError::KeySize);
        }

        self.pbox = PBOX;
        self.sbox = [SBOX0, SBOX1, SBOX2, SBOX3];

        let mut rolling_key = key.iter().copied().cycle();
        for pb in &mut self.pbox {
            let subkey = (&mut rolling_key)
                .take(4)
                .fold(0_u32, |acc, byte| (acc << 8) | u32::from(byte));
            *pb ^= subkey;
        }

        let mut l = 0_u32;
        let mut r = 0_u32;

        for i in (0..18).step_by(2) {
            self.encrypt_lr(&mut l, &mut r);
            self.pbox[i] = l;
            self.pbox[i + 1] = r;
        }

        for i in 0..4 {
            for j in (0..256).step_by(2) {
                self.encrypt_lr(&mut l, &mut r);
                self.sbox[i][j] = l;
                self.sbox[i][j + 1] = r;
            }
        }

        Ok(())
    }

    #[inline(always)]
    fn round(&self, x: u32) -> u32 {
        let [b0, b1, b2, b3] = x.to_be_bytes();
        let a = self.sbox[0][b0 as usize];
        let b = self.sbox[1][b1 as usize];
        let c = self.sbox[2][b2 as usize];
        let d = self.sbox[3][b3 as usize];
        d.wrapping_add(c ^ a.wrapping_add(b))
    }

    #[inline(always)]
    pub fn encrypt_lr(&self, l: &mut u32, r: &mut u32) {
        for i in (0..16).step_by(2) {
            *l ^= self.pbox[i];
            *r ^= self.round(*l);
            *r ^= self.pbox[i + 1];
            *l ^= self.round(*r);
        }

        *l ^= self.pbox[16];
        *r ^= self.pbox[17];

        std::mem::swap(l, r);
    }

    pub fn encrypt_block(&self, block: &mut [u8; BLOCK_SIZE]) {
        let mut l = u32::from_be_bytes(block[..4].try_into().unwrap());
        let mut r = u32::from_be_bytes(block[4..].try_into().unwrap());

        self.encrypt_lr(&mut l, &mut r);

        block[..4].copy_from_slice(&l.to_be_bytes());
        block[4..].copy_from_slice(&r.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_answer_single_block() {
        // classic Blowfish test vector: all-zero key and plaintext.
        let bf = Blowfish::new(&[0_u8; 8]).unwrap();
        let mut block = [0_u8; 8];
        bf.encrypt_block(&mut block);
        assert_eq!(block, [0x4e, 0xf9, 0x97, 0x45, 0x61, 0x98, 0xdd, 0x78]);
    }

    #[test]
    fn rekey_matches_fresh_construction() {
        let key_a = b"firstkey";
        let key_b = b"anotherkey12345";

        let fresh = Blowfish::new(key_b).unwrap();

        let mut reused = Blowfish::new(key_a).unwrap();
        reused.rekey(key_b).unwrap();

        let mut l1 = 1;
        let mut r1 = 2;
        let mut l2 = 1;
        let mut r2 = 2;
        fresh.encrypt_lr(&mut l1, &mut r1);
        reused.encrypt_lr(&mut l2, &mut r2);

        assert_eq!((l1, r1), (l2, r2));
    }

    #[test]
    fn rejects_bad_key_sizes() {
        assert_eq!(Blowfish::new(&[]).unwrap_err(), BlowfishError::KeySize);
        assert_eq!(
            Blowfish::new(&[0_u8; 57]).unwrap_err(),
            BlowfishError::KeySize
        );
    }
}

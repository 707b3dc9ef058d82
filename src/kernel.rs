//! The memory-hard mixing kernel: one full BATTCrypt round.
//!
//! This is the part that must match the reference implementation
//! bit-exactly — phase ordering, CBC chaining across phases, and the
//! data-dependent XOR feedback all affect the output.

use sha2::{Digest, Sha512};

use crate::blowfish::Blowfish;
use crate::cbc::CbcEncrypter;
use crate::{BLOCK, KEY_LEN};

/// Runs one kernel round: rekey Blowfish from `key_in`, seed `data` and
/// `mem`, run the main data-dependent loop `t_main` times over `mem_blocks`
/// slots, and finalize into a new key.
///
/// `data` must be exactly [`BLOCK`] bytes and `mem` must be exactly
/// `mem_blocks * BLOCK` bytes; both are scratch and are fully overwritten.
/// `blowfish` is caller-owned scratch too, rekeyed fresh at the start of
/// every call — no incoming Blowfish state is trusted.
pub(crate) fn round(
    key_in: [u8; KEY_LEN],
    blowfish: &mut Blowfish,
    data: &mut [u8],
    mem: &mut [u8],
    mem_r: &mut [u8],
    t_main: u64,
    mem_blocks: u64,
) -> [u8; KEY_LEN] {
    debug_assert_eq!(data.len(), BLOCK);
    debug_assert_eq!(mem.len() as u64, mem_blocks * BLOCK as u64);
    debug_assert_eq!(mem_r.len(), BLOCK);

    // (a) Re-key Blowfish from the first 56 bytes of key_in and start a
    // fresh CBC chain. A Blowfish rekey failure here would mean the caller
    // passed something other than exactly 56 bytes, which cannot happen.
    blowfish
        .rekey(&key_in[..56])
        .unwrap_or_else(|_| unreachable!("kernel always rekeys with exactly 56 bytes"));
    let mut cbc = CbcEncrypter::new(blowfish);

    // (b) Seed `data` with 32 concatenated SHA-512(counter || key) blocks.
    for i in 0_u64..32 {
        let mut sha = Sha512::new();
        sha.update(i.to_be_bytes());
        sha.update(key_in);
        let digest = sha.finalize();
        data[i as usize * 64..(i as usize + 1) * 64].copy_from_slice(&digest);
    }

    // (c) Seed `mem`: CBC-encrypt `data` once per slot, copying the result
    // into that slot, then run one more encryption pass that feeds the
    // main loop below.
    for slot in mem.chunks_exact_mut(BLOCK) {
        cbc.encrypt_blocks(data);
        slot.copy_from_slice(data);
    }
    cbc.encrypt_blocks(data);

    // (d) Main loop: data-dependent index into mem, block-wide XOR
    // feedback, CBC re-encryption of the touched slot.
    let mask = mem_blocks - 1;
    for _ in 0..t_main {
        for j in 0..mem_blocks as usize {
            let r = {
                let tail = &data[BLOCK - 8..];
                u64::from_be_bytes(tail.try_into().unwrap()) & mask
            } as usize;

            // mem[j] ^= mem[r], read at this instant: when r == j this
            // zeroes mem[j], which is intentional data-dependent behavior,
            // not a bug to guard against.
            mem_r.copy_from_slice(&mem[r * BLOCK..(r + 1) * BLOCK]);
            let slot = &mut mem[j * BLOCK..(j + 1) * BLOCK];
            xor_in_place(slot, mem_r);
            xor_in_place(slot, data);
            cbc.encrypt_blocks(slot);
            xor_in_place(data, slot);
        }
    }

    // (e) Finalize: tmp = SHA512(data || key_in); key_out = SHA512(tmp).
    let mut sha = Sha512::new();
    sha.update(&data[..]);
    sha.update(key_in);
    let tmp = sha.finalize();

    let mut sha2 = Sha512::new();
    sha2.update(tmp);
    let key_out = sha2.finalize();

    let mut out = [0_u8; KEY_LEN];
    out.copy_from_slice(&key_out);
    out
}

/// XORs `dst ^= src`, both exactly [`BLOCK`] bytes, in native-word chunks.
fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    debug_assert_eq!(dst.len(), src.len());

    let dst_words = dst.chunks_exact_mut(8);
    let src_words = src.chunks_exact(8);
    for (d, s) in dst_words.zip(src_words) {
        let dv = u64::from_ne_bytes(d.try_into().unwrap());
        let sv = u64::from_ne_bytes(s.try_into().unwrap());
        d.copy_from_slice(&(dv ^ sv).to_ne_bytes());
    }
}

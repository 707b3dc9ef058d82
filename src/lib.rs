//! BATTCrypt — "Blowfish All The Things" — a memory-hard password hashing
//! construction by Steven Thomas (PHC candidate, 2014).
//!
//! [`hash`] turns a password, a salt, and three cost dials (`time`,
//! `upgrade`, `memory`) into a 64-byte key. [`strengthen`] re-costs an
//! existing key from one `upgrade` value to a higher one without the
//! original password.
//!
//! The hard part of this crate is [`kernel`]: a fixed-size working buffer of
//! SHA-512-seeded blocks, repeatedly transformed by CBC-mode Blowfish
//! encryption with data-dependent XOR feedback across pseudo-random block
//! indices. Everything else — cost decoding, scratch allocation, and the
//! `t_upgrade`-iteration loop — lives in this module.

mod blowfish;
mod blowfish_consts;
mod cbc;
mod costs;
mod kernel;

use sha2::{Digest, Sha512};

/// Size of one memory block: 32 concatenated SHA-512 outputs.
pub const BLOCK: usize = 64 * 32;

/// Size of a BATTCrypt key, and of a SHA-512 digest.
pub const KEY_LEN: usize = 64;

/// Maximum accepted value for the `time` cost.
pub const MAX_TIME: u64 = 62;

/// Maximum accepted value for the `upgrade` cost.
pub const MAX_UPGRADE: u64 = 63;

/// Maximum accepted value for the `memory` cost.
pub const MAX_MEMORY: u64 = 50;

/// A BATTCrypt output key: 64 bytes, suitable for password verification.
pub type Key = [u8; KEY_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BattcryptError {
    /// A cost parameter exceeded its documented maximum.
    #[error("battcrypt: a cost was outside of the acceptable range")]
    OutOfRange,
    /// `strengthen` was asked to lower the effective upgrade cost.
    #[error("battcrypt: new upgrade cost must be higher than old upgrade cost")]
    UpgradeInvalid,
}

/// The number of bytes one in-flight `hash` or `strengthen` call would
/// allocate for a given `memory` cost, without allocating it: the
/// `mem_blocks`-slot table plus the one extra `data` scratch block the
/// kernel carries alongside it. Lets a caller pre-flight a cost parameter
/// before committing to a (potentially multi-terabyte) allocation;
/// `memory = 50` alone is already ~9 TiB.
pub fn memory_footprint(memory: u64) -> Result<u64, BattcryptError> {
    if memory > MAX_MEMORY {
        return Err(BattcryptError::OutOfRange);
    }
    Ok(((4_u64 << memory) + 1) * BLOCK as u64)
}

/// Hashes `password` with `salt` under the given cost parameters.
///
/// `time` controls the main mixing loop count, `upgrade` controls how many
/// times the kernel is applied (and is the cost later re-costed by
/// [`strengthen`]), and `memory` controls the size of the working memory
/// table (`4 << memory` blocks of [`BLOCK`] bytes each).
pub fn hash(password: &[u8], salt: &[u8], time: u64, upgrade: u64, memory: u64) -> Result<Key, BattcryptError> {
    let costs::Costs {
        t_main,
        t_upgrade,
        mem_blocks,
    } = costs::costs(time, upgrade, memory)?;

    log::debug!(
        "hash: time={time} upgrade={upgrade} memory={memory} -> {t_upgrade} kernel round(s), mem={} bytes",
        mem_blocks * BLOCK as u64
    );

    let mut scratch = Scratch::new(mem_blocks);

    let mut key = Sha512::digest(salt);
    let mut key_arr = [0_u8; KEY_LEN];
    key_arr.copy_from_slice(&key);

    let mut sha = Sha512::new();
    sha.update(key_arr);
    sha.update(password);
    key = sha.finalize();
    key_arr.copy_from_slice(&key);

    for u in 0..t_upgrade {
        log::trace!("hash: kernel round {u}/{t_upgrade}");
        key_arr = scratch.round(key_arr, t_main, mem_blocks);
    }

    Ok(key_arr)
}

/// Re-costs `old` from `upgrade_old` to `upgrade_new` without the original
/// password, applying the kernel the same number of additional times a
/// fresh [`hash`] call at `upgrade_new` would have applied in total.
///
/// `time` and `memory` must match the values `old` was produced with;
/// passing different values silently produces an unrelated, valid-looking
/// key rather than an error, since the kernel has no way to tell a
/// mismatched cost apart from a correct one.
pub fn strengthen(
    old: Key,
    time: u64,
    upgrade_old: u64,
    upgrade_new: u64,
    memory: u64,
) -> Result<Key, BattcryptError> {
    let old_costs = costs::costs(time, upgrade_old, memory)?;
    let new_costs = costs::costs(time, upgrade_new, memory)?;

    if old_costs.t_upgrade > new_costs.t_upgrade {
        return Err(BattcryptError::UpgradeInvalid);
    }
    if old_costs.t_upgrade == new_costs.t_upgrade {
        return Ok(old);
    }

    log::debug!(
        "strengthen: upgrade_old={upgrade_old} (t_upgrade={}) -> upgrade_new={upgrade_new} (t_upgrade={})",
        old_costs.t_upgrade,
        new_costs.t_upgrade
    );

    let mut scratch = Scratch::new(old_costs.mem_blocks);
    let mut key = old;

    // Iterate u from t_upgrade(upgrade_old) - 1 through t_upgrade(upgrade_new) - 1
    // inclusive: one more kernel application than the naive delta. Kept
    // exactly as the reference construction runs it, since an existing key
    // re-costed this way must come out byte-identical to one produced the
    // same way before.
    for u in (old_costs.t_upgrade - 1)..new_costs.t_upgrade {
        log::trace!("strengthen: kernel round {u}");
        key = scratch.round(key, old_costs.t_main, old_costs.mem_blocks);
    }

    Ok(key)
}

/// Owns the kernel's scratch buffers for the lifetime of one `hash` or
/// `strengthen` call, so repeated kernel rounds don't reallocate.
struct Scratch {
    blowfish: blowfish::Blowfish,
    data: Vec<u8>,
    mem: Vec<u8>,
    mem_r: Vec<u8>,
}

impl Scratch {
    fn new(mem_blocks: u64) -> Self {
        Scratch {
            // Placeholder key; the kernel rekeys on every round before use.
            blowfish: blowfish::Blowfish::new(&[0_u8; 56]).unwrap(),
            data: vec![0_u8; BLOCK],
            mem: vec![0_u8; mem_blocks as usize * BLOCK],
            mem_r: vec![0_u8; BLOCK],
        }
    }

    fn round(&mut self, key_in: Key, t_main: u64, mem_blocks: u64) -> Key {
        kernel::round(
            key_in,
            &mut self.blowfish,
            &mut self.data,
            &mut self.mem,
            &mut self.mem_r,
            t_main,
            mem_blocks,
        )
    }
}

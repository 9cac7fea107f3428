// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Swap status key retention
//!
//! An image swap between the primary and secondary slots can be interrupted
//! by a reset. To resume it, the keys for both slots have to be recovered
//! without the original images being intact, so they are kept in the swap
//! status area: either the derived key itself or the wrapped record it came
//! from, depending on [`KeyRetention`](q_common::KeyRetention).
//!
//! Erased entries read as `0xff`, matching erased flash.

use zeroize::Zeroize;

use q_common::constants::{BOOT_NUM_SLOTS, ENC_KEY_SIZE, ENC_RECORD_MAX_SIZE, ERASED_VAL};

use crate::slots::N_SLOTS;

/// Key retention area of the swap status
///
/// Indexed by the same flat slot index as the key store. Scrubbed to the
/// erased value on drop.
pub struct BootStatus {
    /// Per-slot derived keys
    pub enckey: [[u8; ENC_KEY_SIZE]; N_SLOTS],
    /// Per-slot wrapped records (first `record_len` bytes used)
    pub enctlv: [[u8; ENC_RECORD_MAX_SIZE]; N_SLOTS],
}

impl BootStatus {
    /// Create an erased status
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enckey: [[ERASED_VAL; ENC_KEY_SIZE]; N_SLOTS],
            enctlv: [[ERASED_VAL; ENC_RECORD_MAX_SIZE]; N_SLOTS],
        }
    }

    /// Erase all retained keys and records
    pub fn reset(&mut self) {
        for key in &mut self.enckey {
            key.fill(ERASED_VAL);
        }
        for rec in &mut self.enctlv {
            rec.fill(ERASED_VAL);
        }
    }

    /// Check if the derived key of slot `index` is erased
    #[must_use]
    pub fn key_is_erased(&self, index: usize) -> bool {
        self.enckey
            .get(index)
            .map_or(true, |k| k.iter().all(|&b| b == ERASED_VAL))
    }

    /// Check if the first `len` record bytes of slot `index` are erased
    #[must_use]
    pub fn record_is_erased(&self, index: usize, len: usize) -> bool {
        self.enctlv
            .get(index)
            .and_then(|r| r.get(..len))
            .map_or(true, |r| r.iter().all(|&b| b == ERASED_VAL))
    }

    /// Retain a derived key for slot `index`
    pub fn store_key(&mut self, index: usize, key: &[u8; ENC_KEY_SIZE]) {
        if let Some(dst) = self.enckey.get_mut(index) {
            dst.copy_from_slice(key);
        }
    }

    /// Record buffer for slot `index`
    pub fn enctlv_mut(&mut self, index: usize) -> Option<&mut [u8; ENC_RECORD_MAX_SIZE]> {
        self.enctlv.get_mut(index)
    }

    /// Slots of one image, as flat indices
    #[must_use]
    pub const fn image_slots(image_index: usize) -> [usize; BOOT_NUM_SLOTS] {
        [image_index * BOOT_NUM_SLOTS, image_index * BOOT_NUM_SLOTS + 1]
    }
}

impl Default for BootStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl Zeroize for BootStatus {
    fn zeroize(&mut self) {
        self.enckey.zeroize();
        self.enctlv.zeroize();
        self.reset();
    }
}

impl Drop for BootStatus {
    fn drop(&mut self) {
        self.zeroize();
    }
}

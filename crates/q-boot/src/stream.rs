// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! AES-128-CTR stream engine
//!
//! Image payloads are encrypted with AES-128 in counter mode. The counter
//! block for payload offset `off` is twelve zero bytes followed by
//! `off >> 4` as a big-endian `u32`, so any 16-byte aligned block can be
//! decrypted on its own and a buffer can be processed in arbitrary chunks:
//!
//! ```text
//! counter = 00 00 00 00 00 00 00 00 00 00 00 00 | BE32(off >> 4)
//! ```
//!
//! The operation is its own inverse; the same call encrypts and decrypts.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt};
use q_common::constants::AES_BLOCK_SIZE;
use q_crypto::SecretBuffer;

use crate::image::ImageHeader;
use crate::slots::KeySlot;

const BLOCK_MASK: usize = AES_BLOCK_SIZE - 1;

/// Initial counter block for payload offset `image_offset`
#[must_use]
pub const fn initial_counter(image_offset: u32) -> u128 {
    (image_offset >> 4) as u128
}

/// XOR `buf` with the keystream of `slot` starting at a payload position
///
/// `image_offset` is the payload offset of `buf[0]` and `block_offset` its
/// position within the 16-byte block (normally `image_offset & 0xf`).
///
/// # Panics
///
/// Panics if the slot holds no key. Callers check
/// [`KeyStore::is_ready`](crate::KeyStore::is_ready) first.
pub fn transform(slot: &KeySlot, image_offset: u32, block_offset: usize, buf: &mut [u8]) {
    let Some(cipher) = slot.cipher() else {
        panic!("stream transform on an inactive key slot");
    };

    let mut counter = initial_counter(image_offset);
    let mut keystream = SecretBuffer::<AES_BLOCK_SIZE>::new();
    let mut blk_off = block_offset & BLOCK_MASK;

    for (i, byte) in buf.iter_mut().enumerate() {
        if i == 0 || blk_off == 0 {
            let block = keystream.as_mut_slice();
            block.copy_from_slice(&counter.to_be_bytes());
            cipher.encrypt_block(GenericArray::from_mut_slice(block));
            counter = counter.wrapping_add(1);
        }
        *byte ^= keystream.as_slice()[blk_off];
        blk_off = (blk_off + 1) & BLOCK_MASK;
    }
    // keystream is scrubbed on drop
}

/// Decrypt the payload part of a chunk copied out of an image slot
///
/// `chunk_off` is the offset of `buf[0]` from the start of the flash area.
/// Bytes belonging to the header or to the TLV areas are left untouched.
/// Returns the number of bytes transformed.
///
/// # Panics
///
/// Panics if the chunk overlaps the payload and the slot holds no key.
pub fn decrypt_copy_chunk(slot: &KeySlot, hdr: &ImageHeader, chunk_off: u32, buf: &mut [u8]) -> usize {
    let hdr_size = usize::from(hdr.hdr_size);
    let tlv_off = hdr.tlv_offset() as usize;
    let start = chunk_off as usize;
    let end = start.saturating_add(buf.len());

    let lo = start.max(hdr_size);
    let hi = end.min(tlv_off);
    if lo >= hi {
        return 0;
    }

    let image_offset = (lo - hdr_size) as u32;
    transform(
        slot,
        image_offset,
        image_offset as usize & BLOCK_MASK,
        &mut buf[lo - start..hi - start],
    );
    hi - lo
}

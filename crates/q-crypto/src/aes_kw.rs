// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! RFC 3394 AES-128 key unwrap
//!
//! The image key is wrapped under a 128-bit key-encryption key (KEK)
//! provisioned into the bootloader. A 16-byte key wraps to 24 bytes: the
//! 8-byte integrity register `A` followed by two 8-byte halves.
//!
//! # Security
//!
//! The integrity register is compared in constant time, and a mismatch is
//! reported as [`CodecError::IntegrityCheckFailed`] without releasing the
//! unwrapped halves.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use q_common::constants::{ENC_KEY_SIZE, ENC_KW128_RECORD_SIZE, TLV_ENC_KW128};

use crate::error::{CodecError, CodecResult};
use crate::traits::WrappedKeyCodec;
use crate::zeroize_utils::{constant_time_eq, secure_zero, DerivedKey, SecretBuffer};

/// RFC 3394 default initial value
pub const KW_IV: [u8; 8] = [0xA6; 8];

/// Number of 64-bit key halves for a 128-bit key
const KW_HALVES: usize = ENC_KEY_SIZE / 8;

/// Outer rounds
const KW_ROUNDS: u8 = 6;

/// AES-128 key-wrap codec bound to a provisioned KEK
pub struct AesKeyWrapCodec {
    kek: Aes128,
}

impl AesKeyWrapCodec {
    /// Create a codec from the 128-bit key-encryption key
    #[must_use]
    pub fn new(kek: &[u8; ENC_KEY_SIZE]) -> Self {
        Self {
            kek: Aes128::new(GenericArray::from_slice(kek)),
        }
    }

    /// Unwrap a 24-byte record into the 16-byte image key
    ///
    /// # Errors
    ///
    /// - `InvalidLength` if `blob` is not 24 bytes
    /// - `IntegrityCheckFailed` if the recovered register is not [`KW_IV`]
    pub fn unwrap_key(&self, blob: &[u8]) -> CodecResult<DerivedKey> {
        if blob.len() != ENC_KW128_RECORD_SIZE {
            return Err(CodecError::InvalidLength);
        }

        let mut a = [0u8; 8];
        a.copy_from_slice(&blob[..8]);
        let mut key = DerivedKey::default();
        key.as_mut_slice().copy_from_slice(&blob[8..]);

        let mut b = SecretBuffer::<16>::new();
        for j in (0..KW_ROUNDS).rev() {
            for i in (1..=KW_HALVES).rev() {
                let r = &mut key.as_mut_slice()[(i - 1) * 8..i * 8];
                let buf = b.as_mut_slice();
                buf[..8].copy_from_slice(&a);
                // t = n*j + i never exceeds one byte for n = 2.
                buf[7] ^= (KW_HALVES as u8) * j + i as u8;
                buf[8..].copy_from_slice(r);
                self.kek.decrypt_block(GenericArray::from_mut_slice(buf));
                a.copy_from_slice(&buf[..8]);
                r.copy_from_slice(&buf[8..]);
            }
        }

        let intact = constant_time_eq(&a, &KW_IV);
        secure_zero(&mut a);
        if intact {
            Ok(key)
        } else {
            // Dropping `key` scrubs the unwrapped halves.
            Err(CodecError::IntegrityCheckFailed)
        }
    }

    /// Wrap a 16-byte key (RFC 3394 §2.2.1)
    ///
    /// Used by provisioning tools and tests; the boot path only unwraps.
    #[must_use]
    pub fn wrap_key(&self, key: &[u8; ENC_KEY_SIZE]) -> [u8; ENC_KW128_RECORD_SIZE] {
        let mut out = [0u8; ENC_KW128_RECORD_SIZE];
        out[..8].copy_from_slice(&KW_IV);
        out[8..].copy_from_slice(key);

        let mut b = SecretBuffer::<16>::new();
        for j in 0..KW_ROUNDS {
            for i in 1..=KW_HALVES {
                let buf = b.as_mut_slice();
                buf[..8].copy_from_slice(&out[..8]);
                buf[8..].copy_from_slice(&out[i * 8..(i + 1) * 8]);
                self.kek.encrypt_block(GenericArray::from_mut_slice(buf));
                buf[7] ^= (KW_HALVES as u8) * j + i as u8;
                out[..8].copy_from_slice(&buf[..8]);
                out[i * 8..(i + 1) * 8].copy_from_slice(&buf[8..]);
            }
        }
        out
    }
}

impl WrappedKeyCodec for AesKeyWrapCodec {
    fn name(&self) -> &'static str {
        "aes128-kw"
    }

    fn tlv_type(&self) -> u16 {
        TLV_ENC_KW128
    }

    fn record_len(&self) -> usize {
        ENC_KW128_RECORD_SIZE
    }

    fn decode(&self, blob: &[u8]) -> CodecResult<DerivedKey> {
        self.unwrap_key(blob)
    }
}

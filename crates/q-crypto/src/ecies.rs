// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! ECIES-P256 key transport
//!
//! Record layout (113 bytes):
//!
//! ```text
//! +------+----------------------+-------------------+-----------------+
//! | 0x04 | ephemeral X || Y (64) | HMAC-SHA256 (32)  | AES-CTR ct (16) |
//! +------+----------------------+-------------------+-----------------+
//! ```
//!
//! Decoding: ECDH between the device key and the ephemeral point, HKDF-SHA256
//! (empty salt, info `MCUBoot_ECIES_v1`) to 48 bytes, verify the HMAC over
//! the ciphertext with bytes 16..48, then AES-128-CTR decrypt with bytes
//! 0..16 and an all-zero initial counter block.
//!
//! The device key is a PKCS#8 `PrivateKeyInfo` wrapping an RFC 5915
//! `ECPrivateKey`. It is parsed for each decode and the scalar is scrubbed
//! right after the ECDH step.
//!
//! # Security
//!
//! - The tag is checked in constant time before anything is decrypted
//! - Shared secret, derived keys and computed tag live in an
//!   [`EciesScratch`] that is zeroized on every exit path

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use p256::pkcs8::der::{self, asn1::OctetStringRef, Decode, Reader, SliceReader};
use p256::pkcs8::{PrivateKeyInfo, Version};
use p256::{PublicKey, SecretKey};
use sha2::Sha256;
use zeroize::Zeroize;

use q_common::constants::{ECIES_HKDF_INFO, ENC_EC256_RECORD_SIZE, ENC_KEY_SIZE, TLV_ENC_EC256};

use crate::error::{CodecError, CodecResult};
use crate::traits::WrappedKeyCodec;
use crate::zeroize_utils::{constant_time_eq, is_zero, DerivedKey, SecretBuffer};

type HmacSha256 = Hmac<Sha256>;

/// SEC1 uncompressed point marker
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

/// Uncompressed P-256 point size including the marker
pub const EC_POINT_SIZE: usize = 65;

/// HMAC-SHA256 tag size
pub const EC_TAG_SIZE: usize = 32;

/// Private scalar size
pub const EC_SCALAR_SIZE: usize = 32;

/// HKDF output: AES key followed by HMAC key
pub const EC_DERIVED_SIZE: usize = ENC_KEY_SIZE + EC_TAG_SIZE;

const TAG_OFFSET: usize = EC_POINT_SIZE;
const CIPHERTEXT_OFFSET: usize = EC_POINT_SIZE + EC_TAG_SIZE;

// =============================================================================
// Scratch Memory
// =============================================================================

/// Transient secrets of one ECIES decode
///
/// Callers normally never see this; [`EciesCodec::decode_with_scratch`]
/// exposes it so the scrubbing can be inspected.
#[derive(Default)]
pub struct EciesScratch {
    shared: SecretBuffer<32>,
    derived: SecretBuffer<EC_DERIVED_SIZE>,
    tag: SecretBuffer<EC_TAG_SIZE>,
    keystream: SecretBuffer<ENC_KEY_SIZE>,
}

impl EciesScratch {
    /// Create zeroed scratch memory
    #[must_use]
    pub const fn new() -> Self {
        Self {
            shared: SecretBuffer::new(),
            derived: SecretBuffer::new(),
            tag: SecretBuffer::new(),
            keystream: SecretBuffer::new(),
        }
    }

    /// True if every scratch byte is zero
    #[must_use]
    pub fn is_scrubbed(&self) -> bool {
        is_zero(self.shared.as_slice())
            && is_zero(self.derived.as_slice())
            && is_zero(self.tag.as_slice())
            && is_zero(self.keystream.as_slice())
    }
}

impl Zeroize for EciesScratch {
    fn zeroize(&mut self) {
        self.shared.zeroize();
        self.derived.zeroize();
        self.tag.zeroize();
        self.keystream.zeroize();
    }
}

// =============================================================================
// Private Key Parsing
// =============================================================================

/// Parse a PKCS#8 P-256 private key
///
/// Only PKCS#8 version 0 is accepted. The algorithm and curve OIDs, the
/// `ECPrivateKey` version and the scalar range are checked by `p256`.
///
/// # Errors
///
/// `MalformedKey` unless the structure, both OIDs, the versions and the
/// 32-byte scalar are exactly as expected and the scalar is in range.
pub fn parse_private_key(der: &[u8]) -> CodecResult<SecretKey> {
    let info = PrivateKeyInfo::try_from(der).map_err(|_| CodecError::MalformedKey)?;
    if info.version() != Version::V1 {
        return Err(CodecError::MalformedKey);
    }
    if !scalar_is_full_width(info.private_key).map_err(|_| CodecError::MalformedKey)? {
        return Err(CodecError::MalformedKey);
    }
    SecretKey::try_from(info).map_err(|_| CodecError::MalformedKey)
}

/// `ECPrivateKey { version, privateKey OCTET STRING, .. }` with a 32-byte scalar
fn scalar_is_full_width(ec_private_key: &[u8]) -> der::Result<bool> {
    let mut reader = SliceReader::new(ec_private_key)?;
    reader.sequence(|seq| {
        let _version = u8::decode(seq)?;
        let scalar = OctetStringRef::decode(seq)?;
        // Parameters and public key are not needed here.
        let rest = seq.remaining_len();
        seq.read_slice(rest)?;
        Ok(scalar.as_bytes().len() == EC_SCALAR_SIZE)
    })
}

// =============================================================================
// Codec
// =============================================================================

/// ECIES-P256 codec over a provisioned PKCS#8 device key
///
/// The key lives in flash for the lifetime of the bootloader.
pub struct EciesCodec {
    key_der: &'static [u8],
}

impl EciesCodec {
    /// Create a codec, validating the provisioned key once
    ///
    /// # Errors
    ///
    /// `MalformedKey` if the key does not parse.
    pub fn new(key_der: &'static [u8]) -> CodecResult<Self> {
        drop(parse_private_key(key_der)?);
        Ok(Self { key_der })
    }

    /// Decode a record, using caller-provided scratch memory
    ///
    /// `scratch` is zeroized before this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// - `InvalidLength` if `blob` is not 113 bytes
    /// - `PointFormatError` if byte 0 is not `0x04`
    /// - `InvalidPublicKey` if the point is not on the curve
    /// - `MalformedKey` if the device key fails to parse
    /// - `TagMismatch` if the HMAC does not verify
    pub fn decode_with_scratch(
        &self,
        blob: &[u8],
        scratch: &mut EciesScratch,
    ) -> CodecResult<DerivedKey> {
        let result = self.decode_inner(blob, scratch);
        scratch.zeroize();
        result
    }

    fn decode_inner(&self, blob: &[u8], scratch: &mut EciesScratch) -> CodecResult<DerivedKey> {
        if blob.len() != ENC_EC256_RECORD_SIZE {
            return Err(CodecError::InvalidLength);
        }
        if blob[0] != UNCOMPRESSED_POINT_TAG {
            return Err(CodecError::PointFormatError);
        }
        let ephemeral = PublicKey::from_sec1_bytes(&blob[..EC_POINT_SIZE])
            .map_err(|_| CodecError::InvalidPublicKey)?;

        {
            let secret = parse_private_key(self.key_der)?;
            let mut scalar = secret.to_nonzero_scalar();
            drop(secret);
            let shared = p256::ecdh::diffie_hellman(&scalar, ephemeral.as_affine());
            scalar.zeroize();
            scratch
                .shared
                .as_mut_slice()
                .copy_from_slice(shared.raw_secret_bytes().as_slice());
        }

        Hkdf::<Sha256>::new(None, scratch.shared.as_slice())
            .expand(ECIES_HKDF_INFO, scratch.derived.as_mut_slice())
            .map_err(|_| CodecError::KeyDerivationFailed)?;
        scratch.shared.zeroize();

        let ciphertext = &blob[CIPHERTEXT_OFFSET..];
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&scratch.derived.as_slice()[ENC_KEY_SIZE..])
            .map_err(|_| CodecError::KeyDerivationFailed)?;
        mac.update(ciphertext);
        scratch
            .tag
            .as_mut_slice()
            .copy_from_slice(mac.finalize().into_bytes().as_slice());

        if !constant_time_eq(scratch.tag.as_slice(), &blob[TAG_OFFSET..CIPHERTEXT_OFFSET]) {
            return Err(CodecError::TagMismatch);
        }

        // CTR with a zero counter block: one keystream block covers the key.
        let cipher = Aes128::new(GenericArray::from_slice(&scratch.derived.as_slice()[..ENC_KEY_SIZE]));
        cipher.encrypt_block(GenericArray::from_mut_slice(scratch.keystream.as_mut_slice()));

        let mut key = DerivedKey::default();
        for ((out, c), k) in key
            .as_mut_slice()
            .iter_mut()
            .zip(ciphertext)
            .zip(scratch.keystream.as_slice())
        {
            *out = c ^ k;
        }
        Ok(key)
    }
}

impl WrappedKeyCodec for EciesCodec {
    fn name(&self) -> &'static str {
        "ecies-p256"
    }

    fn tlv_type(&self) -> u16 {
        TLV_ENC_EC256
    }

    fn record_len(&self) -> usize {
        ENC_EC256_RECORD_SIZE
    }

    fn decode(&self, blob: &[u8]) -> CodecResult<DerivedKey> {
        let mut scratch = EciesScratch::new();
        self.decode_with_scratch(blob, &mut scratch)
    }
}

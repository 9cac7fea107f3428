// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! RSA-2048 OAEP key transport
//!
//! The image key is encrypted to the device's RSA public key with OAEP
//! (SHA-256 for both the label hash and MGF1). The private key is
//! provisioned as a PKCS#1 `RSAPrivateKey` DER blob:
//!
//! ```text
//! SEQUENCE { version 0, n, e, d, p, q [, dP, dQ, qInv] }
//! ```
//!
//! The CRT parameters are optional; when absent they are derived from the
//! primes, and when present they must agree with the derived values.
//!
//! # Security
//!
//! Every decryption failure, a wrongly sized ciphertext included, collapses
//! into [`CodecError::DecryptFailed`]. The decrypted plaintext is scrubbed
//! before returning and is never logged.
//!
//! The private-key operation runs without blinding: the bootloader has no
//! entropy source to draw blinding factors from. Its timing is therefore
//! not hidden from an attacker who can measure single decryptions.

use alloc::vec;

use der::asn1::UintRef;
use der::{Decode, DecodeValue, FixedTag, Header, Reader, Tag};
use rsa::traits::PrivateKeyParts;
use rsa::{BigUint, Oaep, RsaPrivateKey};
use sha2::Sha256;
use zeroize::Zeroize;

use q_common::constants::{ENC_RSA2048_RECORD_SIZE, TLV_ENC_RSA2048};

use crate::error::{CodecError, CodecResult};
use crate::traits::WrappedKeyCodec;
use crate::zeroize_utils::DerivedKey;

/// RSA-OAEP codec holding the parsed device private key
pub struct RsaOaepCodec {
    key: RsaPrivateKey,
}

impl RsaOaepCodec {
    /// Parse a PKCS#1 DER private key
    ///
    /// # Errors
    ///
    /// `MalformedKey` on any structural violation, a non-zero version,
    /// trailing data, or a key that fails the consistency checks.
    pub fn from_der(der: &[u8]) -> CodecResult<Self> {
        parse_private_key(der).map(|key| Self { key })
    }

    /// Modulus size in bytes
    #[must_use]
    pub fn modulus_len(&self) -> usize {
        rsa::traits::PublicKeyParts::size(&self.key)
    }

    /// Decrypt an OAEP record into the 16-byte image key
    ///
    /// # Errors
    ///
    /// `DecryptFailed` if `blob` is not modulus-sized, for any padding
    /// failure, or for a plaintext that is not exactly 16 bytes.
    pub fn decrypt_key(&self, blob: &[u8]) -> CodecResult<DerivedKey> {
        if blob.len() != self.modulus_len() {
            return Err(CodecError::DecryptFailed);
        }

        let mut plain = self
            .key
            .decrypt(Oaep::new::<Sha256>(), blob)
            .map_err(|_| CodecError::DecryptFailed)?;
        let key = DerivedKey::from_slice(&plain).ok_or(CodecError::DecryptFailed);
        plain.as_mut_slice().zeroize();
        key
    }
}

impl WrappedKeyCodec for RsaOaepCodec {
    fn name(&self) -> &'static str {
        "rsa2048-oaep"
    }

    fn tlv_type(&self) -> u16 {
        TLV_ENC_RSA2048
    }

    fn record_len(&self) -> usize {
        ENC_RSA2048_RECORD_SIZE
    }

    fn decode(&self, blob: &[u8]) -> CodecResult<DerivedKey> {
        self.decrypt_key(blob)
    }
}

// =============================================================================
// Private Key Parsing
// =============================================================================

/// PKCS#1 `RSAPrivateKey` with the CRT triple optional
struct RsaKeyDer<'a> {
    n: UintRef<'a>,
    e: UintRef<'a>,
    d: UintRef<'a>,
    p: UintRef<'a>,
    q: UintRef<'a>,
    crt: Option<[UintRef<'a>; 3]>,
}

impl FixedTag for RsaKeyDer<'_> {
    const TAG: Tag = Tag::Sequence;
}

impl<'a> DecodeValue<'a> for RsaKeyDer<'a> {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |seq| {
            if u8::decode(seq)? != 0 {
                return Err(Tag::Integer.value_error());
            }

            let n = seq.decode()?;
            let e = seq.decode()?;
            let d = seq.decode()?;
            let p = seq.decode()?;
            let q = seq.decode()?;

            let dp: Option<UintRef<'a>> = seq.decode()?;
            let dq: Option<UintRef<'a>> = seq.decode()?;
            let qinv: Option<UintRef<'a>> = seq.decode()?;
            let crt = match (dp, dq, qinv) {
                (Some(dp), Some(dq), Some(qinv)) => Some([dp, dq, qinv]),
                (None, None, None) => None,
                _ => return Err(Tag::Integer.value_error()),
            };

            Ok(Self { n, e, d, p, q, crt })
        })
    }
}

fn to_biguint(int: &UintRef<'_>) -> BigUint {
    BigUint::from_bytes_be(int.as_bytes())
}

fn parse_private_key(der: &[u8]) -> CodecResult<RsaPrivateKey> {
    let parsed = RsaKeyDer::from_der(der).map_err(|_| CodecError::MalformedKey)?;

    // Validates n = p*q and d*e = 1 mod lcm, then precomputes dP, dQ, qInv.
    let key = RsaPrivateKey::from_components(
        to_biguint(&parsed.n),
        to_biguint(&parsed.e),
        to_biguint(&parsed.d),
        vec![to_biguint(&parsed.p), to_biguint(&parsed.q)],
    )
    .map_err(|_| CodecError::MalformedKey)?;

    match parsed.crt {
        Some([dp, dq, qinv]) => {
            let mut dp = to_biguint(&dp);
            let mut dq = to_biguint(&dq);
            let mut qinv = to_biguint(&qinv);
            let consistent = key.dp() == Some(&dp)
                && key.dq() == Some(&dq)
                && key.crt_coefficient().as_ref() == Some(&qinv);
            dp.zeroize();
            dq.zeroize();
            qinv.zeroize();
            if !consistent {
                return Err(CodecError::MalformedKey);
            }
        }
        None => {
            if key.dp().is_none() || key.dq().is_none() {
                return Err(CodecError::MalformedKey);
            }
        }
    }

    Ok(key)
}

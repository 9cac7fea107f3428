// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Qbitel EdgeOS Wrapped-Key Codecs
//!
//! This crate recovers the 16-byte AES-128 image encryption key from the
//! wrapped-key record carried in an encrypted image's metadata:
//!
//! - **RSA-2048 OAEP** (`enc-rsa`): PKCS#1 device key, OAEP with SHA-256
//! - **AES-128 key-wrap** (`enc-kw`): RFC 3394 unwrap under a provisioned KEK
//! - **ECIES-P256** (`enc-ec256`): ECDH + HKDF-SHA256 + HMAC-SHA256 + AES-CTR
//!
//! A product enables exactly one scheme; the test build enables all three.
//! The primitive ciphers come from the RustCrypto crates.
//!
//! # Security Requirements
//!
//! All codecs in this crate:
//! - Return no key material on any failure
//! - Zeroize transient secrets on every exit path
//! - Never log or expose key material

#![no_std]
#![allow(unsafe_code)] // Volatile writes in zeroize_utils
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

#[cfg(not(any(feature = "enc-rsa", feature = "enc-kw", feature = "enc-ec256")))]
compile_error!("Enable at least one wrapped-key scheme: enc-rsa, enc-kw or enc-ec256");

#[cfg(feature = "enc-rsa")]
extern crate alloc;

// Core modules
pub mod error;
pub mod traits;
pub mod zeroize_utils;

// Wrapped-key schemes
#[cfg(feature = "enc-kw")]
pub mod aes_kw;
#[cfg(feature = "enc-rsa")]
pub mod rsa_oaep;
#[cfg(feature = "enc-ec256")]
pub mod ecies;

pub use error::{CodecError, CodecResult};
pub use traits::WrappedKeyCodec;
pub use zeroize_utils::{DerivedKey, SecretBuffer};

#[cfg(feature = "enc-kw")]
pub use aes_kw::AesKeyWrapCodec;
#[cfg(feature = "enc-rsa")]
pub use rsa_oaep::RsaOaepCodec;
#[cfg(feature = "enc-ec256")]
pub use ecies::{EciesCodec, EciesScratch};

use q_common::config::EncScheme;

/// Build-selected wrapped-key scheme
///
/// Constructed once from the provisioned key when the bootloader starts and
/// then used for every image.
pub enum Scheme {
    /// RSA-2048 OAEP
    #[cfg(feature = "enc-rsa")]
    Rsa(RsaOaepCodec),
    /// RFC 3394 AES-128 key-wrap
    #[cfg(feature = "enc-kw")]
    KeyWrap(AesKeyWrapCodec),
    /// ECIES-P256
    #[cfg(feature = "enc-ec256")]
    Ecies(EciesCodec),
}

impl Scheme {
    /// Configuration tag of the active variant
    #[must_use]
    pub const fn kind(&self) -> EncScheme {
        match self {
            #[cfg(feature = "enc-rsa")]
            Self::Rsa(_) => EncScheme::Rsa2048,
            #[cfg(feature = "enc-kw")]
            Self::KeyWrap(_) => EncScheme::Kw128,
            #[cfg(feature = "enc-ec256")]
            Self::Ecies(_) => EncScheme::Ec256,
        }
    }

    fn codec(&self) -> &dyn WrappedKeyCodec {
        match self {
            #[cfg(feature = "enc-rsa")]
            Self::Rsa(c) => c,
            #[cfg(feature = "enc-kw")]
            Self::KeyWrap(c) => c,
            #[cfg(feature = "enc-ec256")]
            Self::Ecies(c) => c,
        }
    }
}

impl WrappedKeyCodec for Scheme {
    fn name(&self) -> &'static str {
        self.codec().name()
    }

    fn tlv_type(&self) -> u16 {
        self.codec().tlv_type()
    }

    fn record_len(&self) -> usize {
        self.codec().record_len()
    }

    fn decode(&self, blob: &[u8]) -> CodecResult<DerivedKey> {
        self.codec().decode(blob)
    }
}

#[cfg(feature = "enc-rsa")]
impl From<RsaOaepCodec> for Scheme {
    fn from(c: RsaOaepCodec) -> Self {
        Self::Rsa(c)
    }
}

#[cfg(feature = "enc-kw")]
impl From<AesKeyWrapCodec> for Scheme {
    fn from(c: AesKeyWrapCodec) -> Self {
        Self::KeyWrap(c)
    }
}

#[cfg(feature = "enc-ec256")]
impl From<EciesCodec> for Scheme {
    fn from(c: EciesCodec) -> Self {
        Self::Ecies(c)
    }
}

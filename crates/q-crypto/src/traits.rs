// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Core codec trait
//!
//! Every wrapped-key scheme turns a fixed-size blob from the image metadata
//! into a 16-byte image key behind the same interface, so the boot code
//! is written once against [`WrappedKeyCodec`].
//!
//! # Contract
//!
//! 1. **All or nothing**: a failed decode yields no key material
//! 2. **Zeroization**: transient secrets are scrubbed on every exit path
//! 3. **Opaque failures**: errors never carry secret-derived data

use crate::error::CodecResult;
use crate::zeroize_utils::DerivedKey;

/// Wrapped-key codec
///
/// Implemented by the RSA-OAEP, AES key-wrap and ECIES-P256 schemes and by
/// the build-selected [`crate::Scheme`].
pub trait WrappedKeyCodec {
    /// Name used in boot log messages
    fn name(&self) -> &'static str;

    /// TLV type carrying this codec's record
    fn tlv_type(&self) -> u16;

    /// Exact size of the wrapped record in bytes
    fn record_len(&self) -> usize;

    /// Recover the image key from a wrapped record
    ///
    /// # Errors
    ///
    /// Returns the scheme-specific [`crate::CodecError`] on any failure.
    fn decode(&self, blob: &[u8]) -> CodecResult<DerivedKey>;
}

// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Secure memory utilities
//!
//! Secret-holding buffers that overwrite their backing bytes when released,
//! plus constant-time helpers used by the codecs.

use core::fmt;
use core::ptr;
use core::sync::atomic::{compiler_fence, Ordering};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use q_common::constants::ENC_KEY_SIZE;

/// Securely zero memory, preventing compiler optimization
///
/// Uses volatile writes followed by a compiler fence so the stores are not
/// elided even when the buffer is about to go out of scope.
#[inline(never)]
pub fn secure_zero(data: &mut [u8]) {
    for byte in data.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `data`.
        unsafe {
            ptr::write_volatile(byte, 0);
        }
    }

    compiler_fence(Ordering::SeqCst);
}

/// Fixed-size buffer for secret bytes, zeroized on drop
///
/// Deliberately not `Clone` or `Copy`: a secret has exactly one owner.
pub struct SecretBuffer<const N: usize> {
    data: [u8; N],
}

impl<const N: usize> SecretBuffer<N> {
    /// Create a new zeroed buffer
    #[must_use]
    pub const fn new() -> Self {
        Self { data: [0u8; N] }
    }

    /// Create from a byte slice
    ///
    /// Returns `None` if the slice length doesn't match N.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() != N {
            return None;
        }
        let mut buf = Self::new();
        buf.data.copy_from_slice(slice);
        Some(buf)
    }

    /// Borrow the contents as an array
    #[must_use]
    pub const fn as_array(&self) -> &[u8; N] {
        &self.data
    }

    /// Get the data as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get the data as a mutable slice
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the buffer size
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Check if buffer is empty (always false for N > 0)
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize> Default for SecretBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Zeroize for SecretBuffer<N> {
    fn zeroize(&mut self) {
        secure_zero(&mut self.data);
    }
}

impl<const N: usize> Drop for SecretBuffer<N> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<const N: usize> ZeroizeOnDrop for SecretBuffer<N> {}

impl<const N: usize> fmt::Debug for SecretBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer<{N}>(..)")
    }
}

/// Decoded 16-byte image encryption key
///
/// Produced by a [`crate::WrappedKeyCodec`] and consumed by slot activation.
/// The bytes are scrubbed when the value is dropped.
#[derive(Default)]
pub struct DerivedKey(SecretBuffer<ENC_KEY_SIZE>);

impl DerivedKey {
    /// Wrap raw key bytes
    #[must_use]
    pub fn new(bytes: [u8; ENC_KEY_SIZE]) -> Self {
        let mut key = Self::default();
        key.0.as_mut_slice().copy_from_slice(&bytes);
        key
    }

    /// Copy a key out of a slice
    ///
    /// Returns `None` if the slice is not exactly 16 bytes.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        SecretBuffer::from_slice(slice).map(Self)
    }

    /// Borrow the key bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ENC_KEY_SIZE] {
        self.0.as_array()
    }

    /// Mutable access for codecs that decode in place
    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        self.0.as_mut_slice()
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Compare two byte slices in constant time
///
/// Slices of different length compare unequal; the length itself is not
/// secret.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && bool::from(a.ct_eq(b))
}

/// Check if all bytes are zero in constant time
#[must_use]
pub fn is_zero(data: &[u8]) -> bool {
    let mut acc: u8 = 0;
    for &byte in data {
        acc |= byte;
    }
    acc == 0
}

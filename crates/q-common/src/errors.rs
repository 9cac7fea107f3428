// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Error types for Qbitel EdgeOS
//!
//! This module defines the unified error type reported by the encrypted
//! image loader to the boot sequencing logic. All errors are no_std
//! compatible and carry no heap-allocated context.

use core::fmt;

/// Result type alias for Qbitel EdgeOS operations
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for Qbitel EdgeOS
///
/// Component crates keep their own detailed error enums and convert into
/// this type at crate boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Cryptographic Errors (0x01xx)
    // =========================================================================
    /// Private key container could not be parsed or is inconsistent
    MalformedKey,
    /// Input blob has the wrong size for the configured scheme
    InvalidLength,
    /// Asymmetric decryption of the wrapped key failed
    DecryptFailed,
    /// Key-wrap integrity register did not match
    IntegrityCheckFailed,
    /// ECIES authentication tag did not match
    TagMismatch,
    /// Ephemeral point is not in uncompressed form
    PointFormatError,
    /// Ephemeral point is not on the curve
    InvalidPublicKey,
    /// Key derivation failed
    KeyDerivationFailed,

    // =========================================================================
    // Storage Errors (0x03xx)
    // =========================================================================
    /// Storage read operation failed
    StorageReadFailed,
    /// Stored data is corrupted
    StorageCorrupted,

    // =========================================================================
    // Boot Errors (0x0Axx)
    // =========================================================================
    /// Image header is malformed
    InvalidImageHeader,
    /// Invalid boot configuration
    InvalidBootConfig,

    // =========================================================================
    // Encrypted Image Errors (0x0Bxx)
    // =========================================================================
    /// No encrypted-key record of the expected type in the image metadata
    RecordNotFound,
    /// Encrypted-key record length differs from the scheme size
    UnexpectedLength,
    /// Image is not flagged as encrypted
    ImageNotEncrypted,
    /// Image index or flash area has no key slot
    UnknownImage,

    // =========================================================================
    // General Errors (0xFFxx)
    // =========================================================================
    /// Buffer is too small for operation
    BufferTooSmall,
    /// Invalid parameter provided
    InvalidParameter,
    /// Invalid state for the operation
    InvalidState,
    /// Internal error (should not occur)
    InternalError,
}

impl Error {
    /// Get the error code for this error
    ///
    /// Error codes are organized by category:
    /// - 0x01xx: Cryptographic errors
    /// - 0x03xx: Storage errors
    /// - 0x0Axx: Boot errors
    /// - 0x0Bxx: Encrypted image errors
    /// - 0xFFxx: General errors
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            // Crypto errors (0x01xx)
            Self::MalformedKey => 0x0101,
            Self::InvalidLength => 0x0102,
            Self::DecryptFailed => 0x0103,
            Self::IntegrityCheckFailed => 0x0104,
            Self::TagMismatch => 0x0105,
            Self::PointFormatError => 0x0106,
            Self::InvalidPublicKey => 0x0107,
            Self::KeyDerivationFailed => 0x0108,

            // Storage errors (0x03xx)
            Self::StorageReadFailed => 0x0301,
            Self::StorageCorrupted => 0x0305,

            // Boot errors (0x0Axx)
            Self::InvalidImageHeader => 0x0A01,
            Self::InvalidBootConfig => 0x0A02,

            // Encrypted image errors (0x0Bxx)
            Self::RecordNotFound => 0x0B01,
            Self::UnexpectedLength => 0x0B02,
            Self::ImageNotEncrypted => 0x0B03,
            Self::UnknownImage => 0x0B04,

            // General errors (0xFFxx)
            Self::BufferTooSmall => 0xFF01,
            Self::InvalidParameter => 0xFF02,
            Self::InvalidState => 0xFF07,
            Self::InternalError => 0xFFFF,
        }
    }

    /// Check if this is a security-critical error
    ///
    /// Security errors mean the image metadata was tampered with or was
    /// produced for a different device key.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedKey
                | Self::DecryptFailed
                | Self::IntegrityCheckFailed
                | Self::TagMismatch
                | Self::PointFormatError
                | Self::InvalidPublicKey
        )
    }

    /// Get a short description of the error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::MalformedKey => "malformed private key",
            Self::InvalidLength => "invalid wrapped key length",
            Self::DecryptFailed => "wrapped key decryption failed",
            Self::IntegrityCheckFailed => "key-wrap integrity check failed",
            Self::TagMismatch => "ECIES tag mismatch",
            Self::PointFormatError => "unsupported point format",
            Self::InvalidPublicKey => "invalid ephemeral public key",
            Self::KeyDerivationFailed => "key derivation failed",
            Self::StorageReadFailed => "storage read failed",
            Self::StorageCorrupted => "storage corrupted",
            Self::InvalidImageHeader => "invalid image header",
            Self::InvalidBootConfig => "invalid boot config",
            Self::RecordNotFound => "encrypted key record not found",
            Self::UnexpectedLength => "unexpected encrypted key record length",
            Self::ImageNotEncrypted => "image not encrypted",
            Self::UnknownImage => "unknown image slot",
            Self::BufferTooSmall => "buffer too small",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidState => "invalid state",
            Self::InternalError => "internal error",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[0x{:04X}] {}", self.code(), self.description())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "[0x{:04X}] {}", self.code(), self.description());
    }
}
